//! Role Entity
//!
//! An OAuth2 client: a scope plus the client credentials that select it.

use kernel::audit::Audit;
use serde::{Deserialize, Serialize};

use crate::domain::filter::RoleFilter;
use crate::domain::repository::Entity;
use crate::domain::value_object::{EncryptedSecret, RoleId, Scope};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub scope: Scope,
    pub client_id: String,
    pub client_secret: EncryptedSecret,
    pub audit: Audit,
}

impl Role {
    pub fn new(
        scope: Scope,
        client_id: String,
        client_secret: EncryptedSecret,
        created_by: i64,
    ) -> Self {
        Self {
            id: RoleId::unassigned(),
            scope,
            client_id,
            client_secret,
            audit: Audit::created(created_by),
        }
    }

    /// Apply the supplied changes; returns false when nothing was supplied
    pub fn apply(
        &mut self,
        scope: Option<Scope>,
        client_id: Option<String>,
        client_secret: Option<EncryptedSecret>,
        actor: i64,
    ) -> bool {
        let mut changed = false;

        if let Some(scope) = scope {
            self.scope = scope;
            changed = true;
        }
        if let Some(client_id) = client_id {
            self.client_id = client_id;
            changed = true;
        }
        if let Some(secret) = client_secret {
            self.client_secret = secret;
            changed = true;
        }

        if changed {
            self.audit.touch(actor);
        }
        changed
    }
}

impl Entity for Role {
    type Filter = RoleFilter;

    const NAME: &'static str = "Role";
    const SORTABLE_FIELDS: &'static [&'static str] =
        &["id", "scope", "client_id", "created_at", "updated_at"];

    fn id(&self) -> i64 {
        self.id.value()
    }

    fn assign_id(&mut self, id: i64) {
        self.id = RoleId::new(id);
    }

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }
}
