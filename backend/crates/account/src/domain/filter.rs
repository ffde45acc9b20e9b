//! Read filters
//!
//! Fields are optional and skipped when unset, so two filters built from
//! the same constraints serialize identically.

use kernel::pagination::PageRequest;
use serde::{Deserialize, Serialize};

use super::repository::EntityFilter;
use super::value_object::{AccountId, Email, RoleId};

/// Filter plus page request of a list read
///
/// Serialized whole into the list and pagination cache keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListQuery<F> {
    #[serde(flatten)]
    pub filter: F,
    #[serde(flatten)]
    pub page: PageRequest,
}

impl<F> ListQuery<F> {
    pub fn new(filter: F, page: PageRequest) -> Self {
        Self { filter, page }
    }
}

// ============================================================================
// Account
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl AccountFilter {
    pub fn by_email(email: &Email) -> Self {
        Self {
            email: Some(email.as_str().to_string()),
            ..Self::default()
        }
    }
}

impl EntityFilter for AccountFilter {
    fn by_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    fn is_identity_lookup(&self) -> bool {
        self.id.is_some() && self.email.is_none() && self.name.is_none()
    }
}

// ============================================================================
// Role
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl RoleFilter {
    pub fn by_client_id(client_id: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            ..Self::default()
        }
    }
}

impl EntityFilter for RoleFilter {
    fn by_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    fn is_identity_lookup(&self) -> bool {
        self.id.is_some() && self.scope.is_none() && self.client_id.is_none()
    }
}

// ============================================================================
// AccountRole
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRoleFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<i64>,
}

impl AccountRoleFilter {
    /// Membership of `account` in `role`
    pub fn membership(account: AccountId, role: RoleId) -> Self {
        Self {
            account_id: Some(account.value()),
            role_id: Some(role.value()),
            ..Self::default()
        }
    }
}

impl EntityFilter for AccountRoleFilter {
    fn by_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    fn is_identity_lookup(&self) -> bool {
        self.id.is_some() && self.account_id.is_none() && self.role_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_json_is_canonical() {
        let a = AccountFilter {
            name: Some("x".into()),
            id: Some(1),
            ..AccountFilter::default()
        };
        assert_eq!(serde_json::to_string(&a).unwrap(), r#"{"id":1,"name":"x"}"#);
        assert_eq!(serde_json::to_string(&AccountFilter::default()).unwrap(), "{}");
    }

    #[test]
    fn test_list_query_json_includes_page() {
        let query = ListQuery::new(
            RoleFilter::by_client_id("c1"),
            PageRequest {
                page: 2,
                limit: 10,
                order_by: None,
            },
        );
        assert_eq!(
            serde_json::to_string(&query).unwrap(),
            r#"{"client_id":"c1","page":2,"limit":10}"#
        );
    }

    #[test]
    fn test_identity_lookup() {
        assert!(AccountFilter::by_id(1).is_identity_lookup());
        assert!(!AccountFilter::default().is_identity_lookup());
        assert!(
            !AccountRoleFilter {
                id: Some(1),
                role_id: Some(2),
                ..AccountRoleFilter::default()
            }
            .is_identity_lookup()
        );
    }
}
