//! Audit block carried by every persisted entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 作成・更新・削除の記録
///
/// `deleted_at` が `None` の間はレコードが有効（live）です。
/// 行為者は生の account id（`0` はシステム／自己登録）で保持します。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_by: i64,
    pub updated_at: DateTime<Utc>,
    pub deleted_by: Option<i64>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Audit {
    /// 新規作成時の監査情報
    pub fn created(actor: i64) -> Self {
        let now = Utc::now();
        Self {
            created_by: actor,
            created_at: now,
            updated_by: actor,
            updated_at: now,
            deleted_by: None,
            deleted_at: None,
        }
    }

    /// 更新者・更新時刻を記録
    pub fn touch(&mut self, actor: i64) {
        self.updated_by = actor;
        self.updated_at = Utc::now();
    }

    /// 論理削除の印を付ける
    pub fn mark_deleted(&mut self, actor: i64) {
        self.deleted_by = Some(actor);
        self.deleted_at = Some(Utc::now());
    }

    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}
