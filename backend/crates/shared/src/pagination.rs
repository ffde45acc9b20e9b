//! Pagination
//!
//! Page requests as they arrive from callers, the derived [`Pagination`]
//! block returned alongside list reads, and `order_by` parsing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 既定ページ番号
pub const DEFAULT_PAGE: i64 = 1;

/// 総ページ数
///
/// `total > 0` のとき `total / limit + 1`、それ以外は 1。
/// `total` が `limit` の倍数のときは末尾に空ページが 1 つ増えますが、
/// 既存クライアントとの互換のためこの式をそのまま維持します。
///
/// ## Examples
/// ```rust
/// use kernel::pagination::total_pages;
/// assert_eq!(total_pages(20, 10), 3);
/// assert_eq!(total_pages(0, 10), 1);
/// ```
pub const fn total_pages(total_elements: i64, limit: i64) -> i64 {
    if total_elements > 0 && limit > 0 {
        total_elements / limit + 1
    } else {
        1
    }
}

/// ページ指定（クエリパラメータ）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub limit: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
}

impl PageRequest {
    /// 未指定（0 以下）の値を既定値で埋める
    ///
    /// オフセット `(page - 1) * limit` が `i64` に収まらない場合は
    /// [`PageOutOfRange`] を返します。
    pub fn normalized(mut self, default_limit: i64) -> Result<Self, PageOutOfRange> {
        if self.page <= 0 {
            self.page = DEFAULT_PAGE;
        }
        if self.limit <= 0 {
            self.limit = default_limit;
        }
        self.order_by = self
            .order_by
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty());

        if (self.page - 1).checked_mul(self.limit).is_none() {
            return Err(PageOutOfRange {
                page: self.page,
                limit: self.limit,
            });
        }
        Ok(self)
    }

    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.limit)
    }

    /// `order_by` を許可リストに照らして解析
    pub fn sort_keys(&self, sortable: &[&str]) -> Result<Vec<SortKey>, OrderByError> {
        match &self.order_by {
            Some(raw) => SortKey::parse_list(raw, sortable),
            None => Ok(Vec::new()),
        }
    }
}

/// 一覧取得に付随するページ情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: i64,
    pub limit: i64,
    pub current_elements: i64,
    pub total_pages: i64,
    pub total_elements: i64,
    pub sort_by: String,
}

impl Pagination {
    pub fn new(request: &PageRequest, current_elements: usize, total_elements: i64) -> Self {
        Self {
            current_page: request.page,
            limit: request.limit,
            current_elements: current_elements as i64,
            total_pages: total_pages(total_elements, request.limit),
            total_elements,
            sort_by: request.order_by.clone().unwrap_or_default(),
        }
    }
}

/// ページ指定がオフセットに変換できない
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Page {page} with limit {limit} is out of range")]
pub struct PageOutOfRange {
    pub page: i64,
    pub limit: i64,
}

// ============================================================================
// Sorting
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderByError {
    #[error("Unknown sort field: {0}")]
    UnknownField(String),

    #[error("Invalid sort direction: {0}")]
    InvalidDirection(String),
}

/// ソートキー（`field` または `field asc|desc`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

impl SortKey {
    /// カンマ区切りの `order_by` を解析
    ///
    /// フィールド名は `sortable` に含まれている必要があります。
    /// SQL に直接埋め込まれるため、ここで必ず検証します。
    pub fn parse_list(raw: &str, sortable: &[&str]) -> Result<Vec<Self>, OrderByError> {
        raw.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| Self::parse(item, sortable))
            .collect()
    }

    fn parse(item: &str, sortable: &[&str]) -> Result<Self, OrderByError> {
        let mut parts = item.split_whitespace();
        let field = parts.next().unwrap_or_default();

        if !sortable.contains(&field) {
            return Err(OrderByError::UnknownField(field.to_string()));
        }

        let descending = match parts.next() {
            None => false,
            Some(dir) if dir.eq_ignore_ascii_case("asc") => false,
            Some(dir) if dir.eq_ignore_ascii_case("desc") => true,
            Some(dir) => return Err(OrderByError::InvalidDirection(dir.to_string())),
        };

        if let Some(extra) = parts.next() {
            return Err(OrderByError::InvalidDirection(extra.to_string()));
        }

        Ok(Self {
            field: field.to_string(),
            descending,
        })
    }

    pub fn direction(&self) -> &'static str {
        if self.descending { "DESC" } else { "ASC" }
    }
}
