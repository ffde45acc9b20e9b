//! Auth Entity
//!
//! An issued access token. Returned once, never persisted.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Auth {
    pub access_token: String,
    /// Always `Bearer`
    pub token_type: String,
    pub exp: DateTime<Utc>,
    pub scope: String,
}
