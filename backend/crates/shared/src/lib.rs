//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the vocabulary every other crate agrees on:
//! - Error types carrying a stable numeric code and a bilingual message
//! - Typed numeric IDs and the audit block shared by persisted entities
//! - Pagination arithmetic and the cache-control directive
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all domains.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod audit;
pub mod cache_control;
pub mod id;
pub mod pagination;
