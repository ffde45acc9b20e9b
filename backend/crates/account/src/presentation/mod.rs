//! Presentation Layer
//!
//! HTTP handlers, DTOs, response envelope, router, and middleware.

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;

pub use handlers::AccountAppState;
pub use middleware::{assign_request_id, require_bearer};
pub use router::{account_router, account_router_generic};
