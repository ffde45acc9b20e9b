pub mod account;
pub mod account_role;
pub mod auth;
pub mod role;

pub use account::Account;
pub use account_role::AccountRole;
pub use auth::Auth;
pub use role::Role;
