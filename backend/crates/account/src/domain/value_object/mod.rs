pub mod actor;
pub mod email;
pub mod ids;
pub mod password;
pub mod scope;
pub mod secret;

pub use actor::Actor;
pub use email::Email;
pub use ids::{AccountId, AccountRoleId, RoleId};
pub use password::{PasswordHash, RawPassword};
pub use scope::Scope;
pub use secret::EncryptedSecret;
