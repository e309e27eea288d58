pub mod context;
pub mod guard;
pub mod middleware;
pub mod password;
pub mod token;

pub use context::AuthContext;
pub use guard::{check_user_update, UpdateDenied};
pub use middleware::{bearer_token, require_admin, require_auth};
pub use password::{PasswordError, PasswordHasher};
pub use token::{Claims, TokenError, TokenService};
