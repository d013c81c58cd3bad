// Authentication module
// JWT bearer authentication, access control and the password reset flow

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use middleware::{AdminUser, CurrentUser};
pub use models::{Role, User};
pub use repository::{PgResetTokenRepository, PgUserRepository, ResetTokenRepository, UserRepository};
pub use service::AuthService;
pub use token::TokenService;
