// Public API - what other modules can use
pub use directory::{InMemoryUserDirectory, PostgresUserDirectory, UserDirectory};
pub use middleware::jwt_auth;
pub use models::{Identity, ParticipantRules, UserProfile};
pub use token::{IdentityClaims, TokenConfig};

// Internal modules
mod directory;
mod middleware;
pub mod models;
mod token;
