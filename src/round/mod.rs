// Public API - what other modules can use
pub use handlers::{create_round, get_round, join_round, list_rounds};
pub use models::{RoundModel, RoundPhase, RoundSettings};
pub use repository::{InMemoryRoundRepository, PostgresRoundRepository, RoundRepository};
pub use service::RoundService;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
