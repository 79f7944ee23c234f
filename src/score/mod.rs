// Public API - what other modules can use
pub use handlers::tap;
pub use models::{ScoreKey, ScoreModel};
pub use repository::{InMemoryScoreRepository, PostgresScoreRepository, ScoreRepository};
pub use service::{ScoreService, TapOutcome};
pub use summary::{BestPlayer, RoundSummary};
pub use transform::score_from_taps;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod summary;
pub mod transform;
pub mod types;
