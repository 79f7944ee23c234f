// Library crate for the tap round server
// This file exposes the public API for integration tests

pub mod clock;
pub mod config;
pub mod round;
pub mod routes;
pub mod score;
pub mod shared;
pub mod user;

// Re-export commonly used types for easier access in tests
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AppConfig;
pub use round::{RoundModel, RoundPhase, RoundService, RoundSettings};
pub use score::{score_from_taps, RoundSummary, ScoreService, TapOutcome};
pub use shared::{AppError, AppState};
pub use user::ParticipantRules;
