pub mod actions;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use actions::{finish_round, start_round, tap_times};
pub use setup::{TestSetup, TestSetupBuilder};
