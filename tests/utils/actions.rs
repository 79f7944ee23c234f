use chrono::Duration;
use tapround::{round::RoundModel, score::TapOutcome};

use super::TestSetup;

/// Moves the clock to the first instant of the active window
pub fn start_round(setup: &TestSetup, round: &RoundModel) {
    setup.clock.set(round.start_at);
}

/// Moves the clock just past the end of the round
pub fn finish_round(setup: &TestSetup, round: &RoundModel) {
    setup.clock.set(round.end_at + Duration::milliseconds(1));
}

/// Taps `times` times sequentially and returns the last outcome
pub async fn tap_times(
    setup: &TestSetup,
    round: &RoundModel,
    user_id: &str,
    role: &str,
    times: usize,
) -> Option<TapOutcome> {
    let mut last = None;
    for _ in 0..times {
        last = Some(
            setup
                .score_service
                .record_tap(user_id, round.id, role)
                .await
                .expect("tap should succeed"),
        );
    }
    last
}
