use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::{RoundModel, RoundPhase};
use crate::score::BestPlayer;

/// Round information as shown in listings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundResponse {
    pub uuid: Uuid,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub status: RoundPhase,
}

impl RoundResponse {
    pub fn new(round: &RoundModel, phase: RoundPhase) -> Self {
        Self {
            uuid: round.id,
            start_datetime: round.start_at,
            end_datetime: round.end_at,
            status: phase,
        }
    }
}

/// Round page payload. Totals only appear once the round has finished
#[derive(Debug, Serialize, Deserialize)]
pub struct RoundDetailResponse {
    #[serde(flatten)]
    pub round: RoundResponse,
    pub my_score: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_score: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_player: Option<BestPlayer>,
}

/// Response after an explicit join
#[derive(Debug, Serialize, Deserialize)]
pub struct JoinRoundResponse {
    pub uuid: Uuid,
    pub taps: u64,
}
