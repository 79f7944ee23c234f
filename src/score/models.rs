use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::transform::score_from_taps;

/// Ledger key: one record per participant per round
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScoreKey {
    pub round_id: Uuid,
    pub user_id: String,
}

impl ScoreKey {
    pub fn new(round_id: Uuid, user_id: &str) -> Self {
        Self {
            round_id,
            user_id: user_id.to_string(),
        }
    }
}

/// Database model for scores table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreModel {
    pub round_id: Uuid,
    pub user_id: String,
    pub taps: u64,                 // Only ever grows
    pub created_at: DateTime<Utc>, // Registration instant, used for summary ordering
}

impl ScoreModel {
    pub fn new(round_id: Uuid, user_id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            round_id,
            user_id,
            taps: 0,
            created_at,
        }
    }

    pub fn key(&self) -> ScoreKey {
        ScoreKey::new(self.round_id, &self.user_id)
    }

    pub fn score(&self) -> u64 {
        score_from_taps(self.taps)
    }
}
