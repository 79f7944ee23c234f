use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::models::ScoreModel;
use crate::user::ParticipantRules;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestPlayer {
    pub username: String,
    pub score: u64,
}

/// Results of a finished round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSummary {
    pub round_id: Uuid,
    pub total_score: u64,
    pub best_player: Option<BestPlayer>,
    per_user_score: HashMap<String, u64>,
}

impl RoundSummary {
    /// The participant's own transformed score; exclusion does not hide it from them
    pub fn score_for(&self, user_id: &str) -> Option<u64> {
        self.per_user_score.get(user_id).copied()
    }

    pub fn participant_count(&self) -> usize {
        self.per_user_score.len()
    }
}

/// A ledger record joined with its owner's display name
#[derive(Debug, Clone)]
pub struct SummaryEntry {
    pub record: ScoreModel,
    pub username: String,
}

/// Points a record contributes to the aggregate
fn points_for(entry: &SummaryEntry, rules: &ParticipantRules) -> u64 {
    if rules.is_excluded(&entry.username) {
        0
    } else {
        entry.record.score()
    }
}

/// Aggregates the entries of one round.
///
/// Entries are expected in registration order. On equal points the earliest
/// entry keeps the nomination; nobody is nominated unless the best has points.
pub fn summarize(round_id: Uuid, entries: &[SummaryEntry], rules: &ParticipantRules) -> RoundSummary {
    let mut total_score: u64 = 0;
    let mut best: Option<(&SummaryEntry, u64)> = None;
    let mut per_user_score = HashMap::with_capacity(entries.len());

    for entry in entries {
        let points = points_for(entry, rules);
        total_score = total_score.saturating_add(points);

        match best {
            Some((_, best_points)) if points <= best_points => {}
            _ => best = Some((entry, points)),
        }

        per_user_score.insert(entry.record.user_id.clone(), entry.record.score());
    }

    let best_player = best
        .filter(|(_, points)| *points > 0)
        .map(|(entry, points)| BestPlayer {
            username: entry.username.clone(),
            score: points,
        });

    RoundSummary {
        round_id,
        total_score,
        best_player,
        per_user_score,
    }
}
