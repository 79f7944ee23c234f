use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{
    models::ScoreModel,
    repository::ScoreRepository,
    summary::{summarize, RoundSummary, SummaryEntry},
    transform::score_from_taps,
};
use crate::{
    clock::Clock,
    round::{
        models::{RoundModel, RoundPhase},
        repository::RoundRepository,
    },
    shared::AppError,
    user::{ParticipantRules, UserDirectory},
};

/// Outcome of a tap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapOutcome {
    pub taps: u64,
    pub score: u64,
}

/// Registration, tap scoring and end-of-round aggregation
pub struct ScoreService {
    rounds: Arc<dyn RoundRepository>,
    scores: Arc<dyn ScoreRepository>,
    users: Arc<dyn UserDirectory>,
    rules: ParticipantRules,
    clock: Arc<dyn Clock>,
}

impl ScoreService {
    pub fn new(
        rounds: Arc<dyn RoundRepository>,
        scores: Arc<dyn ScoreRepository>,
        users: Arc<dyn UserDirectory>,
        rules: ParticipantRules,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            rounds,
            scores,
            users,
            rules,
            clock,
        }
    }

    async fn load_round(&self, round_id: Uuid) -> Result<RoundModel, AppError> {
        self.rounds
            .get_round(round_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Round not found".to_string()))
    }

    /// Get-or-create the caller's record. Only allowed during cooldown
    #[instrument(skip(self))]
    pub async fn register_participant(
        &self,
        user_id: &str,
        round_id: Uuid,
    ) -> Result<ScoreModel, AppError> {
        let round = self.load_round(round_id).await?;
        let now = self.clock.now();

        let phase = round.phase(now);
        if phase != RoundPhase::Cooldown {
            debug!(round_id = %round_id, user_id = %user_id, phase = %phase, "Registration outside cooldown");
            return Err(AppError::InvalidPhase(
                "Can only join a round during cooldown".to_string(),
            ));
        }

        let record = self.scores.get_or_create(round_id, user_id, now).await?;
        info!(round_id = %round_id, user_id = %user_id, "Participant registered");
        Ok(record)
    }

    /// Adds one tap for the caller, unless their role is the ghost role
    #[instrument(skip(self))]
    pub async fn record_tap(
        &self,
        user_id: &str,
        round_id: Uuid,
        role: &str,
    ) -> Result<TapOutcome, AppError> {
        let round = self.load_round(round_id).await?;

        if round.phase(self.clock.now()) != RoundPhase::Active {
            return Err(AppError::InvalidPhase("Round is not active".to_string()));
        }

        let not_registered = || {
            AppError::NotRegistered(
                "Join the round during cooldown before tapping".to_string(),
            )
        };

        let record = if self.rules.is_ghost_role(role) {
            self.scores.find(round_id, user_id).await?
        } else {
            self.scores.increment_taps(round_id, user_id).await?
        }
        .ok_or_else(not_registered)?;

        let outcome = TapOutcome {
            taps: record.taps,
            score: score_from_taps(record.taps),
        };
        debug!(round_id = %round_id, user_id = %user_id, taps = outcome.taps, "Tap recorded");
        Ok(outcome)
    }

    /// The caller's record for a round, if they registered
    #[instrument(skip(self))]
    pub async fn own_score(
        &self,
        user_id: &str,
        round_id: Uuid,
    ) -> Result<Option<ScoreModel>, AppError> {
        self.scores.find(round_id, user_id).await
    }

    /// Aggregates a finished round. Earlier phases are rejected
    #[instrument(skip(self))]
    pub async fn get_summary(&self, round_id: Uuid) -> Result<RoundSummary, AppError> {
        let round = self.load_round(round_id).await?;

        if round.phase(self.clock.now()) != RoundPhase::Finished {
            return Err(AppError::InvalidPhase(
                "Results are available once the round has finished".to_string(),
            ));
        }

        let records = self.scores.list_for_round(round_id).await?;
        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let username = match self.users.profile(&record.user_id).await? {
                Some(profile) => profile.username,
                None => {
                    warn!(user_id = %record.user_id, "No profile for participant, using id as name");
                    record.user_id.clone()
                }
            };
            entries.push(SummaryEntry { record, username });
        }

        let summary = summarize(round_id, &entries, &self.rules);
        info!(
            round_id = %round_id,
            total_score = summary.total_score,
            participants = summary.participant_count(),
            "Round summary computed"
        );
        Ok(summary)
    }
}
