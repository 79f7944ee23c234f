use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{
    models::{RoundModel, RoundPhase, RoundSettings},
    repository::RoundRepository,
};
use crate::{clock::Clock, shared::AppError};

/// Creates rounds and answers lifecycle questions about them
pub struct RoundService {
    repository: Arc<dyn RoundRepository>,
    clock: Arc<dyn Clock>,
}

impl RoundService {
    pub fn new(repository: Arc<dyn RoundRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Creates a round whose cooldown starts now
    #[instrument(skip(self))]
    pub async fn create_round(&self, settings: RoundSettings) -> Result<RoundModel, AppError> {
        let round = RoundModel::new(settings, self.clock.now())?;
        self.repository.create_round(&round).await?;

        info!(
            round_id = %round.id,
            start_at = %round.start_at,
            end_at = %round.end_at,
            "Round created successfully"
        );

        Ok(round)
    }

    #[instrument(skip(self))]
    pub async fn get_round(&self, round_id: Uuid) -> Result<RoundModel, AppError> {
        let (round, _) = self.get_round_with_phase(round_id).await?;
        Ok(round)
    }

    /// Loads a round together with its phase at a single clock reading
    #[instrument(skip(self))]
    pub async fn get_round_with_phase(
        &self,
        round_id: Uuid,
    ) -> Result<(RoundModel, RoundPhase), AppError> {
        let mut round = self
            .repository
            .get_round(round_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Round not found".to_string()))?;

        let now = self.clock.now();
        self.refresh_cached_status(&mut round, now).await;
        let phase = round.phase(now);

        debug!(round_id = %round_id, phase = %phase, "Resolved round phase");
        Ok((round, phase))
    }

    #[instrument(skip(self))]
    pub async fn phase_of(&self, round_id: Uuid) -> Result<RoundPhase, AppError> {
        let (_, phase) = self.get_round_with_phase(round_id).await?;
        Ok(phase)
    }

    /// Lists all rounds, most recently starting first
    #[instrument(skip(self))]
    pub async fn list_rounds(&self) -> Result<Vec<(RoundModel, RoundPhase)>, AppError> {
        let mut rounds = self.repository.list_rounds().await?;
        rounds.sort_by(|a, b| b.start_at.cmp(&a.start_at).then(a.id.cmp(&b.id)));

        let now = self.clock.now();
        let mut listed = Vec::with_capacity(rounds.len());
        for mut round in rounds {
            self.refresh_cached_status(&mut round, now).await;
            let phase = round.phase(now);
            listed.push((round, phase));
        }

        debug!(round_count = listed.len(), "Rounds listed");
        Ok(listed)
    }

    /// Writes the label back when it drifted. Failure only costs a stale label
    async fn refresh_cached_status(&self, round: &mut RoundModel, now: DateTime<Utc>) {
        if !round.refresh_status(now) {
            return;
        }
        if let Err(e) = self.repository.update_status(round.id, &round.status).await {
            warn!(round_id = %round.id, error = %e, "Failed to refresh cached round status");
        }
    }
}
