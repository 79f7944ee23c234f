use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::models::RoundModel;
use crate::shared::AppError;

/// Trait for round repository operations
#[async_trait]
pub trait RoundRepository: Send + Sync {
    async fn create_round(&self, round: &RoundModel) -> Result<(), AppError>;
    async fn get_round(&self, round_id: Uuid) -> Result<Option<RoundModel>, AppError>;
    async fn list_rounds(&self) -> Result<Vec<RoundModel>, AppError>;

    /// Stores the cached phase label. Timestamps are never touched
    async fn update_status(&self, round_id: Uuid, status: &str) -> Result<(), AppError>;
}

/// In-memory implementation of RoundRepository for development and testing
pub struct InMemoryRoundRepository {
    rounds: Mutex<HashMap<Uuid, RoundModel>>,
}

impl Default for InMemoryRoundRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoundRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            rounds: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RoundRepository for InMemoryRoundRepository {
    #[instrument(skip(self, round))]
    async fn create_round(&self, round: &RoundModel) -> Result<(), AppError> {
        debug!(round_id = %round.id, "Creating round in memory");

        let mut rounds = self.rounds.lock().unwrap_or_else(PoisonError::into_inner);
        if rounds.contains_key(&round.id) {
            warn!(round_id = %round.id, "Round already exists in memory");
            return Err(AppError::DatabaseError("Round already exists".to_string()));
        }
        rounds.insert(round.id, round.clone());

        debug!(round_id = %round.id, "Round created successfully in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_round(&self, round_id: Uuid) -> Result<Option<RoundModel>, AppError> {
        let rounds = self.rounds.lock().unwrap_or_else(PoisonError::into_inner);
        let round = rounds.get(&round_id).cloned();

        if round.is_none() {
            debug!(round_id = %round_id, "Round not found in memory");
        }

        Ok(round)
    }

    #[instrument(skip(self))]
    async fn list_rounds(&self) -> Result<Vec<RoundModel>, AppError> {
        let rounds = self.rounds.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(rounds.values().cloned().collect())
    }

    #[instrument(skip(self))]
    async fn update_status(&self, round_id: Uuid, status: &str) -> Result<(), AppError> {
        let mut rounds = self.rounds.lock().unwrap_or_else(PoisonError::into_inner);
        match rounds.get_mut(&round_id) {
            Some(round) => {
                round.status = status.to_string();
                Ok(())
            }
            None => Err(AppError::NotFound("Round not found".to_string())),
        }
    }
}

/// PostgreSQL implementation of round repository
pub struct PostgresRoundRepository {
    pool: PgPool,
}

impl PostgresRoundRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn round_from_row(row: &PgRow) -> Result<RoundModel, sqlx::Error> {
    Ok(RoundModel {
        id: row.try_get("id")?,
        start_at: row.try_get("start_at")?,
        end_at: row.try_get("end_at")?,
        status: row.try_get("status")?,
    })
}

fn database_error(e: sqlx::Error) -> AppError {
    AppError::DatabaseError(e.to_string())
}

#[async_trait]
impl RoundRepository for PostgresRoundRepository {
    #[instrument(skip(self, round))]
    async fn create_round(&self, round: &RoundModel) -> Result<(), AppError> {
        debug!(round_id = %round.id, "Creating round in database");

        sqlx::query("INSERT INTO rounds (id, start_at, end_at, status) VALUES ($1, $2, $3, $4)")
            .bind(round.id)
            .bind(round.start_at)
            .bind(round.end_at)
            .bind(&round.status)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, round_id = %round.id, "Failed to create round in database");
                database_error(e)
            })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_round(&self, round_id: Uuid) -> Result<Option<RoundModel>, AppError> {
        let row = sqlx::query("SELECT id, start_at, end_at, status FROM rounds WHERE id = $1")
            .bind(round_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, round_id = %round_id, "Failed to fetch round from database");
                database_error(e)
            })?;

        row.as_ref()
            .map(round_from_row)
            .transpose()
            .map_err(database_error)
    }

    #[instrument(skip(self))]
    async fn list_rounds(&self) -> Result<Vec<RoundModel>, AppError> {
        let rows = sqlx::query("SELECT id, start_at, end_at, status FROM rounds")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to list rounds from database");
                database_error(e)
            })?;

        rows.iter()
            .map(round_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(database_error)
    }

    #[instrument(skip(self))]
    async fn update_status(&self, round_id: Uuid, status: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE rounds SET status = $2 WHERE id = $1")
            .bind(round_id)
            .bind(status)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, round_id = %round_id, "Failed to update round status");
                database_error(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Round not found".to_string()));
        }
        Ok(())
    }
}
