use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::models::{ScoreKey, ScoreModel};
use crate::shared::AppError;

/// Attempts a contended Postgres increment gets before surfacing `Contention`
pub const MAX_TAP_ATTEMPTS: u32 = 3;

/// Trait for score ledger storage
#[async_trait]
pub trait ScoreRepository: Send + Sync {
    /// Returns the record for (round, user), creating it with zero taps if absent
    async fn get_or_create(
        &self,
        round_id: Uuid,
        user_id: &str,
        registered_at: DateTime<Utc>,
    ) -> Result<ScoreModel, AppError>;

    async fn find(&self, round_id: Uuid, user_id: &str) -> Result<Option<ScoreModel>, AppError>;

    /// Atomically adds one tap under an exclusive lock on this record only.
    /// Returns None when no record exists
    async fn increment_taps(
        &self,
        round_id: Uuid,
        user_id: &str,
    ) -> Result<Option<ScoreModel>, AppError>;

    /// All records of a round in registration order (created_at, then user_id)
    async fn list_for_round(&self, round_id: Uuid) -> Result<Vec<ScoreModel>, AppError>;
}

type ScoreCell = Arc<Mutex<ScoreModel>>;

/// In-memory ledger: an arena of independently lockable records.
///
/// The map lock is only held to find or insert a cell; increments hold the
/// cell's own mutex, so taps on different keys never wait on each other.
#[derive(Debug, Default)]
pub struct InMemoryScoreRepository {
    records: RwLock<HashMap<ScoreKey, ScoreCell>>,
}

impl InMemoryScoreRepository {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    async fn cell(&self, key: &ScoreKey) -> Option<ScoreCell> {
        self.records.read().await.get(key).cloned()
    }
}

#[async_trait]
impl ScoreRepository for InMemoryScoreRepository {
    #[instrument(skip(self))]
    async fn get_or_create(
        &self,
        round_id: Uuid,
        user_id: &str,
        registered_at: DateTime<Utc>,
    ) -> Result<ScoreModel, AppError> {
        let key = ScoreKey::new(round_id, user_id);
        if let Some(cell) = self.cell(&key).await {
            return Ok(cell.lock().await.clone());
        }

        let mut created = false;
        let cell = {
            let mut records = self.records.write().await;
            Arc::clone(records.entry(key).or_insert_with(|| {
                created = true;
                Arc::new(Mutex::new(ScoreModel::new(
                    round_id,
                    user_id.to_string(),
                    registered_at,
                )))
            }))
        };

        if created {
            debug!(round_id = %round_id, user_id = %user_id, "Created score record in memory");
        }

        let record = cell.lock().await.clone();
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn find(&self, round_id: Uuid, user_id: &str) -> Result<Option<ScoreModel>, AppError> {
        match self.cell(&ScoreKey::new(round_id, user_id)).await {
            Some(cell) => Ok(Some(cell.lock().await.clone())),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn increment_taps(
        &self,
        round_id: Uuid,
        user_id: &str,
    ) -> Result<Option<ScoreModel>, AppError> {
        let Some(cell) = self.cell(&ScoreKey::new(round_id, user_id)).await else {
            return Ok(None);
        };

        let mut record = cell.lock().await;
        record.taps = record.taps.checked_add(1).ok_or(AppError::Internal)?;
        Ok(Some(record.clone()))
    }

    #[instrument(skip(self))]
    async fn list_for_round(&self, round_id: Uuid) -> Result<Vec<ScoreModel>, AppError> {
        let cells: Vec<ScoreCell> = {
            let records = self.records.read().await;
            records
                .iter()
                .filter(|(key, _)| key.round_id == round_id)
                .map(|(_, cell)| Arc::clone(cell))
                .collect()
        };

        let mut snapshot = Vec::with_capacity(cells.len());
        for cell in cells {
            snapshot.push(cell.lock().await.clone());
        }
        snapshot.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });

        Ok(snapshot)
    }
}

/// PostgreSQL ledger using row-level locks on the scores table
pub struct PostgresScoreRepository {
    pool: PgPool,
}

impl PostgresScoreRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One locked read-increment-write transaction
    async fn try_increment(
        &self,
        round_id: Uuid,
        user_id: &str,
    ) -> Result<Option<ScoreModel>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query(
            "SELECT taps FROM scores WHERE round_id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(round_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if locked.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let row = sqlx::query(
            "UPDATE scores SET taps = taps + 1 WHERE round_id = $1 AND user_id = $2 \
             RETURNING round_id, user_id, taps, created_at",
        )
        .bind(round_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        score_from_row(&row).map(Some)
    }
}

fn score_from_row(row: &PgRow) -> Result<ScoreModel, sqlx::Error> {
    let taps: i64 = row.try_get("taps")?;
    Ok(ScoreModel {
        round_id: row.try_get("round_id")?,
        user_id: row.try_get("user_id")?,
        taps: u64::try_from(taps).unwrap_or_default(),
        created_at: row.try_get("created_at")?,
    })
}

/// Serialization failure or deadlock: safe to run the transaction again
fn is_contention(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "40001" || code == "40P01")
        .unwrap_or(false)
}

fn database_error(e: sqlx::Error) -> AppError {
    AppError::DatabaseError(e.to_string())
}

#[async_trait]
impl ScoreRepository for PostgresScoreRepository {
    #[instrument(skip(self))]
    async fn get_or_create(
        &self,
        round_id: Uuid,
        user_id: &str,
        registered_at: DateTime<Utc>,
    ) -> Result<ScoreModel, AppError> {
        let inserted = sqlx::query(
            "INSERT INTO scores (round_id, user_id, taps, created_at) VALUES ($1, $2, 0, $3) \
             ON CONFLICT (round_id, user_id) DO NOTHING",
        )
        .bind(round_id)
        .bind(user_id)
        .bind(registered_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, round_id = %round_id, user_id = %user_id, "Failed to register score record");
            database_error(e)
        })?;

        if inserted.rows_affected() > 0 {
            debug!(round_id = %round_id, user_id = %user_id, "Created score record in database");
        }

        self.find(round_id, user_id)
            .await?
            .ok_or_else(|| AppError::DatabaseError("Score record vanished after insert".to_string()))
    }

    #[instrument(skip(self))]
    async fn find(&self, round_id: Uuid, user_id: &str) -> Result<Option<ScoreModel>, AppError> {
        let row = sqlx::query(
            "SELECT round_id, user_id, taps, created_at FROM scores \
             WHERE round_id = $1 AND user_id = $2",
        )
        .bind(round_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, round_id = %round_id, "Failed to fetch score record");
            database_error(e)
        })?;

        row.as_ref()
            .map(score_from_row)
            .transpose()
            .map_err(database_error)
    }

    #[instrument(skip(self))]
    async fn increment_taps(
        &self,
        round_id: Uuid,
        user_id: &str,
    ) -> Result<Option<ScoreModel>, AppError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_increment(round_id, user_id).await {
                Ok(record) => return Ok(record),
                Err(e) if is_contention(&e) && attempt < MAX_TAP_ATTEMPTS => {
                    info!(attempt, round_id = %round_id, user_id = %user_id, "Tap increment contended, retrying");
                }
                Err(e) if is_contention(&e) => {
                    warn!(error = %e, round_id = %round_id, user_id = %user_id, "Tap increment still contended, giving up");
                    return Err(AppError::Contention(
                        "Score record is busy, try again".to_string(),
                    ));
                }
                Err(e) => {
                    warn!(error = %e, round_id = %round_id, user_id = %user_id, "Failed to increment taps");
                    return Err(database_error(e));
                }
            }
        }
    }

    #[instrument(skip(self))]
    async fn list_for_round(&self, round_id: Uuid) -> Result<Vec<ScoreModel>, AppError> {
        let rows = sqlx::query(
            "SELECT round_id, user_id, taps, created_at FROM scores \
             WHERE round_id = $1 ORDER BY created_at, user_id",
        )
        .bind(round_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, round_id = %round_id, "Failed to list score records");
            database_error(e)
        })?;

        rows.iter()
            .map(score_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(database_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap() + Duration::seconds(secs)
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let repo = InMemoryScoreRepository::new();
        let round_id = Uuid::new_v4();

        let first = repo.get_or_create(round_id, "alice", at(0)).await.unwrap();
        repo.increment_taps(round_id, "alice").await.unwrap();
        let second = repo.get_or_create(round_id, "alice", at(5)).await.unwrap();

        assert_eq!(first.taps, 0);
        assert_eq!(second.taps, 1);
        assert_eq!(second.created_at, first.created_at);
    }

    #[tokio::test]
    async fn test_increment_requires_record() {
        let repo = InMemoryScoreRepository::new();

        let result = repo.increment_taps(Uuid::new_v4(), "ghost").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_increment_counts_taps() {
        let repo = InMemoryScoreRepository::new();
        let round_id = Uuid::new_v4();
        repo.get_or_create(round_id, "alice", at(0)).await.unwrap();

        for _ in 0..11 {
            repo.increment_taps(round_id, "alice").await.unwrap();
        }

        let record = repo.find(round_id, "alice").await.unwrap().unwrap();
        assert_eq!(record.taps, 11);
        assert_eq!(record.score(), 20);
    }

    #[tokio::test]
    async fn test_records_are_scoped_per_round() {
        let repo = InMemoryScoreRepository::new();
        let round_a = Uuid::new_v4();
        let round_b = Uuid::new_v4();
        repo.get_or_create(round_a, "alice", at(0)).await.unwrap();
        repo.get_or_create(round_b, "alice", at(0)).await.unwrap();

        repo.increment_taps(round_a, "alice").await.unwrap();

        assert_eq!(repo.find(round_a, "alice").await.unwrap().unwrap().taps, 1);
        assert_eq!(repo.find(round_b, "alice").await.unwrap().unwrap().taps, 0);
        assert_eq!(repo.list_for_round(round_a).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_for_round_in_registration_order() {
        let repo = InMemoryScoreRepository::new();
        let round_id = Uuid::new_v4();
        repo.get_or_create(round_id, "carol", at(0)).await.unwrap();
        repo.get_or_create(round_id, "bob", at(1)).await.unwrap();
        repo.get_or_create(round_id, "alice", at(1)).await.unwrap();

        let users: Vec<String> = repo
            .list_for_round(round_id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.user_id)
            .collect();
        assert_eq!(users, vec!["carol", "alice", "bob"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_are_not_lost() {
        let repo = Arc::new(InMemoryScoreRepository::new());
        let round_id = Uuid::new_v4();
        repo.get_or_create(round_id, "alice", at(0)).await.unwrap();

        let handles: Vec<_> = (0..200)
            .map(|_| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move { repo.increment_taps(round_id, "alice").await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(repo.find(round_id, "alice").await.unwrap().unwrap().taps, 200);
    }
}
