use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::models::UserProfile;
use crate::shared::AppError;

/// Resolves user ids to display names for round summaries
///
/// Profiles are written whenever an authenticated request arrives, so every
/// participant with a score record has been seen here at least once.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Insert or refresh the profile for `profile.user_id`
    async fn upsert(&self, profile: &UserProfile) -> Result<(), AppError>;

    async fn profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError>;
}

/// In-memory implementation of UserDirectory
/// Uses RwLock for concurrent access with read optimization
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    profiles: Arc<RwLock<HashMap<String, UserProfile>>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self {
            profiles: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn upsert(&self, profile: &UserProfile) -> Result<(), AppError> {
        {
            let profiles = self.profiles.read().await;
            if profiles.get(&profile.user_id) == Some(profile) {
                return Ok(());
            }
        }

        let mut profiles = self.profiles.write().await;
        profiles.insert(profile.user_id.clone(), profile.clone());

        debug!(
            user_id = %profile.user_id,
            username = %profile.username,
            "Stored user profile"
        );
        Ok(())
    }

    async fn profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        let profiles = self.profiles.read().await;
        Ok(profiles.get(user_id).cloned())
    }
}

/// PostgreSQL implementation backed by the users table
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    #[instrument(skip(self, profile))]
    async fn upsert(&self, profile: &UserProfile) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO users (id, login) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET login = EXCLUDED.login",
        )
        .bind(&profile.user_id)
        .bind(&profile.username)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %profile.user_id, "Failed to upsert user profile");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        let row = sqlx::query("SELECT id, login FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, user_id = %user_id, "Failed to fetch user profile");
                AppError::DatabaseError(e.to_string())
            })?;

        row.map(|row| -> Result<UserProfile, sqlx::Error> {
            Ok(UserProfile {
                user_id: row.try_get("id")?,
                username: row.try_get("login")?,
            })
        })
        .transpose()
        .map_err(|e| AppError::DatabaseError(e.to_string()))
    }
}
