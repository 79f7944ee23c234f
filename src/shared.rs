use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::clock::Clock;
use crate::config::AppConfig;
use crate::round::{models::RoundSettings, repository::RoundRepository, service::RoundService};
use crate::score::{repository::ScoreRepository, service::ScoreService};
use crate::user::{ParticipantRules, TokenConfig, UserDirectory};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub round_service: Arc<RoundService>,
    pub score_service: Arc<ScoreService>,
    pub user_directory: Arc<dyn UserDirectory>,
    pub token_config: TokenConfig,
    pub rules: ParticipantRules,
    pub round_settings: RoundSettings,
}

impl AppState {
    /// Wires the services on top of the given storage and clock
    pub fn new(
        round_repository: Arc<dyn RoundRepository>,
        score_repository: Arc<dyn ScoreRepository>,
        user_directory: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
        config: &AppConfig,
    ) -> Self {
        let round_service = Arc::new(RoundService::new(
            Arc::clone(&round_repository),
            Arc::clone(&clock),
        ));
        let score_service = Arc::new(ScoreService::new(
            round_repository,
            score_repository,
            Arc::clone(&user_directory),
            config.rules.clone(),
            clock,
        ));

        Self {
            round_service,
            score_service,
            user_directory,
            token_config: TokenConfig::new(config.jwt_secret.clone()),
            rules: config.rules.clone(),
            round_settings: config.round_settings,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid phase: {0}")]
    InvalidPhase(String),

    #[error("Not registered: {0}")]
    NotRegistered(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Raised once the bounded retries on a contended increment are exhausted
    #[error("Contention: {0}")]
    Contention(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidPhase(msg)
            | AppError::NotRegistered(msg)
            | AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Contention(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::JwtError(msg) | AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, msg)
            }
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
