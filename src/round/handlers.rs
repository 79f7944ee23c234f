use axum::{
    extract::{Path, State},
    Extension, Json,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    models::RoundPhase,
    types::{JoinRoundResponse, RoundDetailResponse, RoundResponse},
};
use crate::shared::{AppError, AppState};
use crate::user::Identity;

/// HTTP handler for listing all rounds
///
/// GET /rounds
/// Returns rounds with their current phase, newest first
#[instrument(name = "list_rounds", skip(state))]
pub async fn list_rounds(
    State(state): State<AppState>,
) -> Result<Json<Vec<RoundResponse>>, AppError> {
    let rounds = state.round_service.list_rounds().await?;

    Ok(Json(
        rounds
            .iter()
            .map(|(round, phase)| RoundResponse::new(round, *phase))
            .collect(),
    ))
}

/// HTTP handler for creating a new round
///
/// POST /round
/// Admin only; uses the configured cooldown and round durations
#[instrument(name = "create_round", skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn create_round(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<RoundResponse>, AppError> {
    if !state.rules.is_admin(&identity.role) {
        warn!(role = %identity.role, "Non-admin attempted to create a round");
        return Err(AppError::Forbidden(
            "Only admins can create rounds".to_string(),
        ));
    }

    let round = state
        .round_service
        .create_round(state.round_settings)
        .await?;

    Ok(Json(RoundResponse::new(&round, RoundPhase::Cooldown)))
}

/// HTTP handler for the round page
///
/// GET /round/{id}
/// Registers the caller while the round is in cooldown and attaches the
/// results once it has finished
#[instrument(name = "get_round", skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn get_round(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(round_id): Path<Uuid>,
) -> Result<Json<RoundDetailResponse>, AppError> {
    let (round, phase) = state.round_service.get_round_with_phase(round_id).await?;
    let scores = &state.score_service;
    let user_id = identity.user_id.as_str();

    let mut detail = RoundDetailResponse {
        round: RoundResponse::new(&round, phase),
        my_score: None,
        total_score: None,
        best_player: None,
    };

    match phase {
        RoundPhase::Cooldown => {
            let record = match scores.register_participant(user_id, round_id).await {
                Ok(record) => Some(record),
                // The round started between the phase read and the registration
                Err(AppError::InvalidPhase(_)) => scores.own_score(user_id, round_id).await?,
                Err(e) => return Err(e),
            };
            detail.my_score = record.map(|r| r.score());
        }
        RoundPhase::Active => {
            detail.my_score = scores.own_score(user_id, round_id).await?.map(|r| r.score());
        }
        RoundPhase::Finished => {
            let summary = scores.get_summary(round_id).await?;
            detail.my_score = Some(summary.score_for(user_id).unwrap_or_default());
            detail.total_score = Some(summary.total_score);
            detail.best_player = summary.best_player;
        }
    }

    Ok(Json(detail))
}

/// HTTP handler for an explicit join
///
/// POST /round/{id}/join
#[instrument(name = "join_round", skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn join_round(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(round_id): Path<Uuid>,
) -> Result<Json<JoinRoundResponse>, AppError> {
    let record = state
        .score_service
        .register_participant(&identity.user_id, round_id)
        .await?;

    info!(round_id = %round_id, "Joined round");
    Ok(Json(JoinRoundResponse {
        uuid: record.round_id,
        taps: record.taps,
    }))
}
