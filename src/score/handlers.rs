use axum::{extract::State, Extension, Json};
use tracing::{debug, instrument};

use super::types::{TapRequest, TapResponse};
use crate::shared::{AppError, AppState};
use crate::user::Identity;

/// HTTP handler for a single tap
///
/// POST /tap
/// Returns the caller's score after the tap
#[instrument(name = "tap", skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn tap(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<TapRequest>,
) -> Result<Json<TapResponse>, AppError> {
    let outcome = state
        .score_service
        .record_tap(&identity.user_id, request.uuid, &identity.role)
        .await?;

    debug!(round_id = %request.uuid, score = outcome.score, "Tap handled");
    Ok(Json(TapResponse {
        score: outcome.score,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::round::models::RoundSettings;
    use crate::routes::build_router;
    use crate::shared::test_utils::{bearer_for, AppStateBuilder};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::Duration;
    use tower::ServiceExt; // for `oneshot`

    fn player(user_id: &str, role: &str) -> Identity {
        Identity {
            user_id: user_id.to_string(),
            username: user_id.to_string(),
            role: role.to_string(),
        }
    }

    fn tap_request(identity: &Identity, round_id: uuid::Uuid) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/tap")
            .header("content-type", "application/json")
            .header("authorization", bearer_for(identity))
            .body(Body::from(format!(r#"{{"uuid": "{}"}}"#, round_id)))
            .unwrap()
    }

    #[tokio::test]
    async fn test_tap_handler_counts_taps() {
        let builder = AppStateBuilder::new().with_settings(RoundSettings::from_secs(10, 60));
        let clock = builder.clock();
        let state = builder.build();
        let round = state
            .round_service
            .create_round(state.round_settings)
            .await
            .unwrap();
        state
            .score_service
            .register_participant("alice", round.id)
            .await
            .unwrap();
        clock.advance(Duration::seconds(10));

        let app = build_router(state);
        let alice = player("alice", "survivor");

        let mut last = None;
        for _ in 0..11 {
            let response = app.clone().oneshot(tap_request(&alice, round.id)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            last = Some(serde_json::from_slice::<TapResponse>(&body).unwrap());
        }

        assert_eq!(last, Some(TapResponse { score: 20 }));
    }

    #[tokio::test]
    async fn test_tap_handler_unregistered() {
        let builder = AppStateBuilder::new();
        let clock = builder.clock();
        let state = builder.build();
        let round = state
            .round_service
            .create_round(state.round_settings)
            .await
            .unwrap();
        clock.set(round.start_at);

        let response = build_router(state)
            .oneshot(tap_request(&player("bob", "survivor"), round.id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_tap_handler_during_cooldown() {
        let state = AppStateBuilder::new().build();
        let round = state
            .round_service
            .create_round(state.round_settings)
            .await
            .unwrap();

        let response = build_router(state)
            .oneshot(tap_request(&player("bob", "survivor"), round.id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_tap_handler_unknown_round() {
        let state = AppStateBuilder::new().build();

        let response = build_router(state)
            .oneshot(tap_request(&player("bob", "survivor"), uuid::Uuid::new_v4()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tap_handler_requires_token() {
        let state = AppStateBuilder::new().build();

        let request = Request::builder()
            .method("POST")
            .uri("/tap")
            .header("content-type", "application/json")
            .body(Body::from(format!(r#"{{"uuid": "{}"}}"#, uuid::Uuid::new_v4())))
            .unwrap();
        let response = build_router(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
