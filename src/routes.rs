use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{round, score, shared::AppState, user};

/// Compose all routes. Everything but `/health` sits behind bearer authentication
pub fn build_router(state: AppState) -> Router {
    let authenticated = Router::new()
        .route("/rounds", get(round::list_rounds))
        .route("/round", post(round::create_round))
        .route("/round/:id", get(round::get_round))
        .route("/round/:id/join", post(round::join_round))
        .route("/tap", post(score::tap))
        .layer(middleware::from_fn_with_state(state.clone(), user::jwt_auth));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(authenticated)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
