use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use crate::shared::{AppError, AppState};

/// Bearer authentication middleware - validates the token and adds the caller `Identity` to the request.
/// Usage: .layer(middleware::from_fn_with_state(app_state.clone(), user::jwt_auth))
/// Handlers can then extract Extension(identity): Extension<Identity>.
#[instrument(skip(state, req, next))]
pub async fn jwt_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| {
            warn!("Missing Authorization header in request");
            AppError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        warn!("Invalid Authorization header format (expected Bearer token)");
        AppError::Unauthorized("Invalid authorization header format".to_string())
    })?;

    let identity = match state.token_config.validate_token(token) {
        Ok(identity) => identity,
        Err(e) => {
            warn!("JWT authentication failed: {}", e);
            return Err(e);
        }
    };

    // Summaries resolve display names through the directory
    state.user_directory.upsert(&identity.profile()).await?;

    debug!(
        user_id = %identity.user_id,
        role = %identity.role,
        "Authentication successful"
    );

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
