use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::models::Identity;
use crate::shared::AppError;

/// Claims carried by tokens from the identity provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdentityClaims {
    pub sub: String, // user id
    pub username: String,
    pub role: String,
    pub exp: usize, // Expiration timestamp (standard JWT claim)
}

impl From<IdentityClaims> for Identity {
    fn from(claims: IdentityClaims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
        }
    }
}

/// Validates HS256 bearer tokens. Issuing them is the identity provider's job
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
}

impl TokenConfig {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    /// Validates a JWT token and returns the caller identity if valid
    #[instrument(skip(self, token))]
    pub fn validate_token(&self, token: &str) -> Result<Identity, AppError> {
        decode::<IdentityClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| {
            debug!(
                user_id = %data.claims.sub,
                role = %data.claims.role,
                exp = data.claims.exp,
                "JWT token decoded successfully"
            );
            data.claims.into()
        })
        .map_err(|e| {
            debug!(error = %e, "Failed to decode JWT token");
            AppError::JwtError(e.to_string())
        })
    }

    #[cfg(test)]
    pub fn create_token(&self, identity: &Identity) -> Result<String, AppError> {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let claims = IdentityClaims {
            sub: identity.user_id.clone(),
            username: identity.username.clone(),
            role: identity.role.clone(),
            exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| AppError::JwtError(e.to_string()))
    }
}
