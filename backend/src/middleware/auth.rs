//! Authentication middleware
//!
//! Decodes HS256 bearer tokens into the `Actor` every service call is made on
//! behalf of. Tokens are minted by the external auth service; `issue_token`
//! exists for tooling and tests.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::{Actor, Role};
use uuid::Uuid;

use crate::error::AppError;
use crate::AppState;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: Role,
    exp: i64,
    iat: i64,
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => {
            return AppError::Unauthorized("Missing or invalid Authorization header".to_string())
                .into_response();
        }
    };

    let actor = match decode_actor(token, &state.config.jwt.secret) {
        Ok(actor) => actor,
        Err(err) => return err.into_response(),
    };

    tracing::debug!(actor_id = %actor.id, role = %actor.role, "authenticated request");
    request.extensions_mut().insert(actor);

    next.run(request).await
}

/// Decode and validate a bearer token
fn decode_actor(token: &str, secret: &str) -> Result<Actor, AppError> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

    let id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user ID in token".to_string()))?;

    Ok(Actor::new(id, claims.role))
}

/// Sign a token for `actor` valid for `ttl_seconds`
pub fn issue_token(actor: &Actor, secret: &str, ttl_seconds: i64) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: actor.id.to_string(),
        role: actor.role,
        exp: now + ttl_seconds,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalError(e.into()))
}

/// Extractor for the authenticated actor
#[derive(Clone, Copy, Debug)]
pub struct CurrentActor(pub Actor);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .copied()
            .map(CurrentActor)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let actor = Actor::new(Uuid::new_v4(), Role::Storeman);
        let token = issue_token(&actor, "secret", 60).unwrap();
        assert_eq!(decode_actor(&token, "secret").unwrap(), actor);
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let actor = Actor::new(Uuid::new_v4(), Role::Accountant);
        let token = issue_token(&actor, "secret", 60).unwrap();
        assert!(matches!(
            decode_actor(&token, "other"),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_is_unauthorized() {
        let actor = Actor::new(Uuid::new_v4(), Role::Moderator);
        let token = issue_token(&actor, "secret", -3600).unwrap();
        assert!(decode_actor(&token, "secret").is_err());
    }
}
