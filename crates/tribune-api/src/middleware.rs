use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use tribune_types::api::Claims;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};

/// Who is making the request. Anonymous requests carry `Viewer(None)`.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<Claims>);

impl Viewer {
    pub fn id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|c| c.sub)
    }

    /// Claims of an authenticated viewer, or 401.
    pub fn require(&self) -> ApiResult<&Claims> {
        self.0.as_ref().ok_or(ApiError::Unauthorized)
    }
}

/// Decode the bearer token, if any, and attach a [`Viewer`] to the request.
///
/// A missing Authorization header means anonymous; a present but invalid
/// token is rejected outright.
pub async fn identify(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let claims = match req.headers().get(header::AUTHORIZATION) {
        None => None,
        Some(value) => match bearer_claims(value.to_str().ok(), &state.jwt_secret) {
            Some(claims) => Some(claims),
            None => return ApiError::Unauthorized.into_response(),
        },
    };

    req.extensions_mut().insert(Viewer(claims));
    next.run(req).await
}

fn bearer_claims(header_value: Option<&str>, secret: &str) -> Option<Claims> {
    let token = header_value?.strip_prefix("Bearer ")?;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::create_token;

    #[test]
    fn bearer_tokens_round_trip_through_claims() {
        let user_id = Uuid::new_v4();
        let token = create_token("secret", user_id, "maria").unwrap();

        let claims = bearer_claims(Some(&format!("Bearer {}", token)), "secret").unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.name, "maria");

        assert!(bearer_claims(Some(&format!("Bearer {}", token)), "other-secret").is_none());
        assert!(bearer_claims(Some(&token), "secret").is_none());
        assert!(bearer_claims(None, "secret").is_none());
    }

    #[test]
    fn anonymous_viewer_must_log_in() {
        let viewer = Viewer(None);
        assert!(viewer.id().is_none());
        assert!(matches!(viewer.require(), Err(ApiError::Unauthorized)));
    }
}
