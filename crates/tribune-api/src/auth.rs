use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use rand_core::OsRng;
use uuid::Uuid;

use tribune_db::{Database, is_unique_violation};
use tribune_notify::dispatcher::Dispatcher;
use tribune_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::{ApiError, ApiResult};
use crate::visits::VisitTracker;
use crate::blocking;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub jwt_secret: String,
    pub dispatcher: Dispatcher,
    pub visits: VisitTracker,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>, jwt_secret: String, dispatcher: Dispatcher) -> AppState {
        Arc::new(Self {
            db,
            jwt_secret,
            dispatcher,
            visits: VisitTracker::new(),
        })
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_registration(&req)?;

    let user_id = Uuid::new_v4();
    let name = req.name.clone();

    blocking(&state, move |state| {
        // Check if name or email is taken
        if state.db.get_user_by_name(&req.name)?.is_some() {
            return Err(ApiError::Conflict("name already taken".into()));
        }
        if state.db.get_user_by_email(&req.email)?.is_some() {
            return Err(ApiError::Conflict("email already registered".into()));
        }

        let password_hash = hash_password(&req.password)?;

        state
            .db
            .create_user(&user_id.to_string(), &req.name, &req.email, &password_hash)
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ApiError::Conflict("name or email already taken".into())
                } else {
                    ApiError::Internal(e)
                }
            })
    })
    .await?;

    let token = create_token(&state.jwt_secret, user_id, &name)?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id, token })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = blocking(&state, move |state| {
        let user = state
            .db
            .get_user_by_email(&req.email)?
            .ok_or(ApiError::Unauthorized)?;

        // Verify password
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|e| anyhow::anyhow!("stored hash for {} is unreadable: {}", user.id, e))?;

        Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .map_err(|_| ApiError::Unauthorized)?;

        Ok(user)
    })
    .await?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| anyhow::anyhow!("corrupt user id '{}': {}", user.id, e))?;

    let token = create_token(&state.jwt_secret, user_id, &user.name)?;

    Ok(Json(LoginResponse {
        user_id,
        name: user.name,
        token,
    }))
}

/// Names end up in profile URLs, so keep them to a URL-safe alphabet.
fn validate_registration(req: &RegisterRequest) -> ApiResult<()> {
    if req.name.len() < 3 || req.name.len() > 32 {
        return Err(ApiError::BadRequest("name must be 3 to 32 characters".into()));
    }
    if !req.name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.') {
        return Err(ApiError::BadRequest("name may only contain letters, digits, '-', '_' and '.'".into()));
    }
    if !req.email.contains('@') || req.email.len() > 254 {
        return Err(ApiError::BadRequest("invalid email".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest("password must be at least 8 characters".into()));
    }
    Ok(())
}

/// Argon2id hash with a fresh OS-random salt.
fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

pub fn create_token(secret: &str, user_id: Uuid, name: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        name: name.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
