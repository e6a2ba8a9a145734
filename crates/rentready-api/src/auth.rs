use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use thiserror::Error;

use rentready_db::Database;
use rentready_db::models::UserRow;
use rentready_types::api::{
    Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UserResponse,
};
use rentready_types::models::UserRole;

use crate::error::{ApiError, ApiResult};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

const TOKEN_TTL_DAYS: i64 = 7;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse + std::fmt::Debug> {
    // Validate input
    if req.username.len() < 3 || req.username.len() > 32 {
        return Err(ApiError::Validation(
            "username must be 3-32 characters".into(),
        ));
    }
    if !req.email.contains('@') {
        return Err(ApiError::Validation("email is not valid".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }

    // Accounts self-register as guest or host; admin is assigned, never chosen
    let mode = req.mode.unwrap_or(UserRole::Guest);
    if mode == UserRole::Admin {
        return Err(ApiError::Validation(
            "admin accounts cannot be self-registered".into(),
        ));
    }

    if state.db.get_user_by_username(&req.username)?.is_some() {
        return Err(ApiError::Conflict("username is taken".into()));
    }
    if state.db.get_user_by_email(&req.email)?.is_some() {
        return Err(ApiError::Conflict(
            "an account with this email already exists".into(),
        ));
    }

    let password_hash = hash_password(&req.password)?;
    state
        .db
        .create_user(&req.username, &req.email, &password_hash, mode.as_str())?;

    let user = UserResponse {
        username: req.username,
        email: req.email,
        mode,
    };
    let token = create_token(&state.jwt_secret, &user)
        .map_err(|e| ApiError::Database(e.context("token issuance")))?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { user, token })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let row = authenticate(&state.db, &req.email, &req.password).map_err(|err| match err {
        AuthError::UnknownEmail => ApiError::Unauthorized("no account with this email".into()),
        AuthError::WrongPassword => ApiError::Unauthorized("invalid credentials".into()),
        AuthError::Database(e) => ApiError::Database(e),
    })?;

    let user = to_user_response(&row)?;
    let token = create_token(&state.jwt_secret, &user)
        .map_err(|e| ApiError::Database(e.context("token issuance")))?;

    Ok(Json(LoginResponse { user, token }))
}

/// Credential check against the user table. Unknown email and password
/// mismatch are distinct variants; the login handler collapses both to 401
/// so the API does not reveal which emails exist.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unknown email")]
    UnknownEmail,
    #[error("wrong password")]
    WrongPassword,
    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

pub fn authenticate(db: &Database, email: &str, password: &str) -> Result<UserRow, AuthError> {
    let user = db.get_user_by_email(email)?.ok_or(AuthError::UnknownEmail)?;

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| anyhow::anyhow!("stored hash unreadable for {}: {}", user.username, e))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::WrongPassword)?;

    Ok(user)
}

/// Hash a password with Argon2id and a fresh salt.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Database(anyhow::anyhow!("password hashing failed: {}", e)))?;
    Ok(hash.to_string())
}

pub fn create_token(secret: &str, user: &UserResponse) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user.username.clone(),
        email: user.email.clone(),
        mode: user.mode,
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Strip a user row down to its wire shape — the password hash never leaves
/// this module.
pub(crate) fn to_user_response(row: &UserRow) -> ApiResult<UserResponse> {
    let mode: UserRole = row
        .mode
        .parse()
        .map_err(|e| ApiError::Database(anyhow::anyhow!("corrupt mode column: {}", e)))?;
    Ok(UserResponse {
        username: row.username.clone(),
        email: row.email.clone(),
        mode,
    })
}
