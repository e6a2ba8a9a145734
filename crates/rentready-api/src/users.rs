use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use rentready_types::api::{Claims, SetRoleRequest, UpdateProfileRequest, UserResponse};

use crate::auth::{AppState, hash_password, to_user_response};
use crate::error::{ApiError, ApiResult};
use crate::middleware::require_admin;

/// The caller's own record, read fresh from the store.
pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<UserResponse>> {
    let row = state
        .db
        .get_user_by_username(&claims.sub)?
        .ok_or_else(|| ApiError::not_found("user"))?;
    Ok(Json(to_user_response(&row)?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<UserResponse>> {
    if let Some(email) = &req.email {
        if !email.contains('@') {
            return Err(ApiError::Validation("email is not valid".into()));
        }
        if let Some(existing) = state.db.get_user_by_email(email)? {
            if existing.username != claims.sub {
                return Err(ApiError::Conflict(
                    "an account with this email already exists".into(),
                ));
            }
        }
    }
    if let Some(password) = &req.password {
        if password.len() < 8 {
            return Err(ApiError::Validation(
                "password must be at least 8 characters".into(),
            ));
        }
    }

    let password_hash = match &req.password {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let updated = state.db.update_user_profile(
        &claims.sub,
        req.email.as_deref(),
        password_hash.as_deref(),
    )?;
    if !updated {
        return Err(ApiError::not_found("user"));
    }

    let row = state
        .db
        .get_user_by_username(&claims.sub)?
        .ok_or_else(|| ApiError::not_found("user"))?;
    Ok(Json(to_user_response(&row)?))
}

// -- Admin user management --

pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    require_admin(&claims)?;

    let rows = state.db.list_users()?;
    rows.iter().map(to_user_response).collect::<ApiResult<Vec<_>>>().map(Json)
}

pub async fn set_role(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(username): Path<String>,
    Json(req): Json<SetRoleRequest>,
) -> ApiResult<Json<UserResponse>> {
    require_admin(&claims)?;

    if !state.db.set_user_mode(&username, req.mode.as_str())? {
        return Err(ApiError::not_found("user"));
    }

    let row = state
        .db
        .get_user_by_username(&username)?
        .ok_or_else(|| ApiError::not_found("user"))?;
    Ok(Json(to_user_response(&row)?))
}

/// Hard delete. The user's messages, saved rows, bookings and reviews go
/// with them; a user who still owns listings must have those removed first.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse + std::fmt::Debug> {
    require_admin(&claims)?;

    if username == claims.sub {
        return Err(ApiError::Validation("cannot delete your own account".into()));
    }
    if state.db.get_user_by_username(&username)?.is_none() {
        return Err(ApiError::not_found("user"));
    }
    if !state.db.list_listings_by_host(&username)?.is_empty() {
        return Err(ApiError::Conflict(
            "user still owns listings; delete them first".into(),
        ));
    }

    state.db.delete_user(&username)?;
    Ok(StatusCode::NO_CONTENT)
}
