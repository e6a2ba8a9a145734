use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::warn;

use rentready_db::models::MessageRow;
use rentready_types::api::{Claims, MessageResponse, SendMessageRequest};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};

pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<impl IntoResponse + std::fmt::Debug> {
    if req.text.trim().is_empty() {
        return Err(ApiError::Validation("message text is empty".into()));
    }
    if req.receiver_id == claims.sub {
        return Err(ApiError::Validation("cannot message yourself".into()));
    }
    if state.db.get_user_by_username(&req.receiver_id)?.is_none() {
        return Err(ApiError::not_found("receiver"));
    }

    let row = state.db.insert_message(&req.text, &claims.sub, &req.receiver_id)?;
    Ok((StatusCode::CREATED, Json(to_response(row))))
}

/// Both sides of the conversation with one other user, oldest first.
pub async fn get_conversation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(other): Path<String>,
) -> ApiResult<Json<Vec<MessageResponse>>> {
    if state.db.get_user_by_username(&other)?.is_none() {
        return Err(ApiError::not_found("user"));
    }

    let rows = state.db.get_conversation(&claims.sub, &other)?;
    Ok(Json(rows.into_iter().map(to_response).collect()))
}

pub async fn inbox(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<MessageResponse>>> {
    let rows = state.db.messages_by_receiver(&claims.sub)?;
    Ok(Json(rows.into_iter().map(to_response).collect()))
}

pub async fn sent(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<MessageResponse>>> {
    let rows = state.db.messages_by_sender(&claims.sub)?;
    Ok(Json(rows.into_iter().map(to_response).collect()))
}

fn to_response(row: MessageRow) -> MessageResponse {
    MessageResponse {
        message_id: row.message_id,
        text: row.text,
        sender_id: row.sender_id,
        receiver_id: row.receiver_id,
        created_at: row
            .created_at
            .parse::<chrono::DateTime<chrono::Utc>>()
            .or_else(|_| {
                // SQLite's datetime('now') has no timezone marker; treat it as UTC
                chrono::NaiveDateTime::parse_from_str(&row.created_at, "%Y-%m-%d %H:%M:%S")
                    .map(|ndt| ndt.and_utc())
            })
            .unwrap_or_else(|e| {
                warn!("Corrupt created_at '{}' on message {}: {}", row.created_at, row.message_id, e);
                chrono::DateTime::default()
            }),
    }
}
