use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use rentready_db::models::ReviewRow;
use rentready_types::api::{Claims, CreateReviewRequest, ReviewResponse};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};

/// A guest reviews the host of a listing they did not post themselves.
pub async fn create_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateReviewRequest>,
) -> ApiResult<impl IntoResponse + std::fmt::Debug> {
    if req.review_text.trim().is_empty() {
        return Err(ApiError::Validation("review text is empty".into()));
    }

    let (listing, _) = state
        .db
        .get_listing(req.f_listing_id)?
        .ok_or_else(|| ApiError::not_found("listing"))?;

    if listing.host_username == claims.sub {
        return Err(ApiError::Validation("cannot review your own listing".into()));
    }

    let row = state.db.insert_review(
        req.f_listing_id,
        &listing.host_username,
        &claims.sub,
        &req.review_text,
    )?;

    Ok((StatusCode::CREATED, Json(to_response(row))))
}

pub async fn host_reviews(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(host_username): Path<String>,
) -> ApiResult<Json<Vec<ReviewResponse>>> {
    if state.db.get_user_by_username(&host_username)?.is_none() {
        return Err(ApiError::not_found("user"));
    }
    let rows = state.db.reviews_for_host(&host_username)?;
    Ok(Json(rows.into_iter().map(to_response).collect()))
}

pub async fn listing_reviews(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(listing_id): Path<i64>,
) -> ApiResult<Json<Vec<ReviewResponse>>> {
    if state.db.get_listing(listing_id)?.is_none() {
        return Err(ApiError::not_found("listing"));
    }
    let rows = state.db.reviews_for_listing(listing_id)?;
    Ok(Json(rows.into_iter().map(to_response).collect()))
}

fn to_response(row: ReviewRow) -> ReviewResponse {
    ReviewResponse {
        review_id: row.review_id,
        f_listing_id: row.f_listing_id,
        f_host_username: row.f_host_username,
        f_guest_username: row.f_guest_username,
        review_text: row.review_text,
        review_date: row.review_date,
    }
}
