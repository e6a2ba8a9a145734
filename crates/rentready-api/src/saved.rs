use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use rentready_types::api::{Claims, ListingResponse, SavedListingResponse, SavedStatusResponse};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::listings::aggregate;

/// Bookmark a listing. Saving twice is not an error — the existing row
/// comes back unchanged.
pub async fn save_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(listing_id): Path<i64>,
) -> ApiResult<impl IntoResponse + std::fmt::Debug> {
    if state.db.get_listing(listing_id)?.is_none() {
        return Err(ApiError::not_found("listing"));
    }

    let row = state.db.save_listing(&claims.sub, listing_id)?;
    Ok((
        StatusCode::CREATED,
        Json(SavedListingResponse {
            f_username: row.f_username,
            listing_id: row.listing_id,
        }),
    ))
}

pub async fn unsave_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(listing_id): Path<i64>,
) -> ApiResult<impl IntoResponse + std::fmt::Debug> {
    // Removing a bookmark that isn't there is a no-op, not an error
    state.db.unsave_listing(&claims.sub, listing_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn is_saved(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(listing_id): Path<i64>,
) -> ApiResult<Json<SavedStatusResponse>> {
    let saved = state.db.is_listing_saved(&claims.sub, listing_id)?;
    Ok(Json(SavedStatusResponse { saved }))
}

/// The caller's saved listings with full listing, location and photo details.
pub async fn list_saved(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<ListingResponse>>> {
    let rows = state.db.saved_listings_with_details(&claims.sub)?;
    Ok(Json(aggregate(&state.db, rows)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use rentready_db::queries::listings::NewListing;
    use rentready_types::models::UserRole;

    fn seed_listing(state: &AppState, host: &str) -> i64 {
        state
            .db
            .create_listing(
                &NewListing {
                    price: 100.0,
                    description: "A cozy place".into(),
                    contact_info: "call".into(),
                    host_username: host.into(),
                },
                None,
                None,
                &[],
            )
            .unwrap()
    }

    #[tokio::test]
    async fn double_save_is_idempotent() {
        let state = testing::state();
        testing::register_user(&state, "alice", UserRole::Host);
        let guest = testing::register_user(&state, "bob", UserRole::Guest);
        let listing_id = seed_listing(&state, "alice");

        save_listing(State(state.clone()), Extension(guest.clone()), Path(listing_id))
            .await
            .unwrap();
        // Second save of the same pair must not fail
        save_listing(State(state.clone()), Extension(guest.clone()), Path(listing_id))
            .await
            .unwrap();

        let saved = list_saved(State(state.clone()), Extension(guest)).await.unwrap();
        assert_eq!(saved.0.len(), 1);
        assert_eq!(saved.0[0].listing_id, listing_id);
    }

    #[tokio::test]
    async fn save_unknown_listing_is_not_found() {
        let state = testing::state();
        let guest = testing::register_user(&state, "bob", UserRole::Guest);

        let err = save_listing(State(state.clone()), Extension(guest), Path(9999))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn save_check_unsave_flow() {
        let state = testing::state();
        testing::register_user(&state, "alice", UserRole::Host);
        let guest = testing::register_user(&state, "bob", UserRole::Guest);
        let listing_id = seed_listing(&state, "alice");

        let status = is_saved(State(state.clone()), Extension(guest.clone()), Path(listing_id))
            .await
            .unwrap();
        assert!(!status.0.saved);

        save_listing(State(state.clone()), Extension(guest.clone()), Path(listing_id))
            .await
            .unwrap();
        let status = is_saved(State(state.clone()), Extension(guest.clone()), Path(listing_id))
            .await
            .unwrap();
        assert!(status.0.saved);

        unsave_listing(State(state.clone()), Extension(guest.clone()), Path(listing_id))
            .await
            .unwrap();
        // And unsaving again still succeeds
        unsave_listing(State(state.clone()), Extension(guest.clone()), Path(listing_id))
            .await
            .unwrap();
        let status = is_saved(State(state.clone()), Extension(guest), Path(listing_id))
            .await
            .unwrap();
        assert!(!status.0.saved);
    }
}
