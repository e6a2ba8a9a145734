use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::error;

use rentready_db::Database;
use rentready_db::models::{ListingRow, LocationRow, PhotoRow};
use rentready_db::queries::listings::NewListing;
use rentready_db::queries::locations::NewLocation;
use rentready_types::api::{
    Claims, CreateListingRequest, ListingResponse, LocationInput, LocationResponse, PhotoResponse,
    UpdateListingRequest,
};
use rentready_types::models::UserRole;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    pub city: Option<String>,
    pub state: Option<String>,
}

/// All listings, denormalized: each row carries its location and photos.
pub async fn list_listings(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> ApiResult<Json<Vec<ListingResponse>>> {
    // Run blocking DB work off the async runtime
    let db = state.clone();
    let listings = tokio::task::spawn_blocking(move || {
        let rows = db.db.list_listings(query.city.as_deref(), query.state.as_deref())?;
        aggregate(&db.db, rows)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Database(anyhow::anyhow!("join error"))
    })??;

    Ok(Json(listings))
}

pub async fn get_listing(
    State(state): State<AppState>,
    Path(listing_id): Path<i64>,
) -> ApiResult<Json<ListingResponse>> {
    let db = state.clone();
    let listing = tokio::task::spawn_blocking(move || {
        let Some((listing, location)) = db.db.get_listing(listing_id)? else {
            return Err(ApiError::not_found("listing"));
        };
        let photos = db.db.photos_for_listings(&[listing_id])?;
        let mut grouped = group_photos(photos);
        Ok(to_response(listing, location, grouped.remove(&listing_id).unwrap_or_default()))
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Database(anyhow::anyhow!("join error"))
    })??;

    Ok(Json(listing))
}

/// The authenticated user's own listings.
pub async fn my_listings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<ListingResponse>>> {
    let rows = state.db.list_listings_by_host(&claims.sub)?;
    Ok(Json(aggregate(&state.db, rows)?))
}

pub async fn create_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateListingRequest>,
) -> ApiResult<impl IntoResponse + std::fmt::Debug> {
    if claims.mode == UserRole::Guest {
        return Err(ApiError::PermissionDenied(
            "only hosts can create listings".into(),
        ));
    }
    if !req.price.is_finite() || req.price < 0.0 {
        return Err(ApiError::Validation("price must be non-negative".into()));
    }
    if req.location_id.is_some() && req.location.is_some() {
        return Err(ApiError::Validation(
            "supply either location_id or inline location fields, not both".into(),
        ));
    }
    if let Some(location_id) = req.location_id {
        if state.db.get_location(location_id)?.is_none() {
            return Err(ApiError::not_found("location"));
        }
    }

    let new = NewListing {
        price: req.price,
        description: req.description,
        contact_info: req.contact_info,
        host_username: claims.sub.clone(),
    };
    let new_location = req.location.map(to_new_location);

    let listing_id = state.db.create_listing(
        &new,
        req.location_id,
        new_location.as_ref(),
        &req.photo_urls,
    )?;

    let response = fetch_one(&state.db, listing_id)?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn update_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(listing_id): Path<i64>,
    Json(req): Json<UpdateListingRequest>,
) -> ApiResult<Json<ListingResponse>> {
    let (listing, _) = state
        .db
        .get_listing(listing_id)?
        .ok_or_else(|| ApiError::not_found("listing"))?;

    // Ownership gate fires before any write is issued
    ensure_owner_or_admin(&claims, &listing)?;

    if let Some(price) = req.price {
        if !price.is_finite() || price < 0.0 {
            return Err(ApiError::Validation("price must be non-negative".into()));
        }
    }

    let new_location = req.location.map(to_new_location);
    state.db.update_listing(
        listing_id,
        req.price,
        req.description.as_deref(),
        req.contact_info.as_deref(),
        new_location.as_ref(),
    )?;

    Ok(Json(fetch_one(&state.db, listing_id)?))
}

pub async fn delete_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(listing_id): Path<i64>,
) -> ApiResult<impl IntoResponse + std::fmt::Debug> {
    let (listing, _) = state
        .db
        .get_listing(listing_id)?
        .ok_or_else(|| ApiError::not_found("listing"))?;

    ensure_owner_or_admin(&claims, &listing)?;

    state.db.delete_listing(listing_id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddPhotoRequest {
    pub photo_url: String,
}

pub async fn add_photo(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(listing_id): Path<i64>,
    Json(req): Json<AddPhotoRequest>,
) -> ApiResult<impl IntoResponse + std::fmt::Debug> {
    if req.photo_url.trim().is_empty() {
        return Err(ApiError::Validation("photo_url is empty".into()));
    }

    let (listing, _) = state
        .db
        .get_listing(listing_id)?
        .ok_or_else(|| ApiError::not_found("listing"))?;
    ensure_owner_or_admin(&claims, &listing)?;

    let photo_id = state.db.add_photo(listing_id, &req.photo_url)?;
    let photo = state
        .db
        .get_photo(photo_id)?
        .ok_or_else(|| ApiError::not_found("photo"))?;

    Ok((
        StatusCode::CREATED,
        Json(PhotoResponse {
            photo_id: photo.photo_id,
            photo_url: photo.photo_url,
            photo_time: photo.photo_time,
        }),
    ))
}

pub async fn delete_photo(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(photo_id): Path<i64>,
) -> ApiResult<impl IntoResponse + std::fmt::Debug> {
    let photo = state
        .db
        .get_photo(photo_id)?
        .ok_or_else(|| ApiError::not_found("photo"))?;
    let (listing, _) = state
        .db
        .get_listing(photo.f_listing_id)?
        .ok_or_else(|| ApiError::not_found("listing"))?;
    ensure_owner_or_admin(&claims, &listing)?;

    state.db.delete_photo(photo_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Owner-or-admin check shared by every listing mutation.
pub(crate) fn ensure_owner_or_admin(claims: &Claims, listing: &ListingRow) -> Result<(), ApiError> {
    if listing.host_username == claims.sub || claims.is_admin() {
        Ok(())
    } else {
        Err(ApiError::PermissionDenied(
            "you don't have permission to modify this listing".into(),
        ))
    }
}

/// Attach photos to (listing, location) pairs in one batched query.
pub(crate) fn aggregate(
    db: &Database,
    rows: Vec<(ListingRow, Option<LocationRow>)>,
) -> ApiResult<Vec<ListingResponse>> {
    let ids: Vec<i64> = rows.iter().map(|(l, _)| l.listing_id).collect();
    let mut grouped = group_photos(db.photos_for_listings(&ids)?);

    Ok(rows
        .into_iter()
        .map(|(listing, location)| {
            let photos = grouped.remove(&listing.listing_id).unwrap_or_default();
            to_response(listing, location, photos)
        })
        .collect())
}

fn fetch_one(db: &Database, listing_id: i64) -> ApiResult<ListingResponse> {
    let (listing, location) = db
        .get_listing(listing_id)?
        .ok_or_else(|| ApiError::not_found("listing"))?;
    let photos = db.photos_for_listings(&[listing_id])?;
    let mut grouped = group_photos(photos);
    Ok(to_response(listing, location, grouped.remove(&listing_id).unwrap_or_default()))
}

fn group_photos(photos: Vec<PhotoRow>) -> HashMap<i64, Vec<PhotoResponse>> {
    let mut grouped: HashMap<i64, Vec<PhotoResponse>> = HashMap::new();
    for photo in photos {
        grouped.entry(photo.f_listing_id).or_default().push(PhotoResponse {
            photo_id: photo.photo_id,
            photo_url: photo.photo_url,
            photo_time: photo.photo_time,
        });
    }
    grouped
}

fn to_response(
    listing: ListingRow,
    location: Option<LocationRow>,
    photos: Vec<PhotoResponse>,
) -> ListingResponse {
    ListingResponse {
        listing_id: listing.listing_id,
        price: listing.price,
        description: listing.description,
        contact_info: listing.contact_info,
        host_username: listing.host_username,
        location: location.map(|loc| LocationResponse {
            location_id: loc.location_id,
            street: loc.street,
            city: loc.city,
            state: loc.state,
            zip_code: loc.zip_code,
            number_of_rooms: loc.number_of_rooms,
            loc_type: loc.loc_type,
        }),
        photos,
    }
}

fn to_new_location(input: LocationInput) -> NewLocation {
    NewLocation {
        street: input.street,
        city: input.city,
        state: input.state,
        zip_code: input.zip_code,
        number_of_rooms: input.number_of_rooms,
        loc_type: input.loc_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn location_input() -> LocationInput {
        LocationInput {
            street: "123 Main St".into(),
            city: "NY".into(),
            state: "NY".into(),
            zip_code: "10001".into(),
            number_of_rooms: 2,
            loc_type: None,
        }
    }

    fn create_req() -> CreateListingRequest {
        CreateListingRequest {
            price: 100.0,
            description: "A cozy place".into(),
            contact_info: "call me".into(),
            location_id: None,
            location: Some(location_input()),
            photo_urls: vec!["http://img/1.jpg".into()],
        }
    }

    fn create_as(state: &AppState, claims: &Claims) -> i64 {
        let listing_id = state
            .db
            .create_listing(
                &NewListing {
                    price: 100.0,
                    description: "A cozy place".into(),
                    contact_info: "call me".into(),
                    host_username: claims.sub.clone(),
                },
                None,
                Some(&to_new_location(location_input())),
                &[],
            )
            .unwrap();
        listing_id
    }

    #[tokio::test]
    async fn create_and_get_round_trip() {
        let state = testing::state();
        let host = testing::register_user(&state, "alice", UserRole::Host);

        create_listing(State(state.clone()), Extension(host), Json(create_req()))
            .await
            .unwrap();
        // Pull the id back out via the list endpoint
        let all = list_listings(
            State(state.clone()),
            Query(ListingQuery { city: None, state: None }),
        )
        .await
        .unwrap();
        assert_eq!(all.0.len(), 1);
        let listing = &all.0[0];
        assert_eq!(listing.price, 100.0);
        assert_eq!(listing.host_username, "alice");
        assert_eq!(listing.location.as_ref().unwrap().city, "NY");
        assert_eq!(listing.photos.len(), 1);

        let one = get_listing(State(state.clone()), Path(listing.listing_id))
            .await
            .unwrap();
        assert_eq!(one.0.description, "A cozy place");
        assert_eq!(one.0.photos[0].photo_url, "http://img/1.jpg");
    }

    #[tokio::test]
    async fn guests_cannot_create_listings() {
        let state = testing::state();
        let guest = testing::register_user(&state, "bob", UserRole::Guest);

        let err = create_listing(State(state.clone()), Extension(guest), Json(create_req()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::PermissionDenied(_)));
        assert!(state.db.list_listings(None, None).unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_by_stranger_rejects_before_any_write() {
        let state = testing::state();
        let host = testing::register_user(&state, "alice", UserRole::Host);
        let stranger = testing::register_user(&state, "mallory", UserRole::Host);
        let listing_id = create_as(&state, &host);

        let err = update_listing(
            State(state.clone()),
            Extension(stranger),
            Path(listing_id),
            Json(UpdateListingRequest {
                price: Some(1.0),
                description: Some("hijacked".into()),
                contact_info: None,
                location: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::PermissionDenied(_)));

        // The stored row is untouched — no mutation was issued
        let (listing, _) = state.db.get_listing(listing_id).unwrap().unwrap();
        assert_eq!(listing.price, 100.0);
        assert_eq!(listing.description, "A cozy place");
    }

    #[tokio::test]
    async fn owner_and_admin_can_update() {
        let state = testing::state();
        let host = testing::register_user(&state, "alice", UserRole::Host);
        let admin = testing::register_user(&state, "root", UserRole::Admin);
        let listing_id = create_as(&state, &host);

        let updated = update_listing(
            State(state.clone()),
            Extension(host),
            Path(listing_id),
            Json(UpdateListingRequest {
                price: Some(150.0),
                description: None,
                contact_info: None,
                location: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.0.price, 150.0);
        assert_eq!(updated.0.description, "A cozy place");

        let updated = update_listing(
            State(state.clone()),
            Extension(admin),
            Path(listing_id),
            Json(UpdateListingRequest {
                price: None,
                description: Some("admin edit".into()),
                contact_info: None,
                location: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.0.description, "admin edit");
        assert_eq!(updated.0.price, 150.0);
    }

    #[tokio::test]
    async fn delete_is_gated_and_removes_the_listing() {
        let state = testing::state();
        let host = testing::register_user(&state, "alice", UserRole::Host);
        let stranger = testing::register_user(&state, "mallory", UserRole::Guest);
        let listing_id = create_as(&state, &host);

        let err = delete_listing(State(state.clone()), Extension(stranger), Path(listing_id))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::PermissionDenied(_)));
        assert!(state.db.get_listing(listing_id).unwrap().is_some());

        delete_listing(State(state.clone()), Extension(host.clone()), Path(listing_id))
            .await
            .unwrap();
        assert!(state.db.get_listing(listing_id).unwrap().is_none());

        let err = delete_listing(State(state.clone()), Extension(host), Path(listing_id))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn photo_management_is_owner_gated() {
        let state = testing::state();
        let host = testing::register_user(&state, "alice", UserRole::Host);
        let stranger = testing::register_user(&state, "mallory", UserRole::Host);
        let listing_id = create_as(&state, &host);

        let err = add_photo(
            State(state.clone()),
            Extension(stranger.clone()),
            Path(listing_id),
            Json(AddPhotoRequest { photo_url: "http://img/evil.jpg".into() }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::PermissionDenied(_)));
        assert!(state.db.photos_for_listings(&[listing_id]).unwrap().is_empty());

        add_photo(
            State(state.clone()),
            Extension(host.clone()),
            Path(listing_id),
            Json(AddPhotoRequest { photo_url: "http://img/1.jpg".into() }),
        )
        .await
        .unwrap();
        let photos = state.db.photos_for_listings(&[listing_id]).unwrap();
        assert_eq!(photos.len(), 1);

        let err = delete_photo(
            State(state.clone()),
            Extension(stranger),
            Path(photos[0].photo_id),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::PermissionDenied(_)));

        delete_photo(State(state.clone()), Extension(host), Path(photos[0].photo_id))
            .await
            .unwrap();
        assert!(state.db.photos_for_listings(&[listing_id]).unwrap().is_empty());
    }

    #[tokio::test]
    async fn my_listings_only_shows_own() {
        let state = testing::state();
        let alice = testing::register_user(&state, "alice", UserRole::Host);
        let bob = testing::register_user(&state, "bob", UserRole::Host);
        create_as(&state, &alice);
        create_as(&state, &bob);

        let mine = my_listings(State(state.clone()), Extension(alice)).await.unwrap();
        assert_eq!(mine.0.len(), 1);
        assert_eq!(mine.0[0].host_username, "alice");
    }
}
