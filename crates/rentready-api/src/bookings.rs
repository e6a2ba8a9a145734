use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use rentready_db::models::BookingRow;
use rentready_db::queries::bookings::BookingOutcome;
use rentready_types::api::{AvailabilityResponse, BookingResponse, Claims, CreateBookingRequest};
use rentready_types::models::BookingStatus;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::listings::ensure_owner_or_admin;

pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(listing_id): Path<i64>,
    Json(req): Json<CreateBookingRequest>,
) -> ApiResult<impl IntoResponse + std::fmt::Debug> {
    let (listing, _) = state
        .db
        .get_listing(listing_id)?
        .ok_or_else(|| ApiError::not_found("listing"))?;

    if listing.host_username == claims.sub {
        return Err(ApiError::Validation("cannot book your own listing".into()));
    }

    let (check_in, check_out) = parse_range(&req.check_in_date, &req.check_out_date)?;
    let duration = (check_out - check_in).num_days();
    let confirmation = Uuid::new_v4().to_string();

    let outcome = state.db.create_booking(
        listing_id,
        &claims.sub,
        &req.check_in_date,
        &req.check_out_date,
        duration,
        &confirmation,
    )?;

    match outcome {
        BookingOutcome::Created(row) => Ok((StatusCode::CREATED, Json(to_response(row)?))),
        BookingOutcome::Unavailable => Err(ApiError::Conflict(
            "the listing is not available for the requested dates".into(),
        )),
    }
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub check_in_date: String,
    pub check_out_date: String,
}

pub async fn check_availability(
    State(state): State<AppState>,
    Path(listing_id): Path<i64>,
    Query(query): Query<AvailabilityQuery>,
) -> ApiResult<Json<AvailabilityResponse>> {
    if state.db.get_listing(listing_id)?.is_none() {
        return Err(ApiError::not_found("listing"));
    }
    parse_range(&query.check_in_date, &query.check_out_date)?;

    let available =
        state
            .db
            .is_available(listing_id, &query.check_in_date, &query.check_out_date)?;
    Ok(Json(AvailabilityResponse { available }))
}

/// A listing's bookings — visible to its host and to admins.
pub async fn listing_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(listing_id): Path<i64>,
) -> ApiResult<Json<Vec<BookingResponse>>> {
    let (listing, _) = state
        .db
        .get_listing(listing_id)?
        .ok_or_else(|| ApiError::not_found("listing"))?;
    ensure_owner_or_admin(&claims, &listing)?;

    let rows = state.db.bookings_for_listing(listing_id)?;
    rows.into_iter().map(to_response).collect::<ApiResult<Vec<_>>>().map(Json)
}

pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<BookingResponse>>> {
    let rows = state.db.bookings_by_guest(&claims.sub)?;
    rows.into_iter().map(to_response).collect::<ApiResult<Vec<_>>>().map(Json)
}

/// Cancel a booking. Allowed for the booking guest, the listing host, and
/// admins; the freed range becomes bookable again.
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((listing_id, check_in_date)): Path<(i64, String)>,
) -> ApiResult<impl IntoResponse + std::fmt::Debug> {
    let booking = state
        .db
        .get_booking(listing_id, &check_in_date)?
        .ok_or_else(|| ApiError::not_found("booking"))?;
    let (listing, _) = state
        .db
        .get_listing(listing_id)?
        .ok_or_else(|| ApiError::not_found("listing"))?;

    let allowed = booking.guest_username == claims.sub
        || listing.host_username == claims.sub
        || claims.is_admin();
    if !allowed {
        return Err(ApiError::PermissionDenied(
            "you don't have permission to cancel this booking".into(),
        ));
    }

    state
        .db
        .set_booking_status(listing_id, &check_in_date, BookingStatus::Cancelled.as_str())?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_range(check_in: &str, check_out: &str) -> ApiResult<(NaiveDate, NaiveDate)> {
    let check_in = NaiveDate::parse_from_str(check_in, "%Y-%m-%d")
        .map_err(|_| ApiError::Validation("check_in_date must be YYYY-MM-DD".into()))?;
    let check_out = NaiveDate::parse_from_str(check_out, "%Y-%m-%d")
        .map_err(|_| ApiError::Validation("check_out_date must be YYYY-MM-DD".into()))?;
    if check_out <= check_in {
        return Err(ApiError::Validation(
            "check_out_date must be after check_in_date".into(),
        ));
    }
    Ok((check_in, check_out))
}

fn to_response(row: BookingRow) -> ApiResult<BookingResponse> {
    let status: BookingStatus = row
        .reservation_status
        .parse()
        .map_err(|e| ApiError::Database(anyhow::anyhow!("corrupt status column: {}", e)))?;
    Ok(BookingResponse {
        f_listing_id: row.f_listing_id,
        guest_username: row.guest_username,
        check_in_date: row.check_in_date,
        check_out_date: row.check_out_date,
        duration: row.duration,
        reservation_status: status,
        reservation_confirmation: row.reservation_confirmation,
    })
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

    fn booking_req(check_in: &str, check_out: &str) -> CreateBookingRequest {
        CreateBookingRequest {
            check_in_date: check_in.into(),
            check_out_date: check_out.into(),
        }
    }

    #[tokio::test]
    async fn booking_lifecycle() {
        let state = testing::state();
        testing::register_user(&state, "alice", UserRole::Host);
        let guest = testing::register_user(&state, "bob", UserRole::Guest);
        let listing_id = seed_listing(&state, "alice");

        create_booking(
            State(state.clone()),
            Extension(guest.clone()),
            Path(listing_id),
            Json(booking_req("2026-09-01", "2026-09-05")),
        )
        .await
        .unwrap();

        let mine = my_bookings(State(state.clone()), Extension(guest.clone())).await.unwrap();
        assert_eq!(mine.0.len(), 1);
        assert_eq!(mine.0[0].duration, 4);
        assert_eq!(mine.0[0].reservation_status, BookingStatus::Pending);
        assert!(!mine.0[0].reservation_confirmation.is_empty());

        // Overlapping request conflicts
        let err = create_booking(
            State(state.clone()),
            Extension(guest.clone()),
            Path(listing_id),
            Json(booking_req("2026-09-03", "2026-09-08")),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        // Cancel frees the range
        cancel_booking(
            State(state.clone()),
            Extension(guest.clone()),
            Path((listing_id, "2026-09-01".into())),
        )
        .await
        .unwrap();
        create_booking(
            State(state.clone()),
            Extension(guest),
            Path(listing_id),
            Json(booking_req("2026-09-03", "2026-09-08")),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn invalid_requests_are_rejected() {
        let state = testing::state();
        let host = testing::register_user(&state, "alice", UserRole::Host);
        let guest = testing::register_user(&state, "bob", UserRole::Guest);
        let listing_id = seed_listing(&state, "alice");

        // Host booking their own listing
        let err = create_booking(
            State(state.clone()),
            Extension(host),
            Path(listing_id),
            Json(booking_req("2026-09-01", "2026-09-05")),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        // Reversed range
        let err = create_booking(
            State(state.clone()),
            Extension(guest.clone()),
            Path(listing_id),
            Json(booking_req("2026-09-05", "2026-09-01")),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        // Garbage date
        let err = create_booking(
            State(state.clone()),
            Extension(guest),
            Path(listing_id),
            Json(booking_req("next tuesday", "2026-09-05")),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn availability_and_host_view() {
        let state = testing::state();
        let host = testing::register_user(&state, "alice", UserRole::Host);
        let guest = testing::register_user(&state, "bob", UserRole::Guest);
        let listing_id = seed_listing(&state, "alice");

        let free = check_availability(
            State(state.clone()),
            Path(listing_id),
            Query(AvailabilityQuery {
                check_in_date: "2026-09-01".into(),
                check_out_date: "2026-09-05".into(),
            }),
        )
        .await
        .unwrap();
        assert!(free.0.available);

        create_booking(
            State(state.clone()),
            Extension(guest.clone()),
            Path(listing_id),
            Json(booking_req("2026-09-01", "2026-09-05")),
        )
        .await
        .unwrap();

        let taken = check_availability(
            State(state.clone()),
            Path(listing_id),
            Query(AvailabilityQuery {
                check_in_date: "2026-09-02".into(),
                check_out_date: "2026-09-04".into(),
            }),
        )
        .await
        .unwrap();
        assert!(!taken.0.available);

        // Host sees the booking; the guest may not use the host view
        let bookings = listing_bookings(State(state.clone()), Extension(host), Path(listing_id))
            .await
            .unwrap();
        assert_eq!(bookings.0.len(), 1);

        let err = listing_bookings(State(state.clone()), Extension(guest), Path(listing_id))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::PermissionDenied(_)));
    }
}
