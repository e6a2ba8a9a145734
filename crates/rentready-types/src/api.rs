use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{BookingStatus, UserRole};

// -- Token claims --

/// Bearer-token claims shared between the auth handlers (issuance) and the
/// middleware (validation). Canonical definition lives here in
/// rentready-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username — the primary key of the users table.
    pub sub: String,
    pub email: String,
    pub mode: UserRole,
    pub exp: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.mode == UserRole::Admin
    }
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Defaults to guest. Admin accounts cannot be self-registered.
    pub mode: Option<UserRole>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserResponse,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub token: String,
}

// -- Users --

/// User record as exposed over the wire — never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub username: String,
    pub email: String,
    pub mode: UserRole,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetRoleRequest {
    pub mode: UserRole,
}

// -- Listings --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocationInput {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub number_of_rooms: i64,
    pub loc_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationResponse {
    pub location_id: i64,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub number_of_rooms: i64,
    pub loc_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoResponse {
    pub photo_id: i64,
    pub photo_url: String,
    pub photo_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateListingRequest {
    pub price: f64,
    pub description: String,
    pub contact_info: String,
    /// Reference an existing location, or supply one inline. At most one of
    /// the two may be set.
    pub location_id: Option<i64>,
    pub location: Option<LocationInput>,
    #[serde(default)]
    pub photo_urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateListingRequest {
    pub price: Option<f64>,
    pub description: Option<String>,
    pub contact_info: Option<String>,
    /// Replaces the listing's location fields, creating the location row if
    /// the listing did not have one yet.
    pub location: Option<LocationInput>,
}

/// Denormalized listing view: the listing row with its location and photos
/// attached, as the presentation layer consumes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingResponse {
    pub listing_id: i64,
    pub price: f64,
    pub description: String,
    pub contact_info: String,
    pub host_username: String,
    pub location: Option<LocationResponse>,
    pub photos: Vec<PhotoResponse>,
}

// -- Reporting --

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_listings: u64,
    pub total_hosts: u64,
    pub average_price: f64,
    /// Count of listings per city. Listings without a resolvable location
    /// are counted in total_listings but absent here.
    pub city_distribution: BTreeMap<String, u64>,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub receiver_id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message_id: i64,
    pub text: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub created_at: DateTime<Utc>,
}

// -- Saved listings --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedListingResponse {
    pub f_username: String,
    pub listing_id: i64,
}

#[derive(Debug, Serialize)]
pub struct SavedStatusResponse {
    pub saved: bool,
}

// -- Bookings --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateBookingRequest {
    /// ISO dates (YYYY-MM-DD); check_out must be after check_in.
    pub check_in_date: String,
    pub check_out_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingResponse {
    pub f_listing_id: i64,
    pub guest_username: String,
    pub check_in_date: String,
    pub check_out_date: String,
    pub duration: i64,
    pub reservation_status: BookingStatus,
    pub reservation_confirmation: String,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub available: bool,
}

// -- Reviews --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateReviewRequest {
    pub f_listing_id: i64,
    pub review_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub review_id: i64,
    pub f_listing_id: i64,
    pub f_host_username: String,
    pub f_guest_username: String,
    pub review_text: String,
    pub review_date: String,
}

// -- Errors --

/// Wire shape of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
