/// Database row types — these map directly to SQLite rows.
/// Distinct from rentready-types API models to keep the DB layer independent.

#[derive(Debug, Clone)]
pub struct UserRow {
    pub username: String,
    pub email: String,
    pub password: String,
    pub mode: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct LocationRow {
    pub location_id: i64,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub number_of_rooms: i64,
    pub loc_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ListingRow {
    pub listing_id: i64,
    pub price: f64,
    pub description: String,
    pub contact_info: String,
    pub host_username: String,
    pub location_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct PhotoRow {
    pub photo_id: i64,
    pub photo_url: String,
    pub f_listing_id: i64,
    pub photo_time: String,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub message_id: i64,
    pub text: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct SavedListingRow {
    pub f_username: String,
    pub listing_id: i64,
}

#[derive(Debug, Clone)]
pub struct BookingRow {
    pub f_listing_id: i64,
    pub guest_username: String,
    pub check_in_date: String,
    pub check_out_date: String,
    pub duration: i64,
    pub reservation_status: String,
    pub reservation_confirmation: String,
}

#[derive(Debug, Clone)]
pub struct ReviewRow {
    pub review_id: i64,
    pub f_listing_id: i64,
    pub f_host_username: String,
    pub f_guest_username: String,
    pub review_text: String,
    pub review_date: String,
}

/// Aggregates for the reporting endpoint, computed fresh per call.
#[derive(Debug, Default)]
pub struct ListingStats {
    pub total_listings: u64,
    pub total_hosts: u64,
    pub average_price: f64,
    /// (city, listing count), cities with no located listings absent.
    pub city_counts: Vec<(String, u64)>,
}
