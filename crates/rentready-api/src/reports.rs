use axum::{Extension, Json, extract::State};

use rentready_types::api::{Claims, StatsResponse};

use crate::auth::AppState;
use crate::error::ApiResult;

/// Listing statistics for the reporting dashboard, computed fresh from the
/// full listing set on every call.
pub async fn get_stats(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> ApiResult<Json<StatsResponse>> {
    let stats = state.db.listing_stats()?;

    Ok(Json(StatsResponse {
        total_listings: stats.total_listings,
        total_hosts: stats.total_hosts,
        average_price: stats.average_price,
        city_distribution: stats.city_counts.into_iter().collect(),
    }))
}
