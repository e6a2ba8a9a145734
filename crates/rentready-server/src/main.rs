use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use rentready_api::auth::{self, AppState, AppStateInner, hash_password};
use rentready_api::middleware::require_auth;
use rentready_api::{bookings, listings, messages, reports, reviews, saved, users};
use rentready_db::Database;
use rentready_types::models::UserRole;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rentready=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret = rentready_api::middleware::jwt_secret();
    let db_path = std::env::var("RENTREADY_DB_PATH").unwrap_or_else(|_| "rentready.db".into());
    let host = std::env::var("RENTREADY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("RENTREADY_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = Database::open(&PathBuf::from(&db_path))?;
    seed_admin(&db)?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner { db, jwt_secret });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        // Listings: browse, aggregate view, owner-gated mutations
        .route("/listings", get(listings::list_listings))
        .route("/listings", post(listings::create_listing))
        .route("/listings/{listing_id}", get(listings::get_listing))
        .route("/listings/{listing_id}", put(listings::update_listing))
        .route("/listings/{listing_id}", delete(listings::delete_listing))
        .route("/listings/{listing_id}/photos", post(listings::add_photo))
        .route("/photos/{photo_id}", delete(listings::delete_photo))
        // Profile
        .route("/me", get(users::get_me))
        .route("/me", put(users::update_profile))
        .route("/me/listings", get(listings::my_listings))
        // Saved listings
        .route("/me/saved", get(saved::list_saved))
        .route("/me/saved/{listing_id}", put(saved::save_listing))
        .route("/me/saved/{listing_id}", get(saved::is_saved))
        .route("/me/saved/{listing_id}", delete(saved::unsave_listing))
        // Messaging
        .route("/messages", post(messages::send_message))
        .route("/messages/inbox", get(messages::inbox))
        .route("/messages/sent", get(messages::sent))
        .route("/messages/{username}", get(messages::get_conversation))
        // Bookings
        .route("/me/bookings", get(bookings::my_bookings))
        .route("/listings/{listing_id}/bookings", post(bookings::create_booking))
        .route("/listings/{listing_id}/bookings", get(bookings::listing_bookings))
        .route(
            "/listings/{listing_id}/bookings/{check_in_date}",
            delete(bookings::cancel_booking),
        )
        .route("/listings/{listing_id}/availability", get(bookings::check_availability))
        // Reviews
        .route("/reviews", post(reviews::create_review))
        .route("/listings/{listing_id}/reviews", get(reviews::listing_reviews))
        .route("/hosts/{username}/reviews", get(reviews::host_reviews))
        // Reporting
        .route("/reports/stats", get(reports::get_stats))
        // Admin user management
        .route("/users", get(users::list_users))
        .route("/users/{username}/mode", put(users::set_role))
        .route("/users/{username}", delete(users::delete_user))
        .layer(middleware::from_fn(require_auth))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("RentReady server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the admin account on first start. Skipped unless credentials are
/// configured — there is no default admin password.
fn seed_admin(db: &Database) -> anyhow::Result<()> {
    let email =
        std::env::var("RENTREADY_ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".into());
    let Ok(password) = std::env::var("RENTREADY_ADMIN_PASSWORD") else {
        warn!("RENTREADY_ADMIN_PASSWORD not set; skipping admin seeding");
        return Ok(());
    };

    if db.get_user_by_email(&email)?.is_some() {
        return Ok(());
    }

    let password_hash = hash_password(&password)?;
    db.create_user("admin", &email, &password_hash, UserRole::Admin.as_str())?;
    info!("Seeded admin account for {}", email);
    Ok(())
}
