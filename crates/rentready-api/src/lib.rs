pub mod auth;
pub mod bookings;
pub mod error;
pub mod listings;
pub mod messages;
pub mod middleware;
pub mod reports;
pub mod reviews;
pub mod saved;
pub mod users;

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use rentready_db::Database;
    use rentready_types::api::Claims;
    use rentready_types::models::UserRole;

    use crate::auth::{AppState, AppStateInner, hash_password};

    pub fn state() -> AppState {
        Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: "test-secret".into(),
        })
    }

    pub fn claims(username: &str, mode: UserRole) -> Claims {
        Claims {
            sub: username.to_string(),
            email: format!("{}@x.com", username),
            mode,
            exp: (chrono::Utc::now() + chrono::Duration::days(1)).timestamp() as usize,
        }
    }

    /// Insert a user with password "password123" and hand back their claims,
    /// as if they had logged in.
    pub fn register_user(state: &AppState, username: &str, mode: UserRole) -> Claims {
        let hash = hash_password("password123").unwrap();
        state
            .db
            .create_user(username, &format!("{}@x.com", username), &hash, mode.as_str())
            .unwrap();
        claims(username, mode)
    }
}
