use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            username    TEXT PRIMARY KEY,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            mode        TEXT NOT NULL DEFAULT 'guest'
                        CHECK (mode IN ('guest', 'host', 'admin')),
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS locations (
            location_id     INTEGER PRIMARY KEY AUTOINCREMENT,
            street          TEXT NOT NULL,
            city            TEXT NOT NULL,
            state           TEXT NOT NULL,
            zip_code        TEXT NOT NULL,
            number_of_rooms INTEGER NOT NULL DEFAULT 0,
            loc_type        TEXT
        );

        CREATE TABLE IF NOT EXISTS listings (
            listing_id    INTEGER PRIMARY KEY AUTOINCREMENT,
            price         REAL NOT NULL,
            description   TEXT NOT NULL DEFAULT '',
            contact_info  TEXT NOT NULL DEFAULT '',
            host_username TEXT NOT NULL REFERENCES users(username),
            location_id   INTEGER UNIQUE REFERENCES locations(location_id),
            created_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_listings_host
            ON listings(host_username);

        CREATE TABLE IF NOT EXISTS photos (
            photo_id     INTEGER PRIMARY KEY AUTOINCREMENT,
            photo_url    TEXT NOT NULL,
            f_listing_id INTEGER NOT NULL REFERENCES listings(listing_id)
                         ON DELETE CASCADE,
            photo_time   TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_photos_listing
            ON photos(f_listing_id);

        CREATE TABLE IF NOT EXISTS messages (
            message_id  INTEGER PRIMARY KEY AUTOINCREMENT,
            text        TEXT NOT NULL,
            sender_id   TEXT NOT NULL REFERENCES users(username)
                        ON DELETE CASCADE,
            receiver_id TEXT NOT NULL REFERENCES users(username)
                        ON DELETE CASCADE,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_messages_sender
            ON messages(sender_id);
        CREATE INDEX IF NOT EXISTS idx_messages_receiver
            ON messages(receiver_id);

        CREATE TABLE IF NOT EXISTS saved_listings (
            f_username  TEXT NOT NULL REFERENCES users(username)
                        ON DELETE CASCADE,
            listing_id  INTEGER NOT NULL REFERENCES listings(listing_id)
                        ON DELETE CASCADE,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (f_username, listing_id)
        );

        CREATE TABLE IF NOT EXISTS bookings (
            f_listing_id             INTEGER NOT NULL REFERENCES listings(listing_id)
                                     ON DELETE CASCADE,
            guest_username           TEXT NOT NULL REFERENCES users(username)
                                     ON DELETE CASCADE,
            check_in_date            TEXT NOT NULL,
            check_out_date           TEXT NOT NULL,
            duration                 INTEGER NOT NULL,
            reservation_status       TEXT NOT NULL DEFAULT 'pending'
                                     CHECK (reservation_status IN ('pending', 'confirmed', 'cancelled')),
            reservation_confirmation TEXT NOT NULL,
            PRIMARY KEY (f_listing_id, check_in_date)
        );

        CREATE INDEX IF NOT EXISTS idx_bookings_guest
            ON bookings(guest_username);

        CREATE TABLE IF NOT EXISTS host_reviews (
            review_id        INTEGER PRIMARY KEY AUTOINCREMENT,
            f_listing_id     INTEGER NOT NULL REFERENCES listings(listing_id)
                             ON DELETE CASCADE,
            f_host_username  TEXT NOT NULL REFERENCES users(username)
                             ON DELETE CASCADE,
            f_guest_username TEXT NOT NULL REFERENCES users(username)
                             ON DELETE CASCADE,
            review_text      TEXT NOT NULL,
            review_date      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_reviews_host
            ON host_reviews(f_host_username);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
