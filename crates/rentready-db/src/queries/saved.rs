use anyhow::Result;
use rusqlite::params;

use crate::Database;
use crate::models::{ListingRow, LocationRow, SavedListingRow};

impl Database {
    /// Save a listing for a user. Saving an already-saved listing is not an
    /// error: the existing row is returned unchanged (INSERT OR IGNORE
    /// absorbs the primary-key conflict).
    pub fn save_listing(&self, username: &str, listing_id: i64) -> Result<SavedListingRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO saved_listings (f_username, listing_id) VALUES (?1, ?2)",
                params![username, listing_id],
            )?;

            let row = conn.query_row(
                "SELECT f_username, listing_id FROM saved_listings
                 WHERE f_username = ?1 AND listing_id = ?2",
                params![username, listing_id],
                |row| {
                    Ok(SavedListingRow {
                        f_username: row.get(0)?,
                        listing_id: row.get(1)?,
                    })
                },
            )?;
            Ok(row)
        })
    }

    /// Returns false when the row was not saved to begin with.
    pub fn unsave_listing(&self, username: &str, listing_id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "DELETE FROM saved_listings WHERE f_username = ?1 AND listing_id = ?2",
                params![username, listing_id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn is_listing_saved(&self, username: &str, listing_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(
                     SELECT 1 FROM saved_listings WHERE f_username = ?1 AND listing_id = ?2
                 )",
                params![username, listing_id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    /// A user's saved listings joined with full listing and location details,
    /// in the order they were saved.
    pub fn saved_listings_with_details(
        &self,
        username: &str,
    ) -> Result<Vec<(ListingRow, Option<LocationRow>)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT l.listing_id, l.price, l.description, l.contact_info, l.host_username,
                        l.location_id,
                        loc.location_id, loc.street, loc.city, loc.state, loc.zip_code,
                        loc.number_of_rooms, loc.loc_type
                 FROM saved_listings s
                 JOIN listings l ON s.listing_id = l.listing_id
                 LEFT JOIN locations loc ON l.location_id = loc.location_id
                 WHERE s.f_username = ?1
                 ORDER BY s.created_at, l.listing_id",
            )?;
            let rows = stmt
                .query_map([username], |row| {
                    let listing = ListingRow {
                        listing_id: row.get(0)?,
                        price: row.get(1)?,
                        description: row.get(2)?,
                        contact_info: row.get(3)?,
                        host_username: row.get(4)?,
                        location_id: row.get(5)?,
                    };
                    let location = match row.get::<_, Option<i64>>(6)? {
                        Some(location_id) => Some(LocationRow {
                            location_id,
                            street: row.get(7)?,
                            city: row.get(8)?,
                            state: row.get(9)?,
                            zip_code: row.get(10)?,
                            number_of_rooms: row.get(11)?,
                            loc_type: row.get(12)?,
                        }),
                        None => None,
                    };
                    Ok((listing, location))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;
    use crate::queries::listings::NewListing;
    use crate::queries::locations::NewLocation;

    fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        db.create_user("alice", "alice@x.com", "hash", "host").unwrap();
        db.create_user("bob", "bob@x.com", "hash", "guest").unwrap();
        let listing_id = db
            .create_listing(
                &NewListing {
                    price: 100.0,
                    description: "A cozy place".into(),
                    contact_info: "call".into(),
                    host_username: "alice".into(),
                },
                None,
                Some(&NewLocation {
                    street: "123 Main St".into(),
                    city: "NY".into(),
                    state: "NY".into(),
                    zip_code: "10001".into(),
                    number_of_rooms: 2,
                    loc_type: None,
                }),
                &[],
            )
            .unwrap();
        (db, listing_id)
    }

    #[test]
    fn duplicate_save_is_idempotent() {
        let (db, listing_id) = setup();

        let first = db.save_listing("bob", listing_id).unwrap();
        let second = db.save_listing("bob", listing_id).unwrap();
        assert_eq!(first.f_username, second.f_username);
        assert_eq!(first.listing_id, second.listing_id);

        let details = db.saved_listings_with_details("bob").unwrap();
        assert_eq!(details.len(), 1);
    }

    #[test]
    fn save_check_unsave_cycle() {
        let (db, listing_id) = setup();

        assert!(!db.is_listing_saved("bob", listing_id).unwrap());
        db.save_listing("bob", listing_id).unwrap();
        assert!(db.is_listing_saved("bob", listing_id).unwrap());

        assert!(db.unsave_listing("bob", listing_id).unwrap());
        assert!(!db.is_listing_saved("bob", listing_id).unwrap());
        // Unsaving again is a no-op, not an error
        assert!(!db.unsave_listing("bob", listing_id).unwrap());
    }

    #[test]
    fn saving_unknown_listing_fails() {
        let (db, _) = setup();
        assert!(db.save_listing("bob", 9999).is_err());
    }

    #[test]
    fn details_include_location() {
        let (db, listing_id) = setup();
        db.save_listing("bob", listing_id).unwrap();

        let details = db.saved_listings_with_details("bob").unwrap();
        let (listing, location) = &details[0];
        assert_eq!(listing.listing_id, listing_id);
        assert_eq!(location.as_ref().unwrap().city, "NY");
    }

    #[test]
    fn deleting_listing_clears_saved_rows() {
        let (db, listing_id) = setup();
        db.save_listing("bob", listing_id).unwrap();

        db.delete_listing(listing_id).unwrap();
        assert!(!db.is_listing_saved("bob", listing_id).unwrap());
        assert!(db.saved_listings_with_details("bob").unwrap().is_empty());
    }
}
