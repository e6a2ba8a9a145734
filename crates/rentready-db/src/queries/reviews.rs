use anyhow::Result;
use rusqlite::params;

use crate::Database;
use crate::models::ReviewRow;

impl Database {
    pub fn insert_review(
        &self,
        listing_id: i64,
        host_username: &str,
        guest_username: &str,
        review_text: &str,
    ) -> Result<ReviewRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO host_reviews (f_listing_id, f_host_username, f_guest_username, review_text)
                 VALUES (?1, ?2, ?3, ?4)",
                params![listing_id, host_username, guest_username, review_text],
            )?;
            let review_id = conn.last_insert_rowid();

            let mut stmt = conn.prepare(
                "SELECT review_id, f_listing_id, f_host_username, f_guest_username,
                        review_text, review_date
                 FROM host_reviews WHERE review_id = ?1",
            )?;
            let row = stmt.query_row([review_id], map_review)?;
            Ok(row)
        })
    }

    pub fn reviews_for_host(&self, host_username: &str) -> Result<Vec<ReviewRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT review_id, f_listing_id, f_host_username, f_guest_username,
                        review_text, review_date
                 FROM host_reviews WHERE f_host_username = ?1 ORDER BY review_id",
            )?;
            let rows = stmt
                .query_map([host_username], map_review)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn reviews_for_listing(&self, listing_id: i64) -> Result<Vec<ReviewRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT review_id, f_listing_id, f_host_username, f_guest_username,
                        review_text, review_date
                 FROM host_reviews WHERE f_listing_id = ?1 ORDER BY review_id",
            )?;
            let rows = stmt
                .query_map([listing_id], map_review)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn map_review(row: &rusqlite::Row<'_>) -> std::result::Result<ReviewRow, rusqlite::Error> {
    Ok(ReviewRow {
        review_id: row.get(0)?,
        f_listing_id: row.get(1)?,
        f_host_username: row.get(2)?,
        f_guest_username: row.get(3)?,
        review_text: row.get(4)?,
        review_date: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::Database;
    use crate::queries::listings::NewListing;

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
                None,
                &[],
            )
            .unwrap();
        (db, listing_id)
    }

    #[test]
    fn review_round_trip() {
        let (db, listing_id) = setup();

        let review = db
            .insert_review(listing_id, "alice", "bob", "great host")
            .unwrap();
        assert_eq!(review.f_guest_username, "bob");
        assert_eq!(review.review_text, "great host");

        let by_host = db.reviews_for_host("alice").unwrap();
        assert_eq!(by_host.len(), 1);
        assert_eq!(by_host[0].review_id, review.review_id);

        assert_eq!(db.reviews_for_listing(listing_id).unwrap().len(), 1);
        assert!(db.reviews_for_host("bob").unwrap().is_empty());
    }
}
