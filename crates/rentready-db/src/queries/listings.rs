use anyhow::Result;
use rusqlite::params;

use super::OptionalExt;
use super::locations::{NewLocation, insert_location_tx};
use crate::Database;
use crate::models::{ListingRow, ListingStats, LocationRow, PhotoRow};

/// Scalar fields of a listing about to be created.
#[derive(Debug, Clone)]
pub struct NewListing {
    pub price: f64,
    pub description: String,
    pub contact_info: String,
    pub host_username: String,
}

const LISTING_WITH_LOCATION: &str = "
    SELECT l.listing_id, l.price, l.description, l.contact_info, l.host_username,
           l.location_id,
           loc.location_id, loc.street, loc.city, loc.state, loc.zip_code,
           loc.number_of_rooms, loc.loc_type
    FROM listings l
    LEFT JOIN locations loc ON l.location_id = loc.location_id";

impl Database {
    /// Create a listing, its location, and its photos in one transaction.
    /// Either everything lands or nothing does — there is no partially
    /// created listing to clean up after a failure.
    pub fn create_listing(
        &self,
        new: &NewListing,
        location_id: Option<i64>,
        new_location: Option<&NewLocation>,
        photo_urls: &[String],
    ) -> Result<i64> {
        self.transaction(|tx| {
            let location_id = match (location_id, new_location) {
                (Some(id), _) => Some(id),
                (None, Some(loc)) => Some(insert_location_tx(tx, loc)?),
                (None, None) => None,
            };

            tx.execute(
                "INSERT INTO listings (price, description, contact_info, host_username, location_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    new.price,
                    new.description,
                    new.contact_info,
                    new.host_username,
                    location_id
                ],
            )?;
            let listing_id = tx.last_insert_rowid();

            for url in photo_urls {
                tx.execute(
                    "INSERT INTO photos (photo_url, f_listing_id) VALUES (?1, ?2)",
                    params![url, listing_id],
                )?;
            }

            Ok(listing_id)
        })
    }

    pub fn get_listing(&self, listing_id: i64) -> Result<Option<(ListingRow, Option<LocationRow>)>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE l.listing_id = ?1", LISTING_WITH_LOCATION);
            let mut stmt = conn.prepare(&sql)?;
            let row = stmt.query_row([listing_id], map_listing_with_location).optional()?;
            Ok(row)
        })
    }

    /// All listings with their locations attached. Optional city/state
    /// filter; filtered queries only match located listings.
    pub fn list_listings(
        &self,
        city: Option<&str>,
        state: Option<&str>,
    ) -> Result<Vec<(ListingRow, Option<LocationRow>)>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{}
                 WHERE (?1 IS NULL OR loc.city = ?1)
                   AND (?2 IS NULL OR loc.state = ?2)
                 ORDER BY l.listing_id",
                LISTING_WITH_LOCATION
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![city, state], map_listing_with_location)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_listings_by_host(
        &self,
        host_username: &str,
    ) -> Result<Vec<(ListingRow, Option<LocationRow>)>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE l.host_username = ?1 ORDER BY l.listing_id",
                LISTING_WITH_LOCATION
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([host_username], map_listing_with_location)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Batch-fetch photos for a set of listing IDs.
    pub fn photos_for_listings(&self, listing_ids: &[i64]) -> Result<Vec<PhotoRow>> {
        if listing_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=listing_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT photo_id, photo_url, f_listing_id, photo_time
                 FROM photos WHERE f_listing_id IN ({})
                 ORDER BY photo_id",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = listing_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), map_photo)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn add_photo(&self, listing_id: i64, photo_url: &str) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO photos (photo_url, f_listing_id) VALUES (?1, ?2)",
                params![photo_url, listing_id],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_photo(&self, photo_id: i64) -> Result<Option<PhotoRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT photo_id, photo_url, f_listing_id, photo_time
                 FROM photos WHERE photo_id = ?1",
            )?;
            let row = stmt.query_row([photo_id], map_photo).optional()?;
            Ok(row)
        })
    }

    pub fn delete_photo(&self, photo_id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM photos WHERE photo_id = ?1", [photo_id])?;
            Ok(changed > 0)
        })
    }

    /// Update a listing's scalar fields and (optionally) its location in one
    /// transaction. A location is created and linked when the listing did
    /// not have one yet. Returns false when the listing does not exist.
    pub fn update_listing(
        &self,
        listing_id: i64,
        price: Option<f64>,
        description: Option<&str>,
        contact_info: Option<&str>,
        location: Option<&NewLocation>,
    ) -> Result<bool> {
        self.transaction(|tx| {
            let existing: Option<Option<i64>> = tx
                .query_row(
                    "SELECT location_id FROM listings WHERE listing_id = ?1",
                    [listing_id],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(current_location) = existing else {
                return Ok(false);
            };

            if let Some(loc) = location {
                match current_location {
                    Some(location_id) => {
                        tx.execute(
                            "UPDATE locations
                             SET street = ?1, city = ?2, state = ?3, zip_code = ?4,
                                 number_of_rooms = ?5, loc_type = ?6
                             WHERE location_id = ?7",
                            params![
                                loc.street,
                                loc.city,
                                loc.state,
                                loc.zip_code,
                                loc.number_of_rooms,
                                loc.loc_type,
                                location_id
                            ],
                        )?;
                    }
                    None => {
                        let location_id = insert_location_tx(tx, loc)?;
                        tx.execute(
                            "UPDATE listings SET location_id = ?1 WHERE listing_id = ?2",
                            params![location_id, listing_id],
                        )?;
                    }
                }
            }

            tx.execute(
                "UPDATE listings
                 SET price = COALESCE(?1, price),
                     description = COALESCE(?2, description),
                     contact_info = COALESCE(?3, contact_info)
                 WHERE listing_id = ?4",
                params![price, description, contact_info, listing_id],
            )?;

            Ok(true)
        })
    }

    /// Delete a listing and its dependents. Photos, saved rows, bookings and
    /// reviews cascade through foreign keys; the one-to-one location row is
    /// removed in the same transaction.
    pub fn delete_listing(&self, listing_id: i64) -> Result<bool> {
        self.transaction(|tx| {
            let location_id: Option<Option<i64>> = tx
                .query_row(
                    "SELECT location_id FROM listings WHERE listing_id = ?1",
                    [listing_id],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(location_id) = location_id else {
                return Ok(false);
            };

            tx.execute("DELETE FROM listings WHERE listing_id = ?1", [listing_id])?;
            if let Some(location_id) = location_id {
                tx.execute("DELETE FROM locations WHERE location_id = ?1", [location_id])?;
            }
            Ok(true)
        })
    }

    /// Fresh aggregates over the whole listing set. The empty set yields
    /// zeros: AVG over no rows is NULL, coalesced to 0 in SQL.
    pub fn listing_stats(&self) -> Result<ListingStats> {
        self.with_conn(|conn| {
            let (total_listings, total_hosts, average_price) = conn.query_row(
                "SELECT COUNT(*), COUNT(DISTINCT host_username), COALESCE(AVG(price), 0)
                 FROM listings",
                [],
                |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?, row.get::<_, f64>(2)?)),
            )?;

            let mut stmt = conn.prepare(
                "SELECT loc.city, COUNT(*)
                 FROM listings l
                 JOIN locations loc ON l.location_id = loc.location_id
                 GROUP BY loc.city
                 ORDER BY loc.city",
            )?;
            let city_counts = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(ListingStats {
                total_listings,
                total_hosts,
                average_price,
                city_counts,
            })
        })
    }
}

fn map_listing_with_location(
    row: &rusqlite::Row<'_>,
) -> std::result::Result<(ListingRow, Option<LocationRow>), rusqlite::Error> {
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
}

fn map_photo(row: &rusqlite::Row<'_>) -> std::result::Result<PhotoRow, rusqlite::Error> {
    Ok(PhotoRow {
        photo_id: row.get(0)?,
        photo_url: row.get(1)?,
        f_listing_id: row.get(2)?,
        photo_time: row.get(3)?,
    })
}
