use anyhow::Result;
use rusqlite::{Connection, params};

use super::OptionalExt;
use crate::Database;
use crate::models::BookingRow;

/// Outcome of a booking attempt. The overlap check and the insert run in the
/// same transaction, so two racing requests cannot both succeed.
#[derive(Debug)]
pub enum BookingOutcome {
    Created(BookingRow),
    /// The date range overlaps an existing non-cancelled booking.
    Unavailable,
}

impl Database {
    pub fn create_booking(
        &self,
        listing_id: i64,
        guest_username: &str,
        check_in_date: &str,
        check_out_date: &str,
        duration: i64,
        confirmation: &str,
    ) -> Result<BookingOutcome> {
        self.transaction(|tx| {
            if overlaps(tx, listing_id, check_in_date, check_out_date)? {
                return Ok(BookingOutcome::Unavailable);
            }

            tx.execute(
                "INSERT INTO bookings
                     (f_listing_id, guest_username, check_in_date, check_out_date,
                      duration, reservation_status, reservation_confirmation)
                 VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6)",
                params![
                    listing_id,
                    guest_username,
                    check_in_date,
                    check_out_date,
                    duration,
                    confirmation
                ],
            )?;

            Ok(BookingOutcome::Created(BookingRow {
                f_listing_id: listing_id,
                guest_username: guest_username.to_string(),
                check_in_date: check_in_date.to_string(),
                check_out_date: check_out_date.to_string(),
                duration,
                reservation_status: "pending".to_string(),
                reservation_confirmation: confirmation.to_string(),
            }))
        })
    }

    /// True when no non-cancelled booking overlaps the given range.
    pub fn is_available(
        &self,
        listing_id: i64,
        check_in_date: &str,
        check_out_date: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| Ok(!overlaps(conn, listing_id, check_in_date, check_out_date)?))
    }

    pub fn get_booking(&self, listing_id: i64, check_in_date: &str) -> Result<Option<BookingRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT f_listing_id, guest_username, check_in_date, check_out_date,
                        duration, reservation_status, reservation_confirmation
                 FROM bookings WHERE f_listing_id = ?1 AND check_in_date = ?2",
            )?;
            let row = stmt
                .query_row(params![listing_id, check_in_date], map_booking)
                .optional()?;
            Ok(row)
        })
    }

    pub fn bookings_for_listing(&self, listing_id: i64) -> Result<Vec<BookingRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT f_listing_id, guest_username, check_in_date, check_out_date,
                        duration, reservation_status, reservation_confirmation
                 FROM bookings WHERE f_listing_id = ?1 ORDER BY check_in_date",
            )?;
            let rows = stmt
                .query_map([listing_id], map_booking)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn bookings_by_guest(&self, guest_username: &str) -> Result<Vec<BookingRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT f_listing_id, guest_username, check_in_date, check_out_date,
                        duration, reservation_status, reservation_confirmation
                 FROM bookings WHERE guest_username = ?1 ORDER BY check_in_date",
            )?;
            let rows = stmt
                .query_map([guest_username], map_booking)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn set_booking_status(
        &self,
        listing_id: i64,
        check_in_date: &str,
        status: &str,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE bookings SET reservation_status = ?1
                 WHERE f_listing_id = ?2 AND check_in_date = ?3",
                params![status, listing_id, check_in_date],
            )?;
            Ok(changed > 0)
        })
    }
}

/// Half-open range overlap: [in, out) against every non-cancelled booking.
/// ISO dates compare correctly as text.
fn overlaps(
    conn: &Connection,
    listing_id: i64,
    check_in_date: &str,
    check_out_date: &str,
) -> Result<bool> {
    let found: bool = conn.query_row(
        "SELECT EXISTS(
             SELECT 1 FROM bookings
             WHERE f_listing_id = ?1
               AND reservation_status != 'cancelled'
               AND check_in_date < ?3
               AND check_out_date > ?2
         )",
        params![listing_id, check_in_date, check_out_date],
        |row| row.get(0),
    )?;
    Ok(found)
}

fn map_booking(row: &rusqlite::Row<'_>) -> std::result::Result<BookingRow, rusqlite::Error> {
    Ok(BookingRow {
        f_listing_id: row.get(0)?,
        guest_username: row.get(1)?,
        check_in_date: row.get(2)?,
        check_out_date: row.get(3)?,
        duration: row.get(4)?,
        reservation_status: row.get(5)?,
        reservation_confirmation: row.get(6)?,
    })
}
