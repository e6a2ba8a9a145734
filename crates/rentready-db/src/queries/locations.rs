use anyhow::Result;
use rusqlite::{Transaction, params};

use super::OptionalExt;
use crate::Database;
use crate::models::LocationRow;

/// Address fields for a location about to be inserted or replaced.
#[derive(Debug, Clone)]
pub struct NewLocation {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub number_of_rooms: i64,
    pub loc_type: Option<String>,
}

impl Database {
    pub fn create_location(&self, loc: &NewLocation) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO locations (street, city, state, zip_code, number_of_rooms, loc_type)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    loc.street,
                    loc.city,
                    loc.state,
                    loc.zip_code,
                    loc.number_of_rooms,
                    loc.loc_type
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_location(&self, location_id: i64) -> Result<Option<LocationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT location_id, street, city, state, zip_code, number_of_rooms, loc_type
                 FROM locations WHERE location_id = ?1",
            )?;
            let row = stmt.query_row([location_id], map_location).optional()?;
            Ok(row)
        })
    }

    pub fn update_location(&self, location_id: i64, loc: &NewLocation) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
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
            Ok(changed > 0)
        })
    }

    pub fn search_locations(&self, city: &str, state: &str) -> Result<Vec<LocationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT location_id, street, city, state, zip_code, number_of_rooms, loc_type
                 FROM locations WHERE city = ?1 AND state = ?2",
            )?;
            let rows = stmt
                .query_map(params![city, state], map_location)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

pub(crate) fn insert_location_tx(tx: &Transaction, loc: &NewLocation) -> Result<i64> {
    tx.execute(
        "INSERT INTO locations (street, city, state, zip_code, number_of_rooms, loc_type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            loc.street,
            loc.city,
            loc.state,
            loc.zip_code,
            loc.number_of_rooms,
            loc.loc_type
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

pub(crate) fn map_location(
    row: &rusqlite::Row<'_>,
) -> std::result::Result<LocationRow, rusqlite::Error> {
    Ok(LocationRow {
        location_id: row.get(0)?,
        street: row.get(1)?,
        city: row.get(2)?,
        state: row.get(3)?,
        zip_code: row.get(4)?,
        number_of_rooms: row.get(5)?,
        loc_type: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::NewLocation;
    use crate::Database;

    fn loc(city: &str) -> NewLocation {
        NewLocation {
            street: "123 Main St".into(),
            city: city.into(),
            state: "NY".into(),
            zip_code: "10001".into(),
            number_of_rooms: 2,
            loc_type: None,
        }
    }

    #[test]
    fn location_crud() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_location(&loc("New York")).unwrap();

        let row = db.get_location(id).unwrap().unwrap();
        assert_eq!(row.city, "New York");
        assert_eq!(row.number_of_rooms, 2);

        let mut updated = loc("Brooklyn");
        updated.number_of_rooms = 3;
        assert!(db.update_location(id, &updated).unwrap());
        let row = db.get_location(id).unwrap().unwrap();
        assert_eq!(row.city, "Brooklyn");
        assert_eq!(row.number_of_rooms, 3);

        assert!(db.get_location(9999).unwrap().is_none());
    }

    #[test]
    fn search_by_city_and_state() {
        let db = Database::open_in_memory().unwrap();
        db.create_location(&loc("New York")).unwrap();
        db.create_location(&loc("New York")).unwrap();
        db.create_location(&loc("Albany")).unwrap();

        assert_eq!(db.search_locations("New York", "NY").unwrap().len(), 2);
        assert_eq!(db.search_locations("New York", "CA").unwrap().len(), 0);
    }
}
