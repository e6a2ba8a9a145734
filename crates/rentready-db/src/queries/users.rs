use anyhow::Result;
use rusqlite::{Connection, params};

use super::OptionalExt;
use crate::Database;
use crate::models::UserRow;

impl Database {
    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        mode: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (username, email, password, mode) VALUES (?1, ?2, ?3, ?4)",
                params![username, email, password_hash, mode],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(conn, "SELECT username, email, password, mode, created_at FROM users WHERE username = ?1", username)
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(conn, "SELECT username, email, password, mode, created_at FROM users WHERE email = ?1", email)
        })
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT username, email, password, mode, created_at FROM users ORDER BY username",
            )?;
            let rows = stmt
                .query_map([], map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Partial profile update: NULL arguments leave the column unchanged.
    pub fn update_user_profile(
        &self,
        username: &str,
        email: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET email = COALESCE(?1, email), password = COALESCE(?2, password)
                 WHERE username = ?3",
                params![email, password_hash, username],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn set_user_mode(&self, username: &str, mode: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET mode = ?1 WHERE username = ?2",
                params![mode, username],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_user(&self, username: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM users WHERE username = ?1", [username])?;
            Ok(changed > 0)
        })
    }
}

fn query_user(conn: &Connection, sql: &str, key: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(sql)?;
    let row = stmt.query_row([key], map_user).optional()?;
    Ok(row)
}

fn map_user(row: &rusqlite::Row<'_>) -> std::result::Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        username: row.get(0)?,
        email: row.get(1)?,
        password: row.get(2)?,
        mode: row.get(3)?,
        created_at: row.get(4)?,
    })
}
