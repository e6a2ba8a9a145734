use anyhow::Result;
use rusqlite::params;

use super::OptionalExt;
use crate::Database;
use crate::models::MessageRow;

impl Database {
    /// Insert a message and read the stored row back. Messages are immutable
    /// once sent; ordering is by message_id.
    pub fn insert_message(
        &self,
        text: &str,
        sender_id: &str,
        receiver_id: &str,
    ) -> Result<MessageRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (text, sender_id, receiver_id) VALUES (?1, ?2, ?3)",
                params![text, sender_id, receiver_id],
            )?;
            let message_id = conn.last_insert_rowid();

            let mut stmt = conn.prepare(
                "SELECT message_id, text, sender_id, receiver_id, created_at
                 FROM messages WHERE message_id = ?1",
            )?;
            let row = stmt.query_row([message_id], map_message)?;
            Ok(row)
        })
    }

    /// Both directions of a two-user conversation, oldest first.
    pub fn get_conversation(&self, user_a: &str, user_b: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT message_id, text, sender_id, receiver_id, created_at
                 FROM messages
                 WHERE (sender_id = ?1 AND receiver_id = ?2)
                    OR (sender_id = ?2 AND receiver_id = ?1)
                 ORDER BY message_id",
            )?;
            let rows = stmt
                .query_map(params![user_a, user_b], map_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn messages_by_sender(&self, sender_id: &str) -> Result<Vec<MessageRow>> {
        self.messages_by_column("sender_id", sender_id)
    }

    pub fn messages_by_receiver(&self, receiver_id: &str) -> Result<Vec<MessageRow>> {
        self.messages_by_column("receiver_id", receiver_id)
    }

    fn messages_by_column(&self, column: &str, key: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT message_id, text, sender_id, receiver_id, created_at
                 FROM messages WHERE {} = ?1 ORDER BY message_id",
                column
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([key], map_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_message(&self, message_id: i64) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT message_id, text, sender_id, receiver_id, created_at
                 FROM messages WHERE message_id = ?1",
            )?;
            let row = stmt.query_row([message_id], map_message).optional()?;
            Ok(row)
        })
    }
}

fn map_message(row: &rusqlite::Row<'_>) -> std::result::Result<MessageRow, rusqlite::Error> {
    Ok(MessageRow {
        message_id: row.get(0)?,
        text: row.get(1)?,
        sender_id: row.get(2)?,
        receiver_id: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::Database;

    fn setup() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.create_user("alice", "alice@x.com", "hash", "host").unwrap();
        db.create_user("bob", "bob@x.com", "hash", "guest").unwrap();
        db.create_user("carol", "carol@x.com", "hash", "guest").unwrap();
        db
    }

    #[test]
    fn conversation_interleaves_both_directions_in_order() {
        let db = setup();
        db.insert_message("hi alice", "bob", "alice").unwrap();
        db.insert_message("hi bob", "alice", "bob").unwrap();
        db.insert_message("is it available?", "bob", "alice").unwrap();
        db.insert_message("unrelated", "carol", "alice").unwrap();

        let convo = db.get_conversation("alice", "bob").unwrap();
        assert_eq!(convo.len(), 3);
        assert_eq!(convo[0].text, "hi alice");
        assert_eq!(convo[1].text, "hi bob");
        assert_eq!(convo[2].text, "is it available?");
        assert!(convo.windows(2).all(|w| w[0].message_id < w[1].message_id));

        // Symmetric regardless of argument order
        let convo_rev = db.get_conversation("bob", "alice").unwrap();
        assert_eq!(convo_rev.len(), 3);
    }

    #[test]
    fn sender_and_receiver_views() {
        let db = setup();
        db.insert_message("one", "bob", "alice").unwrap();
        db.insert_message("two", "bob", "carol").unwrap();
        db.insert_message("three", "alice", "bob").unwrap();

        assert_eq!(db.messages_by_sender("bob").unwrap().len(), 2);
        assert_eq!(db.messages_by_receiver("bob").unwrap().len(), 1);
        assert_eq!(db.messages_by_receiver("alice").unwrap().len(), 1);
    }

    #[test]
    fn sending_to_unknown_user_fails() {
        let db = setup();
        assert!(db.insert_message("hello?", "bob", "nobody").is_err());
    }

    #[test]
    fn deleting_a_user_removes_their_messages() {
        let db = setup();
        db.insert_message("one", "bob", "alice").unwrap();
        db.insert_message("two", "alice", "bob").unwrap();

        db.delete_user("bob").unwrap();
        assert!(db.messages_by_receiver("alice").unwrap().is_empty());
        assert!(db.messages_by_sender("alice").unwrap().is_empty());
    }
}
