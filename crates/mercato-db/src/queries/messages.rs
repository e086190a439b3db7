use anyhow::Result;
use rusqlite::{Connection, types::ToSql};

use super::OptionalExt;
use crate::models::MessageRow;
use crate::Database;

/// One canonical column set for every message read path: the message itself
/// plus both counterparts' display name/email and the listing title.
const MESSAGE_SELECT: &str = "SELECT \
     m.id, m.sender_id, m.recipient_id, m.listing_id, m.subject, m.content, m.read, m.created_at, \
     TRIM(COALESCE(s.first_name, '') || ' ' || COALESCE(s.last_name, '')), s.email, \
     TRIM(COALESCE(r.first_name, '') || ' ' || COALESCE(r.last_name, '')), r.email, \
     l.title \
     FROM messages m \
     LEFT JOIN users s ON m.sender_id = s.id \
     LEFT JOIN users r ON m.recipient_id = r.id \
     LEFT JOIN listings l ON m.listing_id = l.id";

impl Database {
    pub fn insert_message(
        &self,
        id: &str,
        sender_id: &str,
        recipient_id: &str,
        listing_id: Option<&str>,
        subject: Option<&str>,
        content: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, sender_id, recipient_id, listing_id, subject, content, read)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
                rusqlite::params![id, sender_id, recipient_id, listing_id, subject, content],
            )?;
            Ok(())
        })
    }

    pub fn get_message(&self, id: &str) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!("{MESSAGE_SELECT} WHERE m.id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            let row = stmt.query_row([id], map_message_row).optional()?;
            Ok(row)
        })
    }

    /// Messages received by the user, newest first.
    pub fn get_inbox(&self, user_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_messages_where(conn, "m.recipient_id = ?1", user_id, "DESC"))
    }

    /// Messages sent by the user, newest first.
    pub fn get_sent(&self, user_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_messages_where(conn, "m.sender_id = ?1", user_id, "DESC"))
    }

    /// Both directions between two users, oldest first. An optional listing id
    /// narrows the thread to one listing.
    pub fn get_conversation(
        &self,
        user_id: &str,
        other_user_id: &str,
        listing_id: Option<&str>,
    ) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut sql = format!(
                "{MESSAGE_SELECT} WHERE ((m.sender_id = ?1 AND m.recipient_id = ?2) \
                 OR (m.sender_id = ?2 AND m.recipient_id = ?1))"
            );
            let mut params: Vec<&dyn ToSql> = vec![&user_id, &other_user_id];
            if let Some(listing_id) = &listing_id {
                sql.push_str(" AND m.listing_id = ?3");
                params.push(listing_id);
            }
            // rowid tie-breaks messages created within the same second
            sql.push_str(" ORDER BY m.created_at ASC, m.rowid ASC");

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params.as_slice(), map_message_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Flips read to true. Already-read messages are left as they are, so the
    /// write is naturally idempotent.
    pub fn mark_message_read(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("UPDATE messages SET read = 1 WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    pub fn delete_message(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM messages WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    pub fn unread_count(&self, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE recipient_id = ?1 AND read = 0",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }
}

fn query_messages_where(
    conn: &Connection,
    predicate: &str,
    user_id: &str,
    order: &str,
) -> Result<Vec<MessageRow>> {
    let sql = format!("{MESSAGE_SELECT} WHERE {predicate} ORDER BY m.created_at {order}, m.rowid {order}");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([user_id], map_message_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn map_message_row(row: &rusqlite::Row<'_>) -> std::result::Result<MessageRow, rusqlite::Error> {
    // Joined names come back as '' when the counterpart row is gone
    let sender_name: Option<String> = row.get::<_, Option<String>>(8)?.filter(|s| !s.is_empty());
    let recipient_name: Option<String> = row.get::<_, Option<String>>(10)?.filter(|s| !s.is_empty());

    Ok(MessageRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        recipient_id: row.get(2)?,
        listing_id: row.get(3)?,
        subject: row.get(4)?,
        content: row.get(5)?,
        read: row.get(6)?,
        created_at: row.get(7)?,
        sender_name,
        sender_email: row.get(9)?,
        recipient_name,
        recipient_email: row.get(11)?,
        listing_title: row.get(12)?,
    })
}
