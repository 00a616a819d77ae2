use std::collections::HashMap;

use anyhow::{Result, anyhow};
use rusqlite::{Connection, Row};
use uuid::Uuid;

use murmur_types::models::{Channel, Message, MessageThread, User};

use crate::Database;
use crate::models::{ChannelRow, MessageRow, UserRow};

const MESSAGE_SELECT: &str = "SELECT m.id, m.channel_id, m.sender_id, u.name, m.body, m.media_url, m.parent_id, m.created_at
     FROM messages m
     JOIN users u ON m.sender_id = u.id";

/// Fields of a message supplied by the poster. Ids and timestamps are
/// assigned on insert.
#[derive(Debug, Clone, Default)]
pub struct NewMessage {
    pub channel_id: Uuid,
    pub sender_id: Uuid,
    pub body: Option<String>,
    pub media_url: Option<String>,
    pub parent_id: Option<Uuid>,
}

impl Database {
    // -- Users --

    /// Always inserts a fresh row, even when `name` is already taken.
    pub fn create_user(&self, name: &str) -> Result<User> {
        let id = Uuid::new_v4().to_string();
        self.with_conn(|conn| {
            conn.execute("INSERT INTO users (id, name) VALUES (?1, ?2)", (&id, name))?;
            let row = conn.query_row("SELECT id, name FROM users WHERE id = ?1", [&id], |row| {
                Ok(UserRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?;
            Ok(row.into_user())
        })
    }

    // -- Channels --

    pub fn create_channel(&self, name: &str) -> Result<Channel> {
        let id = Uuid::new_v4().to_string();
        self.with_conn(|conn| {
            conn.execute("INSERT INTO channels (id, name) VALUES (?1, ?2)", (&id, name))?;
            let row = conn.query_row(
                "SELECT id, name, created_at FROM channels WHERE id = ?1",
                [&id],
                channel_from_row,
            )?;
            Ok(row.into_channel())
        })
    }

    /// All channels, oldest first.
    pub fn list_channels(&self) -> Result<Vec<Channel>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, created_at FROM channels ORDER BY created_at ASC, rowid ASC",
            )?;
            let rows = stmt
                .query_map([], channel_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(ChannelRow::into_channel).collect())
        })
    }

    // -- Messages --

    /// Store a message and return it with the sender resolved.
    ///
    /// Fails when the channel, sender or parent does not exist.
    pub fn insert_message(&self, new: &NewMessage) -> Result<Message> {
        let id = Uuid::new_v4().to_string();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, channel_id, sender_id, body, media_url, parent_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    id,
                    new.channel_id.to_string(),
                    new.sender_id.to_string(),
                    new.body,
                    new.media_url,
                    new.parent_id.map(|p| p.to_string()),
                ],
            )?;
            query_message(conn, &id)?
                .map(MessageRow::into_message)
                .ok_or_else(|| anyhow!("Message {} vanished after insert", id))
        })
    }

    /// Top-level messages of a channel, oldest first, each carrying its
    /// direct replies (also oldest first).
    pub fn list_threads(&self, channel_id: Uuid) -> Result<Vec<MessageThread>> {
        self.with_conn(|conn| {
            let channel_id = channel_id.to_string();
            let top_level = query_top_level(conn, &channel_id)?;
            let replies = query_replies(conn, &channel_id)?;

            let mut by_parent: HashMap<String, Vec<Message>> = HashMap::new();
            for reply in replies {
                if let Some(parent) = reply.parent_id.clone() {
                    by_parent.entry(parent).or_default().push(reply.into_message());
                }
            }

            Ok(top_level
                .into_iter()
                .map(|row| {
                    let replies = by_parent.remove(&row.id).unwrap_or_default();
                    MessageThread {
                        message: row.into_message(),
                        replies,
                    }
                })
                .collect())
        })
    }
}

fn channel_from_row(row: &Row<'_>) -> rusqlite::Result<ChannelRow> {
    Ok(ChannelRow {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        channel_id: row.get(1)?,
        sender_id: row.get(2)?,
        sender_name: row.get(3)?,
        body: row.get(4)?,
        media_url: row.get(5)?,
        parent_id: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn query_message(conn: &Connection, id: &str) -> Result<Option<MessageRow>> {
    let sql = format!("{} WHERE m.id = ?1", MESSAGE_SELECT);
    let row = conn.query_row(&sql, [id], message_from_row).optional()?;
    Ok(row)
}

fn query_top_level(conn: &Connection, channel_id: &str) -> Result<Vec<MessageRow>> {
    let sql = format!(
        "{} WHERE m.channel_id = ?1 AND m.parent_id IS NULL ORDER BY m.created_at ASC, m.rowid ASC",
        MESSAGE_SELECT
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([channel_id], message_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Direct replies to every top-level message of a channel. The parents are
/// selected in SQL, so the number of bound parameters stays fixed however
/// large the channel grows.
fn query_replies(conn: &Connection, channel_id: &str) -> Result<Vec<MessageRow>> {
    let sql = format!(
        "{} WHERE m.parent_id IN (
             SELECT id FROM messages WHERE channel_id = ?1 AND parent_id IS NULL
         )
         ORDER BY m.created_at ASC, m.rowid ASC",
        MESSAGE_SELECT
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([channel_id], message_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
