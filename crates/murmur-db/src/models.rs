//! Database row types. These map directly to SQLite rows and are converted
//! into `murmur-types` models before leaving the crate.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use murmur_types::models::{Channel, Message, User};

pub struct UserRow {
    pub id: String,
    pub name: String,
}

pub struct ChannelRow {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub channel_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub body: Option<String>,
    pub media_url: Option<String>,
    pub parent_id: Option<String>,
    pub created_at: String,
}

impl UserRow {
    pub fn into_user(self) -> User {
        User {
            id: parse_id(&self.id, "user"),
            name: self.name,
        }
    }
}

impl ChannelRow {
    pub fn into_channel(self) -> Channel {
        Channel {
            id: parse_id(&self.id, "channel"),
            name: self.name,
            created_at: parse_timestamp(&self.created_at, &self.id),
        }
    }
}

impl MessageRow {
    pub fn into_message(self) -> Message {
        let sender_id = parse_id(&self.sender_id, "sender");
        Message {
            id: parse_id(&self.id, "message"),
            channel_id: parse_id(&self.channel_id, "channel"),
            sender_id,
            body: self.body,
            media_url: self.media_url,
            parent_id: self.parent_id.as_deref().map(|p| parse_id(p, "parent")),
            created_at: parse_timestamp(&self.created_at, &self.id),
            sender: User {
                id: sender_id,
                name: self.sender_name,
            },
        }
    }
}

fn parse_id(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", what, raw, e);
        Uuid::default()
    })
}

fn parse_timestamp(raw: &str, row_id: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by hand through the sqlite shell with datetime('now')
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on row '{}': {}", raw, row_id, e);
            DateTime::default()
        })
}
