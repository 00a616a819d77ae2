use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A stored chat message with its sender resolved.
///
/// `parent_id` links a reply to the message it answers. Only one level of
/// threading is ever queried.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub channel_id: Uuid,
    pub sender_id: Uuid,
    pub body: Option<String>,
    pub media_url: Option<String>,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub sender: User,
}

/// A top-level message together with its direct replies, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageThread {
    #[serde(flatten)]
    pub message: Message,
    pub replies: Vec<Message>,
}
