use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Message;

/// Events sent FROM client TO server over the realtime gateway.
///
/// Frames look like `{"event": "joinChannel", "data": "<channel id>"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Enter a channel's room and appear in its presence list
    #[serde(rename = "joinChannel")]
    JoinChannel(Uuid),

    /// Leave a channel's room
    #[serde(rename = "leaveChannel")]
    LeaveChannel(Uuid),

    /// Start or stop typing in a channel
    #[serde(rename = "typing")]
    Typing(TypingPayload),

    /// Post a message (or a reply, when `parent_id` is set)
    #[serde(rename = "message:new")]
    MessageNew(NewMessagePayload),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub channel_id: Uuid,
    pub is_typing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessagePayload {
    pub channel_id: Uuid,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub media_url: Option<String>,
}

/// Events sent FROM server TO client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// Current participants of a channel, sent to every member of its room
    #[serde(rename = "presence:update", rename_all = "camelCase")]
    PresenceUpdate {
        channel_id: Uuid,
        participants: Vec<Uuid>,
    },

    /// Another member started or stopped typing
    #[serde(rename = "typing:update", rename_all = "camelCase")]
    TypingUpdate { user_id: Uuid, is_typing: bool },

    /// A message was stored and is being fanned out to the room
    #[serde(rename = "message:created")]
    MessageCreated(Message),

    /// Something the client asked for failed; only the asking connection sees this
    #[serde(rename = "error")]
    Error { error: String },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }
}
