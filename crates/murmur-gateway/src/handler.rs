use std::sync::Arc;

use tracing::{debug, error, info, warn};

use murmur_db::Database;
use murmur_db::queries::NewMessage;
use murmur_types::events::{ClientEvent, NewMessagePayload, ServerEvent};
use murmur_types::token::DemoClaims;

use crate::dispatcher::{ConnId, Dispatcher};

/// Everything an event handler needs to know about the connection it runs for.
#[derive(Clone)]
pub struct Session {
    pub conn_id: ConnId,
    pub user: DemoClaims,
    pub dispatcher: Dispatcher,
    pub db: Arc<Database>,
}

/// Parse and handle one text frame. Malformed frames are answered with an
/// `error` event to this connection and otherwise ignored.
pub async fn handle_frame(session: &Session, text: &str) {
    match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => handle_event(session, event).await,
        Err(e) => {
            warn!(
                "{} ({}) bad event: {} -- raw: {}",
                session.user.name,
                session.user.id,
                e,
                truncate(text, 200)
            );
            session
                .dispatcher
                .send_to(session.conn_id, ServerEvent::error("malformed event"))
                .await;
        }
    }
}

pub async fn handle_event(session: &Session, event: ClientEvent) {
    let user = &session.user;
    match event {
        ClientEvent::JoinChannel(channel_id) => {
            session.dispatcher.join(session.conn_id, channel_id).await;
            info!("{} ({}) joined channel {}", user.name, user.id, channel_id);
        }

        ClientEvent::LeaveChannel(channel_id) => {
            match session.dispatcher.leave(session.conn_id, channel_id).await {
                Some(_) => info!("{} ({}) left channel {}", user.name, user.id, channel_id),
                None => debug!(
                    "{} ({}) left channel {} without joining it",
                    user.name, user.id, channel_id
                ),
            }
        }

        ClientEvent::Typing(payload) => {
            session
                .dispatcher
                .typing(session.conn_id, payload.channel_id, payload.is_typing)
                .await;
        }

        ClientEvent::MessageNew(payload) => create_message(session, payload).await,
    }
}

async fn create_message(session: &Session, payload: NewMessagePayload) {
    let channel_id = payload.channel_id;
    let new = NewMessage {
        channel_id,
        sender_id: session.user.id,
        body: payload.body,
        media_url: payload.media_url,
        parent_id: payload.parent_id,
    };

    let result = murmur_db::blocking(session.db.clone(), move |db| db.insert_message(&new)).await;

    match result {
        Ok(message) => {
            let delivered = session
                .dispatcher
                .broadcast_to_room(channel_id, ServerEvent::MessageCreated(message))
                .await;
            debug!("Message in {} delivered to {} connections", channel_id, delivered);
        }
        Err(e) => {
            error!(
                "failed to create message for {} in {}: {:#}",
                session.user.id, channel_id, e
            );
            session
                .dispatcher
                .send_to(session.conn_id, ServerEvent::error("failed to create message"))
                .await;
        }
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
