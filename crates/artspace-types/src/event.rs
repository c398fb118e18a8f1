//! Frames pushed from the server to realtime chat clients.
//!
//! `ChatEvent` is the unified server-to-client frame type. Push events
//! (`ReceiveMessage`, `MessageSent`, `MessageRead`) travel through the
//! presence registry; the remaining variants are direct replies to a
//! client invocation. All variants are Clone + Send for use with tokio
//! channels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::{ChatMessage, MessageId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A new message addressed to this connection's user.
    ReceiveMessage { message: ChatMessage },

    /// Acknowledgement to the sending connection, carrying the persisted record.
    MessageSent { message: ChatMessage },

    /// The receiver has read a message this user sent.
    MessageRead {
        message_id: MessageId,
        reader_id: UserId,
        read_at: DateTime<Utc>,
    },

    /// A page of conversation history, oldest first.
    ChatHistory { messages: Vec<ChatMessage> },

    /// The invocation completed with nothing further to report.
    Ack,

    /// The invocation failed.
    Error { code: String, message: String },

    /// Reply to a client keep-alive ping.
    Pong,
}
