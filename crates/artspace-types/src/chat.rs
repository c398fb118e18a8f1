//! Private chat message types for Artspace.
//!
//! These types model one-to-one conversations between platform users:
//! the persisted message record and the numeric identifiers that address
//! users and messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Numeric identifier of a platform user.
///
/// Users live in the platform's identity store; this subsystem only ever
/// references them by id. The id is also the addressing key of the
/// realtime channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// Store-generated identifier of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted private message between two users.
///
/// Immutable once stored except for `read_at`, which moves from `None` to
/// `Some` exactly once when the receiver acknowledges the message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub body: String,
    /// Server timestamp assigned when the row was persisted.
    pub sent_at: DateTime<Utc>,
    /// Set when the receiver marks the message as read.
    pub read_at: Option<DateTime<Utc>>,
}

impl ChatMessage {
    /// Whether this message belongs to the conversation between `a` and `b`
    /// (in either direction).
    pub fn is_between(&self, a: UserId, b: UserId) -> bool {
        (self.sender_id == a && self.receiver_id == b)
            || (self.sender_id == b && self.receiver_id == a)
    }
}

/// Offset pagination window for conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u32,
    pub take: u32,
}

impl Page {
    pub fn new(skip: u32, take: u32) -> Self {
        Self { skip, take }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_message() -> ChatMessage {
        ChatMessage {
            id: MessageId(7),
            sender_id: UserId(1),
            receiver_id: UserId(2),
            body: "hello".to_string(),
            sent_at: Utc::now(),
            read_at: None,
        }
    }

    #[test]
    fn test_user_id_parse() {
        let id: UserId = " 42 ".parse().unwrap();
        assert_eq!(id, UserId(42));
        assert!("abc".parse::<UserId>().is_err());
    }

    #[test]
    fn test_ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&sample_message()).unwrap();
        assert!(json.contains("\"id\":7"));
        assert!(json.contains("\"sender_id\":1"));
        assert!(json.contains("\"read_at\":null"));
    }

    #[test]
    fn test_is_between_is_symmetric() {
        let msg = sample_message();
        assert!(msg.is_between(UserId(1), UserId(2)));
        assert!(msg.is_between(UserId(2), UserId(1)));
        assert!(!msg.is_between(UserId(1), UserId(3)));
    }
}
