//! In-memory `MessageStore` for tests and ephemeral runs.
//!
//! Mirrors the SQLite store's semantics (id assignment, receiver check,
//! idempotent read marking, chronological history) behind a `std::sync::Mutex`.
//! The lock is never held across an await point.

use std::sync::Mutex;

use artspace_types::chat::{ChatMessage, MessageId, Page, UserId};
use artspace_types::error::RepositoryError;
use chrono::Utc;

use crate::chat::repository::{MarkReadOutcome, MessageStore};

#[derive(Default)]
pub struct InMemoryMessageStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    messages: Vec<ChatMessage>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, RepositoryError> {
        self.inner
            .lock()
            .map_err(|_| RepositoryError::Query("message store lock poisoned".to_string()))
    }
}

impl MessageStore for InMemoryMessageStore {
    async fn persist(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        body: &str,
    ) -> Result<ChatMessage, RepositoryError> {
        let mut inner = self.lock()?;
        inner.next_id += 1;
        let message = ChatMessage {
            id: MessageId(inner.next_id),
            sender_id,
            receiver_id,
            body: body.to_string(),
            sent_at: Utc::now(),
            read_at: None,
        };
        inner.messages.push(message.clone());
        Ok(message)
    }

    async fn mark_read(
        &self,
        message_id: MessageId,
        reader_id: UserId,
    ) -> Result<MarkReadOutcome, RepositoryError> {
        let mut inner = self.lock()?;
        let message = inner
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or(RepositoryError::NotFound)?;

        if message.receiver_id != reader_id {
            return Err(RepositoryError::Forbidden(format!(
                "user {reader_id} is not the receiver of message {message_id}"
            )));
        }

        let newly_read = message.read_at.is_none();
        if newly_read {
            message.read_at = Some(Utc::now());
        }

        Ok(MarkReadOutcome {
            message: message.clone(),
            newly_read,
        })
    }

    async fn history(
        &self,
        user_a: UserId,
        user_b: UserId,
        page: Page,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let inner = self.lock()?;
        let mut conversation: Vec<ChatMessage> = inner
            .messages
            .iter()
            .filter(|m| m.is_between(user_a, user_b))
            .cloned()
            .collect();
        conversation.sort_by(|a, b| a.sent_at.cmp(&b.sent_at).then(a.id.cmp(&b.id)));

        Ok(conversation
            .into_iter()
            .skip(page.skip as usize)
            .take(page.take as usize)
            .collect())
    }

    async fn get(&self, message_id: MessageId) -> Result<Option<ChatMessage>, RepositoryError> {
        let inner = self.lock()?;
        Ok(inner.messages.iter().find(|m| m.id == message_id).cloned())
    }

    async fn unread_count(&self, receiver_id: UserId) -> Result<u64, RepositoryError> {
        let inner = self.lock()?;
        Ok(inner
            .messages
            .iter()
            .filter(|m| m.receiver_id == receiver_id && m.read_at.is_none())
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let store = InMemoryMessageStore::new();
        let a = store.persist(UserId(1), UserId(2), "a").await.unwrap();
        let b = store.persist(UserId(2), UserId(1), "b").await.unwrap();
        assert_eq!(a.id, MessageId(1));
        assert_eq!(b.id, MessageId(2));
    }

    #[tokio::test]
    async fn test_mark_read_checks_receiver() {
        let store = InMemoryMessageStore::new();
        let msg = store.persist(UserId(1), UserId(2), "hi").await.unwrap();

        let err = store.mark_read(msg.id, UserId(1)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Forbidden(_)));

        let err = store.mark_read(MessageId(99), UserId(2)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }
}
