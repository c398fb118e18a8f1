//! Chat service wrapping the message store.
//!
//! ChatService is the sole mutator of persisted chat messages. It performs
//! no business validation of its own: store errors propagate unchanged and
//! there is no retry policy.

use artspace_types::chat::{ChatMessage, MessageId, Page, UserId};
use artspace_types::error::RepositoryError;
use tracing::{debug, info};

use crate::chat::repository::{MarkReadOutcome, MessageStore};

/// Application-level chat API.
///
/// Generic over `MessageStore` to maintain clean architecture
/// (artspace-core never depends on artspace-infra).
pub struct ChatService<S: MessageStore> {
    store: S,
}

impl<S: MessageStore> ChatService<S> {
    /// Create a new chat service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Persist a message from `sender_id` to `receiver_id`.
    pub async fn send_message(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        body: &str,
    ) -> Result<ChatMessage, RepositoryError> {
        let message = self.store.persist(sender_id, receiver_id, body).await?;
        info!(
            message_id = %message.id,
            sender_id = %sender_id,
            receiver_id = %receiver_id,
            "Chat message persisted"
        );
        Ok(message)
    }

    /// Mark a message as read on behalf of `user_id`.
    pub async fn mark_as_read(
        &self,
        message_id: MessageId,
        user_id: UserId,
    ) -> Result<MarkReadOutcome, RepositoryError> {
        let outcome = self.store.mark_read(message_id, user_id).await?;
        if outcome.newly_read {
            info!(message_id = %message_id, reader_id = %user_id, "Chat message marked read");
        } else {
            debug!(message_id = %message_id, reader_id = %user_id, "Chat message already read");
        }
        Ok(outcome)
    }

    /// Conversation between `user_id` and `other_user_id`, oldest first.
    pub async fn get_chat_history(
        &self,
        user_id: UserId,
        other_user_id: UserId,
        page: Page,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        self.store.history(user_id, other_user_id, page).await
    }

    /// Number of unread messages addressed to `user_id`.
    pub async fn unread_count(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        self.store.unread_count(user_id).await
    }
}
