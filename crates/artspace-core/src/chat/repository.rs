//! MessageStore trait definition.
//!
//! Persistence port for private chat messages. Follows the RPITIT pattern
//! (native async fn in traits, Rust 2024 edition).

use artspace_types::chat::{ChatMessage, MessageId, Page, UserId};
use artspace_types::error::RepositoryError;

/// Result of a mark-as-read request.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkReadOutcome {
    /// The message as stored after the call.
    pub message: ChatMessage,
    /// True only for the call that moved the message from unread to read.
    pub newly_read: bool,
}

/// Store trait for chat message persistence.
///
/// Implementations live in artspace-infra (e.g., `SqliteMessageStore`).
/// The store exclusively owns persisted rows.
pub trait MessageStore: Send + Sync {
    /// Persist a new message, assigning its id and `sent_at` timestamp.
    fn persist(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        body: &str,
    ) -> impl std::future::Future<Output = Result<ChatMessage, RepositoryError>> + Send;

    /// Set `read_at` on a message addressed to `reader_id`.
    ///
    /// Returns `NotFound` if the message does not exist and `Forbidden` if
    /// `reader_id` is not its receiver. Already-read messages are returned
    /// unchanged with `newly_read = false`.
    fn mark_read(
        &self,
        message_id: MessageId,
        reader_id: UserId,
    ) -> impl std::future::Future<Output = Result<MarkReadOutcome, RepositoryError>> + Send;

    /// Messages exchanged between `user_a` and `user_b` in either direction,
    /// oldest first (`sent_at ASC, id ASC`).
    fn history(
        &self,
        user_a: UserId,
        user_b: UserId,
        page: Page,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// Get a single message by id.
    fn get(
        &self,
        message_id: MessageId,
    ) -> impl std::future::Future<Output = Result<Option<ChatMessage>, RepositoryError>> + Send;

    /// Count messages addressed to `receiver_id` that are still unread.
    fn unread_count(
        &self,
        receiver_id: UserId,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
