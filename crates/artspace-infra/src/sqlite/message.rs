//! SQLite message store implementation.
//!
//! Implements `MessageStore` from `artspace-core` using sqlx with split
//! read/write pools: raw queries, a private Row struct, inserts and updates
//! on the single-connection writer.

use artspace_core::chat::repository::{MarkReadOutcome, MessageStore};
use artspace_types::chat::{ChatMessage, MessageId, Page, UserId};
use artspace_types::error::RepositoryError;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `MessageStore`.
pub struct SqliteMessageStore {
    pool: DatabasePool,
}

impl SqliteMessageStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row type for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ChatMessageRow {
    id: i64,
    sender_id: i64,
    receiver_id: i64,
    body: String,
    sent_at: String,
    read_at: Option<String>,
}

impl ChatMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            sender_id: row.try_get("sender_id")?,
            receiver_id: row.try_get("receiver_id")?,
            body: row.try_get("body")?,
            sent_at: row.try_get("sent_at")?,
            read_at: row.try_get("read_at")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let sent_at = parse_datetime(&self.sent_at)?;
        let read_at = self.read_at.as_deref().map(parse_datetime).transpose()?;

        Ok(ChatMessage {
            id: MessageId(self.id),
            sender_id: UserId(self.sender_id),
            receiver_id: UserId(self.receiver_id),
            body: self.body,
            sent_at,
            read_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn map_rows(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<ChatMessage>, RepositoryError> {
    let mut messages = Vec::with_capacity(rows.len());
    for row in rows {
        let msg_row =
            ChatMessageRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
        messages.push(msg_row.into_message()?);
    }
    Ok(messages)
}

// ---------------------------------------------------------------------------
// MessageStore implementation
// ---------------------------------------------------------------------------

impl MessageStore for SqliteMessageStore {
    async fn persist(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        body: &str,
    ) -> Result<ChatMessage, RepositoryError> {
        let sent_at = Utc::now();

        let result = sqlx::query(
            r#"INSERT INTO chat_messages (sender_id, receiver_id, body, sent_at, read_at)
               VALUES (?, ?, ?, ?, NULL)"#,
        )
        .bind(sender_id.0)
        .bind(receiver_id.0)
        .bind(body)
        .bind(format_datetime(&sent_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        // Round-trip through the stored text so the returned timestamp
        // matches what history queries will return.
        let sent_at = parse_datetime(&format_datetime(&sent_at))?;

        Ok(ChatMessage {
            id: MessageId(result.last_insert_rowid()),
            sender_id,
            receiver_id,
            body: body.to_string(),
            sent_at,
            read_at: None,
        })
    }

    async fn mark_read(
        &self,
        message_id: MessageId,
        reader_id: UserId,
    ) -> Result<MarkReadOutcome, RepositoryError> {
        // Conditional update: only the first reader call moves read_at.
        let result = sqlx::query(
            "UPDATE chat_messages SET read_at = ? WHERE id = ? AND receiver_id = ? AND read_at IS NULL",
        )
        .bind(format_datetime(&Utc::now()))
        .bind(message_id.0)
        .bind(reader_id.0)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let newly_read = result.rows_affected() == 1;

        // Read back on the writer so the update is always visible.
        let row = sqlx::query("SELECT * FROM chat_messages WHERE id = ?")
            .bind(message_id.0)
            .fetch_optional(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .ok_or(RepositoryError::NotFound)?;

        let message = ChatMessageRow::from_row(&row)
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .into_message()?;

        if message.receiver_id != reader_id {
            return Err(RepositoryError::Forbidden(format!(
                "user {reader_id} is not the receiver of message {message_id}"
            )));
        }

        Ok(MarkReadOutcome {
            message,
            newly_read,
        })
    }

    async fn history(
        &self,
        user_a: UserId,
        user_b: UserId,
        page: Page,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT * FROM chat_messages
               WHERE (sender_id = ? AND receiver_id = ?) OR (sender_id = ? AND receiver_id = ?)
               ORDER BY sent_at ASC, id ASC
               LIMIT ? OFFSET ?"#,
        )
        .bind(user_a.0)
        .bind(user_b.0)
        .bind(user_b.0)
        .bind(user_a.0)
        .bind(i64::from(page.take))
        .bind(i64::from(page.skip))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        map_rows(&rows)
    }

    async fn get(&self, message_id: MessageId) -> Result<Option<ChatMessage>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_messages WHERE id = ?")
            .bind(message_id.0)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let msg_row = ChatMessageRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(msg_row.into_message()?))
            }
            None => Ok(None),
        }
    }

    async fn unread_count(&self, receiver_id: UserId) -> Result<u64, RepositoryError> {
        let row = sqlx::query(
            "SELECT COUNT(*) as cnt FROM chat_messages WHERE receiver_id = ? AND read_at IS NULL",
        )
        .bind(receiver_id.0)
        .fetch_one(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(count as u64)
    }
}
