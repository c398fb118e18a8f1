//! SQLite connections for the message store.
//!
//! Every insert and read-flag update goes through `writer`, a pool of exactly
//! one connection, so concurrent `mark_read` calls serialize on SQLite's
//! write lock instead of racing. History and unread queries use `reader`,
//! whose connections are opened read-only.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

/// File name of the database inside the data directory.
const DATABASE_FILE: &str = "artspace.db";

const READER_CONNECTIONS: u32 = 8;

/// How long a statement waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open (creating if needed) `artspace.db` under `data_dir`.
    pub async fn open(data_dir: &Path) -> Result<Self, sqlx::Error> {
        Self::new(&database_url(data_dir)).await
    }

    /// Connect both pools and bring the schema up to date.
    ///
    /// The reader pool is opened after migrations so a fresh file already
    /// has `chat_messages` when the first history query arrives.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT)
            .create_if_missing(true);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options.clone())
            .await?;
        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(READER_CONNECTIONS)
            .connect_with(options.read_only(true))
            .await?;

        tracing::debug!(url = %database_url, readers = READER_CONNECTIONS, "message database open");
        Ok(Self { reader, writer })
    }
}

pub fn database_url(data_dir: &Path) -> String {
    format!("sqlite://{}?mode=rwc", data_dir.join(DATABASE_FILE).display())
}
