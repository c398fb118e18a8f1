//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! The chat hub is generic over its message store, but AppState pins it to
//! the SQLite implementation.

use std::path::PathBuf;
use std::sync::Arc;

use artspace_core::chat::hub::ChatHub;
use artspace_core::chat::service::ChatService;
use artspace_core::presence::PresenceRegistry;
use artspace_infra::auth::{TokenAuthority, load_or_create_secret};
use artspace_infra::config::{load_global_config, resolve_data_dir};
use artspace_infra::sqlite::message::SqliteMessageStore;
use artspace_infra::sqlite::pool::DatabasePool;
use artspace_types::config::GlobalConfig;

/// Concrete type alias for the hub generic pinned to the infra store.
pub type ConcreteChatHub = ChatHub<SqliteMessageStore>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub chat_hub: Arc<ConcreteChatHub>,
    pub tokens: Arc<TokenAuthority>,
    pub config: Arc<GlobalConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state from the resolved data directory.
    pub async fn init() -> anyhow::Result<Self> {
        Self::init_in(resolve_data_dir()).await
    }

    /// Initialize the application state rooted at `data_dir`: load config,
    /// connect to the DB, wire services.
    pub async fn init_in(data_dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_global_config(&data_dir).await;
        let db_pool = DatabasePool::open(&data_dir).await?;

        let secret = load_or_create_secret(&data_dir, config.auth.token_secret.as_deref()).await?;
        let tokens = TokenAuthority::new(secret);

        let store = SqliteMessageStore::new(db_pool);
        let chat_hub = ChatHub::new(
            ChatService::new(store),
            PresenceRegistry::new(),
            config.chat.clone(),
        );

        Ok(Self {
            chat_hub: Arc::new(chat_hub),
            tokens: Arc::new(tokens),
            config: Arc::new(config),
            data_dir,
        })
    }
}
