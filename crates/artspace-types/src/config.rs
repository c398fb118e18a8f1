//! Global configuration types for Artspace messaging.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls the
//! listening address, chat limits and access token settings.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the messaging service.
///
/// Loaded from `~/.artspace/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory of a built single-page frontend served for unknown paths.
    #[serde(default)]
    pub web_dir: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            web_dir: None,
        }
    }
}

/// Limits applied to chat requests at the transport boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// History page size when the caller does not specify one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Largest history page a caller may request.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Maximum message body length, in characters.
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
}

fn default_page_size() -> u32 {
    50
}

fn default_max_page_size() -> u32 {
    200
}

fn default_max_message_length() -> usize {
    4000
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            max_message_length: default_max_message_length(),
        }
    }
}

/// Access token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared HMAC secret. When absent, `token.key` in the data dir is used.
    #[serde(default)]
    pub token_secret: Option<String>,

    /// Lifetime of tokens minted by `artspace token issue`.
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u32,
}

fn default_token_ttl_hours() -> u32 {
    24
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: None,
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}
