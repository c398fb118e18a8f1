//! Access token signing and verification.
//!
//! The signing secret comes from `auth.token_secret` in `config.toml` when
//! set, otherwise from `{data_dir}/token.key`, which is generated with 32
//! random bytes on first use.

pub mod token;

use std::path::Path;

use rand::RngCore;
use rand::rngs::OsRng;

pub use token::TokenAuthority;

const KEY_FILE: &str = "token.key";

/// Resolve the token signing secret.
pub async fn load_or_create_secret(
    data_dir: &Path,
    configured: Option<&str>,
) -> std::io::Result<Vec<u8>> {
    if let Some(secret) = configured.filter(|s| !s.trim().is_empty()) {
        return Ok(secret.trim().as_bytes().to_vec());
    }

    let key_path = data_dir.join(KEY_FILE);
    match tokio::fs::read_to_string(&key_path).await {
        Ok(content) if !content.trim().is_empty() => {
            return Ok(content.trim().as_bytes().to_vec());
        }
        Ok(_) => {
            tracing::warn!("{} is empty, generating a new key", key_path.display());
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }

    let mut key_bytes = [0u8; 32];
    OsRng.fill_bytes(&mut key_bytes);
    let encoded = key_bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<String>();

    tokio::fs::create_dir_all(data_dir).await?;
    tokio::fs::write(&key_path, &encoded).await?;
    tracing::info!("Generated token signing key at {}", key_path.display());

    Ok(encoded.into_bytes())
}
