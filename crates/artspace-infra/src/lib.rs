//! Infrastructure layer for Artspace messaging.
//!
//! Contains implementations of the store traits defined in `artspace-core`
//! (SQLite with split reader/writer pools), HMAC-signed access tokens, and
//! the data-directory/config loaders.

pub mod auth;
pub mod config;
pub mod sqlite;
