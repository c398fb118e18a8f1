//! HTTP request handlers for the REST API and the realtime hub.

pub mod chat;
pub mod ws;
