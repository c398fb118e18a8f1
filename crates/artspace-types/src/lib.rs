//! Shared domain types for Artspace messaging.
//!
//! This crate contains the core domain types used across the messaging
//! subsystem: chat messages, user/message identifiers, realtime events,
//! the caller security context, configuration, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod event;
pub mod identity;
