//! Chat business logic and store trait definitions for Artspace.
//!
//! This crate defines the "ports" (store traits) that the infrastructure
//! layer implements, the chat service, the presence registry and the
//! transport-agnostic realtime hub. It depends only on `artspace-types` --
//! never on `artspace-infra` or any database/IO crate.

pub mod chat;
pub mod identity;
pub mod presence;
