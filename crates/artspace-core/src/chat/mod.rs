//! Private chat: persistence port, service and realtime hub.
//!
//! `MessageStore` is implemented by the infrastructure layer; `ChatService`
//! wraps it, and `ChatHub` adds connection-addressed delivery on top.

pub mod hub;
pub mod memory;
pub mod repository;
pub mod service;
