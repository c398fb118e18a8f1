//! Request extractors shared by the REST handlers and the hub upgrade.

pub mod auth;
pub mod query;
