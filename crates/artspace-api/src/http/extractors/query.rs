//! Query parameter extractors for list endpoints.

use serde::Deserialize;

/// Query parameters for the chat history endpoint.
///
/// Both fields are optional; the hub applies `skip = 0` and the configured
/// default page size. Signed so that negative input reaches validation and
/// is reported as a bad request rather than a parse failure.
#[derive(Debug, Deserialize, Default)]
pub struct HistoryQuery {
    /// Number of messages to skip from the oldest.
    pub skip: Option<i64>,
    /// Maximum messages to return.
    pub take: Option<i64>,
}
