//! Authenticated caller context.
//!
//! A `SecurityContext` is the verified claim set attached to a request or a
//! realtime connection once its access token has been checked. It carries no
//! behaviour of its own; identity resolution lives in `artspace-core`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Claim type holding the caller's numeric user identifier.
pub const NAME_IDENTIFIER_CLAIM: &str = "sub";

/// Claim type holding the token expiry (unix seconds).
pub const EXPIRY_CLAIM: &str = "exp";

/// Verified claims of an authenticated caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityContext {
    claims: HashMap<String, String>,
}

impl SecurityContext {
    /// A context with no claims (anonymous caller).
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn from_claims(claims: HashMap<String, String>) -> Self {
        Self { claims }
    }

    /// Builder-style helper for adding a claim.
    pub fn with_claim(mut self, claim_type: &str, value: impl Into<String>) -> Self {
        self.claims.insert(claim_type.to_string(), value.into());
        self
    }

    /// Look up a claim value by type.
    pub fn claim(&self, claim_type: &str) -> Option<&str> {
        self.claims.get(claim_type).map(String::as_str)
    }
}
