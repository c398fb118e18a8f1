//! Caller identity resolution.
//!
//! Every entry point (REST extractor, realtime hub invocation) obtains the
//! caller's user id through [`resolve_user_id`], so the claim lookup and
//! its failure mode live in exactly one place.

use artspace_types::chat::UserId;
use artspace_types::error::ChatError;
use artspace_types::identity::{NAME_IDENTIFIER_CLAIM, SecurityContext};

/// Extract the numeric user id from the caller's verified claims.
///
/// Fails with `Unauthenticated` when the name-identifier claim is absent or
/// is not an integer. Pure function of the context.
pub fn resolve_user_id(context: &SecurityContext) -> Result<UserId, ChatError> {
    let raw = context.claim(NAME_IDENTIFIER_CLAIM).ok_or_else(|| {
        ChatError::Unauthenticated("missing user identifier claim".to_string())
    })?;

    raw.parse::<UserId>().map_err(|_| {
        ChatError::Unauthenticated(format!("user identifier claim is not an integer: '{raw}'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_integer_claim() {
        let ctx = SecurityContext::anonymous().with_claim(NAME_IDENTIFIER_CLAIM, "42");
        assert_eq!(resolve_user_id(&ctx).unwrap(), UserId(42));
    }

    #[test]
    fn missing_claim_is_unauthenticated() {
        let err = resolve_user_id(&SecurityContext::anonymous()).unwrap_err();
        assert!(matches!(err, ChatError::Unauthenticated(_)));
    }

    #[test]
    fn non_integer_claim_is_unauthenticated() {
        let ctx = SecurityContext::anonymous().with_claim(NAME_IDENTIFIER_CLAIM, "alice");
        let err = resolve_user_id(&ctx).unwrap_err();
        assert!(matches!(err, ChatError::Unauthenticated(_)));
        assert!(err.to_string().contains("alice"));
    }
}
