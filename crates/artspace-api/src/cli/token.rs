//! Access token CLI commands.

use anyhow::{Result, bail};
use console::style;

use artspace_types::chat::UserId;

use crate::state::AppState;

/// Issue a token for `user_id` signed with the data directory's secret.
///
/// ```bash
/// artspace token issue --user-id 42 --ttl-hours 2
/// ```
pub fn issue_token(
    state: &AppState,
    user_id: UserId,
    ttl_hours: Option<u32>,
    json: bool,
) -> Result<()> {
    let hours = ttl_hours.unwrap_or(state.config.auth.token_ttl_hours);
    if hours == 0 {
        bail!("token lifetime must be at least one hour");
    }

    let ttl = chrono::Duration::hours(i64::from(hours));
    let token = state.tokens.issue(user_id, ttl)?;
    let expires_at = chrono::Utc::now() + ttl;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "user_id": user_id,
                "token": token,
                "expires_at": expires_at.to_rfc3339(),
            })
        );
    } else {
        println!();
        println!(
            "  {} Token for user {} (expires {})",
            style("✓").green().bold(),
            style(user_id).bold(),
            style(expires_at.format("%Y-%m-%d %H:%M UTC")).dim()
        );
        println!();
        println!("  {}", style(&token).yellow());
        println!();
    }

    Ok(())
}
