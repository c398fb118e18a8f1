//! Chat inspection CLI commands: history, unread.

use anyhow::{Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use artspace_types::chat::{ChatMessage, Page, UserId};

use crate::state::AppState;

/// Longest body shown in a table cell before truncation.
const PREVIEW_CHARS: usize = 60;

/// Print one page of the conversation between two users.
pub async fn show_history(
    state: &AppState,
    user_a: UserId,
    user_b: UserId,
    skip: u32,
    take: Option<u32>,
    json: bool,
) -> Result<()> {
    let limits = &state.config.chat;
    let take = take.unwrap_or(limits.default_page_size);
    if take == 0 || take > limits.max_page_size {
        bail!("--take must be between 1 and {}", limits.max_page_size);
    }

    let messages = state
        .chat_hub
        .service()
        .get_chat_history(user_a, user_b, Page::new(skip, take))
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!();
        println!(
            "  {} No messages between users {} and {}",
            style("i").blue().bold(),
            style(user_a).bold(),
            style(user_b).bold()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Id").fg(Color::White),
        Cell::new("From").fg(Color::White),
        Cell::new("To").fg(Color::White),
        Cell::new("Message").fg(Color::White),
        Cell::new("Sent").fg(Color::White),
        Cell::new("Read").fg(Color::White),
    ]);

    for message in &messages {
        table.add_row(vec![
            Cell::new(message.id).fg(Color::DarkGrey),
            Cell::new(message.sender_id).fg(Color::Cyan),
            Cell::new(message.receiver_id).fg(Color::Cyan),
            Cell::new(preview(&message.body)),
            Cell::new(message.sent_at.format("%Y-%m-%d %H:%M:%S").to_string()).fg(Color::DarkGrey),
            read_cell(message),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} message{} (skip {skip}, take {take})",
        style(messages.len()).bold(),
        if messages.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Print how many messages addressed to `user_id` are still unread.
pub async fn show_unread(state: &AppState, user_id: UserId, json: bool) -> Result<()> {
    let unread = state.chat_hub.service().unread_count(user_id).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "user_id": user_id, "unread": unread })
        );
    } else {
        let count = if unread == 0 {
            style(unread).green()
        } else {
            style(unread).yellow().bold()
        };
        println!(
            "  User {} has {count} unread message{}",
            style(user_id).bold(),
            if unread == 1 { "" } else { "s" }
        );
    }

    Ok(())
}

fn read_cell(message: &ChatMessage) -> Cell {
    match message.read_at {
        Some(read_at) => Cell::new(read_at.format("%Y-%m-%d %H:%M").to_string()).fg(Color::Green),
        None => Cell::new("unread").fg(Color::Yellow),
    }
}

fn preview(body: &str) -> String {
    let flat = body.replace('\n', " ");
    if flat.chars().count() <= PREVIEW_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(PREVIEW_CHARS - 1).collect();
    format!("{cut}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_keeps_short_bodies() {
        assert_eq!(preview("hello\nthere"), "hello there");
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let body = "é".repeat(PREVIEW_CHARS + 5);
        let shown = preview(&body);
        assert_eq!(shown.chars().count(), PREVIEW_CHARS);
        assert!(shown.ends_with('…'));
    }

    #[tokio::test]
    async fn history_rejects_oversized_take() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::init_in(dir.path().to_path_buf()).await.unwrap();
        let result = show_history(&state, UserId(1), UserId(2), 0, Some(10_000), true).await;
        assert!(result.is_err());
    }
}
