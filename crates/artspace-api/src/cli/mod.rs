//! CLI command definitions for the `artspace` binary.
//!
//! Uses clap derive macros for argument parsing. `serve` runs the HTTP API
//! and realtime hub; the other commands work directly against the data
//! directory for operators and local development.

pub mod chat;
pub mod token;

use clap::{Parser, Subcommand};

use artspace_types::chat::UserId;

/// Private messaging backend for the Artspace platform.
#[derive(Parser)]
#[command(name = "artspace", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API and realtime chat hub.
    Serve {
        /// Port to listen on (defaults to `server.port` in config.toml).
        #[arg(long, short)]
        port: Option<u16>,

        /// Host address to bind to (defaults to `server.host` in config.toml).
        #[arg(long)]
        host: Option<String>,
    },

    /// Manage access tokens.
    Token {
        #[command(subcommand)]
        action: TokenCommand,
    },

    /// Show the conversation between two users, oldest first.
    History {
        /// First participant.
        user_a: UserId,

        /// Second participant.
        user_b: UserId,

        /// Number of messages to skip from the oldest.
        #[arg(long, default_value_t = 0)]
        skip: u32,

        /// Maximum messages to show (defaults to `chat.default_page_size`).
        #[arg(long)]
        take: Option<u32>,
    },

    /// Count unread messages addressed to a user.
    Unread {
        /// Receiving user.
        user_id: UserId,
    },
}

#[derive(Subcommand)]
pub enum TokenCommand {
    /// Issue a signed access token for a user.
    Issue {
        /// User id placed in the token's `sub` claim.
        #[arg(long)]
        user_id: UserId,

        /// Lifetime in hours (defaults to `auth.token_ttl_hours`).
        #[arg(long)]
        ttl_hours: Option<u32>,
    },
}
