//! Artspace chat CLI and server entry point.
//!
//! Binary name: `artspace`
//!
//! Parses CLI arguments, initializes tracing, the database and services,
//! then dispatches to the appropriate command handler or starts the REST
//! API and realtime hub.

mod cli;
mod http;
mod state;

use clap::Parser;

use cli::{Cli, Commands, TokenCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity; RUST_LOG wins when set
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn,artspace=info",
        1 => "info,artspace=debug",
        _ => "trace",
    };
    artspace_observe::tracing_setup::init_tracing(cli.otel, filter)
        .map_err(|e| anyhow::anyhow!(e))?;

    let result = run(cli).await;

    artspace_observe::tracing_setup::shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Initialize application state (config, DB, token secret, hub)
    let state = AppState::init().await?;

    match cli.command {
        Commands::Serve { port, host } => {
            let host = host.unwrap_or_else(|| state.config.server.host.clone());
            let port = port.unwrap_or(state.config.server.port);
            serve(state, &host, port, cli.quiet).await?;
        }

        Commands::Token { action } => match action {
            TokenCommand::Issue { user_id, ttl_hours } => {
                cli::token::issue_token(&state, user_id, ttl_hours, cli.json)?;
            }
        },

        Commands::History {
            user_a,
            user_b,
            skip,
            take,
        } => {
            cli::chat::show_history(&state, user_a, user_b, skip, take, cli.json).await?;
        }

        Commands::Unread { user_id } => {
            cli::chat::show_unread(&state, user_id, cli.json).await?;
        }
    }

    Ok(())
}

async fn serve(state: AppState, host: &str, port: u16, quiet: bool) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(%addr, data_dir = %state.data_dir.display(), "Artspace chat listening");
    if !quiet {
        println!(
            "  {} Artspace chat listening on {}",
            console::style("⚡").bold(),
            console::style(format!("http://{addr}")).cyan()
        );
        println!(
            "  {} {}",
            console::style("Realtime hub:").dim(),
            console::style(format!("ws://{addr}/hub/chat")).cyan()
        );
        println!("  {}", console::style("Press Ctrl+C to stop").dim());
    }

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if !quiet {
        println!("\n  Server stopped.");
    }
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
