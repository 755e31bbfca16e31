//! notifyd — desktop notification daemon CLI.
//!
//! `notifyd run` is the daemon; the remaining commands are bus clients for
//! scripting and for wiring a renderer's buttons back to the daemon.

use clap::Parser;

// CLI definitions
mod cli;
use cli::{Cli, Commands};

// Command handlers (split from main.rs)
mod commands;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        // Default: run the daemon
        None => {
            init_tracing();
            commands::serve::run(cli.config, None).await?;
        }
        Some(Commands::Run { state_file }) => {
            init_tracing();
            commands::serve::run(cli.config, state_file).await?;
        }

        Some(Commands::Send {
            summary,
            body,
            app_name,
            icon,
            urgency,
            timeout,
            replaces,
            actions,
        }) => {
            commands::client::send(
                &summary,
                &body,
                &app_name,
                &icon,
                urgency.hint_byte(),
                timeout,
                replaces,
                &actions,
            )
            .await?;
        }
        Some(Commands::Close { id }) => {
            commands::client::close(id).await?;
        }
        Some(Commands::Dismiss { id }) => {
            commands::client::dismiss(id).await?;
        }
        Some(Commands::Action { id, key }) => {
            commands::client::action(id, &key).await?;
        }
        Some(Commands::List { state_file }) => {
            commands::client::list(state_file)?;
        }
        Some(Commands::Info) => {
            commands::client::info().await?;
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("notifyd=info".parse().unwrap()),
        )
        .init();
}
