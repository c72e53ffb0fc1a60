use anyhow::{Context as _, Result};
use cadence_core::error::CoreError;
use cadence_core::store::SqliteStore;
use clap::Parser;
use owo_colors::{OwoColorize, Style};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod parser;
mod util;
mod views;

use cli::{Cli, Commands};
use commands::Context;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        handle_error(e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::Config::new().context("Failed to load configuration")?;
    let today = cli.today.unwrap_or_else(|| chrono::Local::now().date_naive());
    debug!(database = %config.database_path.display(), user = %config.user, %today, "starting");

    let store = SqliteStore::open(&config.database_path, &config.user).await?;
    let ctx = Context::new(config, today);

    match cli.command {
        Commands::Add(command) => commands::add::add_task(&store, command, &ctx).await,
        Commands::Week(command) => commands::calendar::show_week(&store, command, &ctx).await,
        Commands::Month(command) => commands::calendar::show_month(&store, command, &ctx).await,
        Commands::Agenda(command) => commands::calendar::show_agenda(&store, command, &ctx).await,
        Commands::List(command) => commands::list::show_board(&store, command, &ctx).await,
        Commands::Done(command) => commands::occurrence::set_done(&store, command, &ctx, true).await,
        Commands::Undo(command) => commands::occurrence::set_done(&store, command, &ctx, false).await,
        Commands::Skip(command) => commands::occurrence::skip(&store, command, &ctx).await,
        Commands::Delete(command) => commands::occurrence::delete(&store, command).await,
        Commands::Edit(command) => commands::edit::edit_task(&store, command, &ctx).await,
        Commands::Recur(command) => {
            commands::recurrence::recurrence_command(&store, command, &ctx).await
        }
        Commands::Lists(command) => commands::lists::lists_command(&store, command).await,
    }
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    match err.downcast_ref::<CoreError>() {
        Some(CoreError::NotFound(s)) => {
            eprintln!("{} {}", "Error:".style(error_style), s);
        }
        Some(CoreError::AmbiguousId(tasks)) => {
            eprintln!("{}", "Error: Ambiguous ID.".style(error_style));
            eprintln!("Did you mean one of these?");
            for (id, title) in tasks {
                eprintln!("  {} ({})", id.yellow(), title);
            }
        }
        Some(CoreError::InvalidInput(s)) => {
            eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
        }
        Some(CoreError::InvalidRule(s)) => {
            eprintln!("{} Invalid recurrence: {}", "Error:".style(error_style), s);
        }
        Some(CoreError::InvalidDate(s)) => {
            eprintln!("{} Invalid date: {}", "Error:".style(error_style), s);
        }
        Some(CoreError::StoreUnavailable(s)) => {
            eprintln!("{} Cannot open the task store: {}", "Error:".style(error_style), s);
        }
        _ => eprintln!("{} {:#}", "Error:".style(error_style), err),
    }
}
