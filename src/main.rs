use clap::Parser;

mod activities;
mod activity_input;
mod app;
mod cli;
mod config;
mod errors;
mod focus_prompt;
mod storage;
mod suggestions;

use std::sync::Arc;

use activities::ActivityStore;
use app::AppFactory;
use config::Config;
use focus_prompt::FocusPrompt;

fn open() -> anyhow::Result<(Config, Arc<dyn ActivityStore>)> {
    let paths = AppFactory::get_paths()?;
    let config = AppFactory::create_config(&paths)?;
    let store = AppFactory::create_activity_store(&paths)?;
    Ok((config, store))
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "tempo=info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = cli::Args::parse();

    match args.command {
        cli::Command::Parse { text } => cli::handle_parse(text),

        cli::Command::Log {
            text,
            duration,
            ask_focus,
        } => {
            let (_, store) = open()?;
            cli::handle_log(text, duration, ask_focus, store, FocusPrompt::new())
        }

        cli::Command::Suggest {
            query,
            remote,
            next,
        } => {
            let (config, store) = open()?;
            cli::handle_suggest(query, remote, next, &config, store).await
        }

        cli::Command::Complete { text, pick, remote } => {
            let (config, store) = open()?;
            cli::handle_complete(text, pick, remote, &config, store).await
        }

        cli::Command::Tags {} => {
            let (_, store) = open()?;
            cli::handle_tags(store)
        }
    }
}
