use anyhow::Result;
use beehive_chat::logging::{self, LogTarget};
use beehive_chat::{commands, ui, Config};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "beehive-chat")]
#[command(version)]
#[command(about = "Chat with a streaming question-answering service", long_about = None)]
struct Cli {
    /// Base URL of the service (overrides the config file)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Config file to use instead of ~/.beehive/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output (to stderr for `ask`, to ~/.beehive/beehive-chat.log for the chat UI)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask one question and print the streamed answer
    Ask {
        query: String,
        /// Print the final conversation as JSON
        #[arg(long)]
        transcript: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        logging::init(&LogTarget::for_mode(cli.command.is_none()))?;
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    }
    .with_base_url(cli.base_url);

    match cli.command {
        None => ui::run(config).await,
        Some(Commands::Ask { query, transcript }) => {
            commands::ask(&config, &query, transcript).await
        }
    }
}
