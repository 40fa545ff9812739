use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use parley::chat;
use parley::constants;
use parley::llm_interaction::{CompletionClient, UpstreamConfig};
use parley::web_server;
use parley::{ControllerConfig, ConversationController, FileStorage, HttpGateway, Session};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

// Define the available subcommands
#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the completion gateway that answers POST /api/chat.
    Serve {
        #[arg(long, default_value_t = constants::DEFAULT_SERVER_PORT, help = "Port for the gateway server.")]
        port: u16,
        #[arg(long, help = "Model identifier sent upstream.")]
        model: Option<String>,
        #[arg(long, help = "Base URL of the OpenAI-compatible API.")]
        api_base: Option<String>,
    },
    /// Chat with the assistant in the terminal.
    Chat {
        #[arg(long, env = "PARLEY_GATEWAY_URL", help = "Gateway endpoint to post messages to.")]
        gateway_url: Option<String>,
        #[arg(long, env = "PARLEY_HISTORY_DIR", help = "Directory holding the saved conversation.")]
        history_dir: Option<PathBuf>,
        #[arg(long, help = "Do not load or save the conversation.")]
        no_persist: bool,
        #[arg(
            long,
            default_value_t = constants::DEFAULT_REQUEST_TIMEOUT.as_secs(),
            value_parser = clap::value_parser!(u64).range(1..),
            help = "Seconds to wait for a reply (at least 1)."
        )]
        timeout_secs: u64,
    },
    /// Print the saved conversation.
    History {
        #[arg(long, env = "PARLEY_HISTORY_DIR")]
        history_dir: Option<PathBuf>,
    },
    /// Erase the saved conversation.
    Clear {
        #[arg(long, env = "PARLEY_HISTORY_DIR")]
        history_dir: Option<PathBuf>,
    },
}

fn history_storage(history_dir: Option<PathBuf>) -> FileStorage {
    FileStorage::new(history_dir.unwrap_or_else(|| PathBuf::from(constants::HISTORY_DIR.as_str())))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for environment variables like API keys)
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG environment variable (e.g., RUST_LOG=info,parley=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("parley starting with command: {:?}", cli.command);

    match cli.command {
        Commands::Serve {
            port,
            model,
            api_base,
        } => {
            let mut config = UpstreamConfig::default();
            if let Some(model) = model {
                config.model = model;
            }
            if let Some(api_base) = api_base {
                config.api_base = api_base;
            }
            if config.api_key.is_empty() {
                error!("OPENAI_API_KEY is not set; upstream requests will be rejected");
            }

            let server = web_server::start_web_server(port, CompletionClient::new(config));
            tokio::select! {
                res = server => res.context("Gateway server failed")?,
                _ = tokio::signal::ctrl_c() => info!("Ctrl-C received, shutting down"),
            }
        }
        Commands::Chat {
            gateway_url,
            history_dir,
            no_persist,
            timeout_secs,
        } => {
            let session = if no_persist {
                Session::new()
            } else {
                let storage = history_storage(history_dir);
                info!(history_dir = %storage.dir().display(), "Loading saved conversation");
                Session::with_storage(Box::new(storage))
            };
            let gateway = HttpGateway::new(gateway_url.unwrap_or_else(|| constants::GATEWAY_URL.clone()));
            info!(gateway_url = gateway.url(), "Starting interactive chat session");

            let controller = ConversationController::with_config(
                session,
                Arc::new(gateway),
                ControllerConfig {
                    timeout: Duration::from_secs(timeout_secs),
                },
            );
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            chat::run_chat(&controller, stdin, &mut std::io::stdout())
                .await
                .context("Chat session failed")?;
        }
        Commands::History { history_dir } => {
            let session = Session::with_storage(Box::new(history_storage(history_dir)));
            if session.messages().is_empty() {
                println!("No saved conversation.");
            }
            for message in session.messages() {
                println!("{}", chat::render_message(message));
            }
        }
        Commands::Clear { history_dir } => {
            let mut session = Session::with_storage(Box::new(history_storage(history_dir)));
            // A freshly loaded session is idle, so this cannot be refused.
            if session.clear().is_ok() {
                println!("Conversation cleared.");
            }
        }
    }

    Ok(())
}
