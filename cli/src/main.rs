use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use cmdbridge_core::{DispatchOutcome, Location, Sender};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod demo;
mod host;

use config::{AppConfig, DEFAULT_CONFIG_FILE};
use host::Server;

#[derive(Parser, PartialEq, Debug)]
#[command(name = "cmdbridge")]
#[command(about = "Console host for bridged tree-grammar commands", long_about = None)]
struct Cli {
    /// Path to the config file
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Namespace prefixed to every registered name, overriding the config
    #[arg(short = 'n', long = "namespace", env = "CMDBRIDGE_NAMESPACE")]
    namespace: Option<String>,

    /// Log at debug level
    #[arg(long = "debug", default_value_t = false)]
    debug: bool,

    /// Run commands as this player instead of the console
    #[arg(short = 'p', long = "player")]
    player: Option<String>,
}

const HELP: &str = "\
Type a command to run it (the leading prefix is optional).
  ?<buffer>          show completions, e.g. ?/greet or ?/counter a
  :help              list usage for every bridged command you can run
  :unregister <name> unregister a bridged command
  :quit              exit";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(&cli.config)?;
    if let Some(namespace) = cli.namespace {
        config.bridge.namespace = namespace;
    }

    let default_filter = if cli.debug {
        format!("info,{}=debug,cmdbridge_core=debug", env!("CARGO_CRATE_NAME"))
    } else {
        config.logging.level.clone()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut server = Server::new(config.bridge.clone())?;
    for descriptor in demo::descriptors() {
        let label = descriptor.label().to_string();
        if !server.register(descriptor) {
            tracing::warn!("'{label}' could not claim its name");
        }
    }

    let sender = match &cli.player {
        Some(name) => Sender::player(name, &config.console.world, Location::new(0.0, 64.0, 0.0)),
        None => Sender::console(),
    };
    tracing::info!(
        "Ready as {} in namespace '{}'",
        sender.name(),
        server.registry().namespace()
    );
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}", config.console.prompt);
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim_end();
        if line.trim().is_empty() {
            continue;
        }

        if let Some(buffer) = line.strip_prefix('?') {
            let suggestions = server.complete(&sender, buffer);
            if suggestions.is_empty() {
                println!("(no suggestions)");
            }
            for suggestion in &suggestions.list {
                println!("  {}", suggestion.text);
            }
            continue;
        }

        match line.split_once(' ').unwrap_or((line, "")) {
            (":quit" | ":exit", _) => break,
            (":help", _) => {
                for usage in server.help(&sender) {
                    println!("  {usage}");
                }
            }
            (":unregister", label) => {
                if server.unregister(label.trim()) {
                    println!("Unregistered '{}'", label.trim());
                } else {
                    println!("'{}' is not a bridged command", label.trim());
                }
            }
            _ => match server.execute(&sender, line) {
                DispatchOutcome::UnknownCommand => println!("Unknown command. Try :help"),
                DispatchOutcome::PermissionDenied => {}
                DispatchOutcome::Completed { success: false } => println!("Command failed"),
                DispatchOutcome::Completed { success: true } => {}
            },
        }

        for message in sender.take_messages() {
            println!("{message}");
        }
    }

    Ok(())
}
