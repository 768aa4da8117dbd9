use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sitekeys::app::key_editor::{key_pair_from_generated, KeyEditor};
use sitekeys::app::terminal_view::{self, TerminalView};
use sitekeys::config::Config;
use sitekeys::i18n;
use sitekeys::services::node::{FcpNode, NodeInterface};
use sitekeys::types::{KeyPair, OwnIdentity, Project};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Edit the key pair of a freesite project
#[derive(Parser, Debug)]
#[command(name = "sitekeys", version, about)]
struct Args {
    /// Path to config.json (defaults to the platform config directory)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Locale for messages (en, de, fr)
    #[arg(long)]
    locale: Option<String>,

    /// Freenet node host
    #[arg(long)]
    host: Option<String>,

    /// Freenet node FCP port
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactively edit a key pair
    Edit {
        /// Initial public (request) key
        #[arg(long, default_value = "")]
        public_key: String,

        /// Initial private (insert) key
        #[arg(long, default_value = "")]
        private_key: String,

        /// JSON file with projects to copy keys from
        #[arg(long, value_name = "FILE")]
        projects: Option<PathBuf>,

        /// JSON file with own identities to copy keys from
        #[arg(long, value_name = "FILE")]
        identities: Option<PathBuf>,

        /// Do not ask before overwriting keys with generated ones
        #[arg(long)]
        yes: bool,
    },
    /// Generate a key pair and print it
    Generate,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match args.config.clone().or_else(Config::default_path) {
        Some(path) => Config::load_or_default(&path)?,
        None => Config::default(),
    };
    if let Some(locale) = &args.locale {
        config.locale = locale.clone();
    }
    if let Some(host) = &args.host {
        config.node.host = host.clone();
    }
    if let Some(port) = args.port {
        config.node.port = port;
    }
    if !i18n::is_supported(&config.locale) {
        tracing::warn!(
            "Locale {} is not available, falling back to {}",
            config.locale,
            i18n::FALLBACK_LOCALE
        );
        config.locale = i18n::FALLBACK_LOCALE.to_string();
    }
    Ok(config)
}

fn load_list<T: serde::de::DeserializeOwned>(path: Option<&Path>) -> Result<Vec<T>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Ask the node for a key pair and reduce it to the two key bodies.
async fn generate_keys(node: &dyn NodeInterface) -> Result<KeyPair> {
    let generated = node
        .generate_key_pair()
        .await
        .context("Key pair generation failed")?;
    Ok(key_pair_from_generated(&generated)?)
}

async fn run(args: Args) -> Result<ExitCode> {
    let config = load_config(&args)?;
    let node = Arc::new(FcpNode::from_config(&config.node));
    tracing::info!("Using Freenet node at {}", node.address());

    match args.command {
        Commands::Generate => {
            let key_pair = generate_keys(&*node).await?;
            println!("{}", serde_json::to_string_pretty(&key_pair)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Edit {
            public_key,
            private_key,
            projects,
            identities,
            yes,
        } => {
            let projects: Vec<Project> = load_list(projects.as_deref())?;
            let identities: Vec<OwnIdentity> = load_list(identities.as_deref())?;

            let view = TerminalView::new(std::io::stderr(), &config.locale).with_assume_yes(yes);
            let editor = KeyEditor::open(
                KeyPair::new(public_key, private_key),
                projects,
                identities,
                node,
                view,
                &config.locale,
            );

            let lines = terminal_view::spawn_line_reader(BufReader::new(std::io::stdin()));
            let outcome = terminal_view::run(editor, lines).await;
            match outcome.key_pair {
                Some(key_pair) if !outcome.cancelled => {
                    println!("{}", serde_json::to_string_pretty(&key_pair)?);
                    Ok(ExitCode::SUCCESS)
                }
                _ => Ok(ExitCode::FAILURE),
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
