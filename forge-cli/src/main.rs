//! CLI entry point for adventure-forge

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::{Confirm, Input, Password};
use forge_core::config::{validate_config, Config, ConfigLoader, StorageBackend};
use forge_core::logging::init_logging;
use forge_core::session::open_store;
use forge_core::utils::mask_secret;
use forge_engine::SessionEngine;
use forge_providers::OpenAiClient;
use forge_server::{run_server, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};

mod console_menu;
mod play;

#[derive(Parser)]
#[command(name = "adventure-forge")]
#[command(about = "An LLM game master for text role-playing adventures")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,

    /// Keep sessions in memory only, whatever the configured store
    #[arg(long, global = true)]
    ephemeral: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write an initial configuration file
    Init,
    /// Run the HTTP server
    Serve {
        /// Address to bind (defaults to server.host)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Menu-driven console that issues requests like the HTTP front end
    Console,
    /// Play one adventure in the terminal
    Play {
        /// Genre of the adventure; prompted for when omitted
        #[arg(short, long)]
        genre: Option<String>,
    },
    /// Show the resolved configuration
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let config_loader = if let Some(dir) = cli.config_dir {
        ConfigLoader::with_dir(dir)
    } else {
        ConfigLoader::new()
    };

    match cli.command {
        Commands::Init => return run_init(&config_loader),
        Commands::Status => return run_status(&config_loader, cli.ephemeral),
        _ => {}
    }

    let config = load_config(&config_loader, cli.ephemeral)?;
    let _log_guard = init_logging(&config.logging);
    let engine = build_engine(&config)?;

    match cli.command {
        Commands::Serve { host, port } => {
            info!("Starting server");
            run_serve(&config, engine, host, port).await?;
        }
        Commands::Console => {
            info!("Starting console");
            console_menu::run_console(&engine).await?;
        }
        Commands::Play { genre } => {
            info!("Starting play session");
            play::run_play(&engine, genre).await?;
        }
        Commands::Init | Commands::Status => {}
    }

    Ok(())
}

/// Load configuration, apply command line overrides, then validate
fn load_config(loader: &ConfigLoader, ephemeral: bool) -> Result<Config> {
    let mut config = loader
        .load_unvalidated()
        .with_context(|| format!("Failed to load {}", loader.config_path().display()))?;
    if ephemeral {
        config.storage.backend = StorageBackend::Memory;
    }
    validate_config(&config).context("Invalid configuration")?;
    Ok(config)
}

fn build_engine(config: &Config) -> Result<SessionEngine> {
    let store = open_store(&config.storage).context("Failed to open session store")?;
    let client = Arc::new(
        OpenAiClient::new(&config.providers).context("Failed to build completion client")?,
    );
    Ok(SessionEngine::from_config(&config.engine, client, store))
}

async fn run_serve(
    config: &Config,
    engine: SessionEngine,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr = tokio::net::lookup_host((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to resolve {}:{}", host, port))?
        .next()
        .with_context(|| format!("No address found for {}:{}", host, port))?;

    println!("{}", style("Starting Adventure Forge server...").bold().cyan());
    println!("Model: {}", config.providers.model);
    println!("Session store: {}", config.storage.backend);
    println!("Listening on: http://{}", addr);
    println!("\n{}", style("Press Ctrl+C to stop.").green());

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
        let _ = shutdown_tx.send(());
    });

    run_server(AppState::new(engine), addr, shutdown_rx).await?;

    println!("{}", style("Server stopped.").green());
    Ok(())
}

fn run_init(loader: &ConfigLoader) -> Result<()> {
    println!("{}", style("Welcome to Adventure Forge!").bold().cyan());
    println!();

    let config_path = loader.config_path();
    if config_path.exists() {
        let overwrite = Confirm::new()
            .with_prompt(format!("{} exists. Overwrite?", config_path.display()))
            .default(false)
            .interact()?;
        if !overwrite {
            println!("Keeping the existing configuration.");
            return Ok(());
        }
    }

    let mut config = loader.load_unvalidated().unwrap_or_default();

    config.providers.api_key = Password::new()
        .with_prompt("OpenAI-compatible API key")
        .allow_empty_password(true)
        .interact()?;
    config.providers.api_base = Input::new()
        .with_prompt("API base URL")
        .default(config.providers.api_base.clone())
        .interact_text()?;
    config.providers.model = Input::new()
        .with_prompt("Model")
        .default(config.providers.model.clone())
        .interact_text()?;

    loader.save(&config)?;

    println!(
        "\n{}",
        style("Configuration saved successfully!").green().bold()
    );
    println!("  {}", config_path.display());
    println!("\nNext steps:");
    println!("  {} - Play in the terminal", style("adventure-forge play").cyan());
    println!("  {} - Run the HTTP server", style("adventure-forge serve").cyan());
    Ok(())
}

fn run_status(loader: &ConfigLoader, ephemeral: bool) -> Result<()> {
    let mut config = loader.load_unvalidated()?;
    if ephemeral {
        config.storage.backend = StorageBackend::Memory;
    }

    println!("{}", style("Adventure Forge Status").bold().cyan());
    println!("Version: {}\n", env!("CARGO_PKG_VERSION"));

    println!("{}", style("Configuration:").bold());
    println!("  Config directory: {}", loader.config_dir().display());
    let file_state = if loader.config_path().exists() {
        style("present").green()
    } else {
        style("not found, using defaults").dim()
    };
    println!("  Config file: {}", file_state);
    println!();

    println!("{}", style("Provider:").bold());
    let key_state = if config.providers.api_key.is_empty() {
        style("not configured".to_string()).red()
    } else {
        style(mask_secret(&config.providers.api_key)).green()
    };
    println!("  API key: {}", key_state);
    println!("  API base: {}", config.providers.api_base);
    println!("  Model: {}", config.providers.model);
    println!("  Temperature: {}", config.providers.temperature);
    println!("  Max tokens: {}", config.providers.max_tokens);
    match config.providers.request_timeout_secs {
        Some(secs) => println!("  Request timeout: {}s", secs),
        None => println!("  Request timeout: {}", style("none").dim()),
    }
    println!();

    println!("{}", style("Session store:").bold());
    println!("  Backend: {}", config.storage.backend);
    if config.storage.backend != StorageBackend::Memory {
        println!("  URI: {}", config.storage.uri);
        println!("  Database: {}", config.storage.database);
        println!("  Collection: {}", config.storage.collection);
    }
    match config.engine.history_window {
        Some(window) => println!("  History window: last {} messages", window),
        None => println!("  History window: {}", style("full history").dim()),
    }
    println!(
        "  Serialized turns: {}",
        if config.engine.serialize_sessions { "yes" } else { "no" }
    );
    println!();

    println!("{}", style("Server:").bold());
    println!("  Address: {}:{}", config.server.host, config.server.port);
    println!();

    match validate_config(&config) {
        Ok(()) => println!("{}", style("Configuration is valid.").green()),
        Err(e) => println!("{} {}", style("Configuration is invalid:").red().bold(), e),
    }

    Ok(())
}
