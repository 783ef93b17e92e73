//! Agentdeck - client runtime for operating AI agents
//!
//! Thin CLI over the session runtime: send a message, inspect a session's
//! stored history, or export the latest generated bundle as an archive.

use agentdeck::api::{AgentBackend, HttpBackend};
use agentdeck::bundle;
use agentdeck::channel::DuplexChannel;
use agentdeck::config::{AgentdeckConfig, DeliveryMode};
use agentdeck::session::SessionController;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "agentdeck")]
#[command(author = "Agentdeck Team")]
#[command(version)]
#[command(about = "Client runtime for operating AI agents")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "AGENTDECK_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a message through the session controller and print the log
    Send {
        /// Session to send into (a fresh one is created when omitted)
        #[arg(short, long)]
        session: Option<String>,

        /// Message content
        message: String,
    },

    /// Print the stored history of a session
    History {
        /// Session ID
        session: String,
    },

    /// Extract the latest generated bundle and write it as an archive
    Export {
        /// Session ID
        session: String,

        /// Output path (defaults to <slug>.zip)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("agentdeck={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = if let Some(config_path) = &cli.config {
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
        toml::from_str(&content)?
    } else {
        AgentdeckConfig::default()
    };

    match cli.command {
        Commands::Send { session, message } => send(config, session, message).await?,
        Commands::History { session } => history(config, session).await?,
        Commands::Export { session, output } => export(config, session, output).await?,
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?
        }
    }

    Ok(())
}

async fn send(config: AgentdeckConfig, session: Option<String>, message: String) -> Result<()> {
    let session_id = session.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let backend = Arc::new(HttpBackend::new(&config.api)?);
    let controller = Arc::new(SessionController::new(
        backend,
        session_id.clone(),
        &config,
    ));

    // In async mode a duplex channel feeds progress and streamed content
    // into the controller while the poller waits for completion.
    let channel = if config.delivery.mode == DeliveryMode::Async {
        let (frames_tx, mut frames_rx) = tokio::sync::mpsc::channel(64);
        let channel = DuplexChannel::new(config.channel.clone(), frames_tx);
        let _pump = channel.spawn();

        let frame_sink = controller.clone();
        tokio::spawn(async move {
            while let Some(frame) = frames_rx.recv().await {
                frame_sink.handle_frame(&frame).await;
            }
        });
        Some(channel)
    } else {
        None
    };

    let result = controller.send_message(message, None).await;

    if let Some(channel) = &channel {
        channel.shutdown();
    }

    if let Err(e) = result {
        if let Some(surfaced) = controller.error().await {
            eprintln!("error: {}", surfaced);
        }
        return Err(e.into());
    }

    println!("session: {}", session_id);
    for entry in controller.messages().await {
        println!("[{}] {}", entry.role, entry.content);
    }

    Ok(())
}

async fn history(config: AgentdeckConfig, session: String) -> Result<()> {
    let backend = HttpBackend::new(&config.api)?;

    match backend.fetch_session(&session).await? {
        Some(history) => {
            for entry in &history.messages {
                println!("[{}] {}", entry.role, entry.content);
            }
            println!("({} messages)", history.messages.len());
        }
        None => {
            println!("No stored history for session {}", session);
        }
    }

    Ok(())
}

async fn export(
    config: AgentdeckConfig,
    session: String,
    output: Option<PathBuf>,
) -> Result<()> {
    let backend = HttpBackend::new(&config.api)?;

    let history = backend
        .fetch_session(&session)
        .await?
        .with_context(|| format!("Session {} has no stored history", session))?;

    let Some(generated) = bundle::extract_latest(&history.messages) else {
        println!("No generated bundle in session {}", session);
        return Ok(());
    };

    if !generated.validation.valid {
        for warning in &generated.validation.warnings {
            eprintln!("warning: {}", warning);
        }
        for error in &generated.validation.errors {
            eprintln!("validation error: {}", error);
        }
    }

    let path = output.unwrap_or_else(|| PathBuf::from(format!("{}.zip", generated.slug)));
    let archive = bundle::build_archive(&generated.files);
    std::fs::write(&path, &archive)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!(
        "Wrote {} ({} files, {} bytes)",
        path.display(),
        generated.files.len(),
        archive.len()
    );

    Ok(())
}

fn show_config(config: Option<&AgentdeckConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}
