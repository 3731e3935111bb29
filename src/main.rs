use clap::{Parser, Subcommand};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use guestbook::{
    Config, FileStore, GuestbookClient, GuestbookError, MessageStore, ServerHandle, StorageError,
};

const READY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "guestbook")]
#[command(about = "A minimal file-backed HTTP guestbook", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "guestbook.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Post a message to a running server
    Post {
        message: String,

        /// Server URL (defaults to the configured address)
        #[arg(short, long)]
        url: Option<String>,
    },
    /// Print stored messages, oldest first
    List,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Version => {
            println!("guestbook v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(&cli.config),
        command => run_async(&cli.config, command),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_async(config_path: &str, command: Commands) -> Result<(), GuestbookError> {
    let config = load_config(config_path)?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| GuestbookError::Server(format!("Failed to start runtime: {}", e)))?;

    rt.block_on(async {
        match command {
            Commands::Serve { port } => serve(config, port).await,
            Commands::Post { message, url } => post(&config, &message, url).await,
            Commands::List => list(&config).await,
            Commands::Version | Commands::InitConfig => Ok(()),
        }
    })
}

fn load_config(config_path: &str) -> Result<Config, GuestbookError> {
    let mut config = if Path::new(config_path).exists() {
        Config::load(config_path)?
    } else {
        tracing::debug!("No config at {}, using defaults", config_path);
        Config::default()
    };
    config.apply_env(|key| std::env::var(key).ok())?;
    Ok(config)
}

async fn serve(mut config: Config, port: Option<u16>) -> Result<(), GuestbookError> {
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!(
        "Starting guestbook: {} (messages in {})",
        config.page.title,
        config.storage.message_dir.display()
    );

    let server = ServerHandle::start_with_config(&config).await?;
    server.wait_ready(READY_TIMEOUT).await?;
    tracing::info!("Ready at {}", server.url());

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
    }
    tracing::info!("Shutting down");
    server.stop().await
}

async fn post(config: &Config, message: &str, url: Option<String>) -> Result<(), GuestbookError> {
    let url = url.unwrap_or_else(|| format!("http://{}", config.bind_addr()));
    let client = GuestbookClient::new(url)?;

    let status = client.post_message(message).await?;
    if status.is_redirection() {
        println!("Posted to {}", client.base_url());
        Ok(())
    } else {
        Err(GuestbookError::Network(format!("Server answered {}", status)))
    }
}

async fn list(config: &Config) -> Result<(), GuestbookError> {
    let store = FileStore::open(&config.storage.message_dir).await?;
    for message in store.list_all().await? {
        println!(
            "{}  {}  {}",
            message.identity,
            message.received_at.format("%Y-%m-%d %H:%M:%S"),
            message.content
        );
    }
    Ok(())
}

fn init_config(path: &str) -> Result<(), GuestbookError> {
    if Path::new(path).exists() {
        println!("{} already exists, leaving it alone", path);
        return Ok(());
    }

    let yaml = Config::default().to_yaml()?;
    std::fs::write(path, yaml).map_err(StorageError::from)?;
    println!("Wrote default config to {}", path);
    Ok(())
}
