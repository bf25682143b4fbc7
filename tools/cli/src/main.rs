//! blobswitch CLI - Command line interface for blob operations.
//!
//! Every command resolves the active provider from the configuration file
//! and builds a fresh storage client, so `switch` affects the next command
//! immediately.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use blobswitch_common::ProviderId;
use blobswitch_config::{ConfigDocument, ConfigStore};
use blobswitch_storage::{reader_stream, BlobService};

/// Configuration path used when neither `--config` nor the environment set one.
const DEFAULT_CONFIG: &str = "config.json";
/// Environment variable naming the configuration path.
const CONFIG_ENV: &str = "BLOBSWITCH_CONFIG";

#[derive(Parser)]
#[command(name = "blobswitch")]
#[command(about = "blobswitch - One interface over switchable blob storage providers")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Path to the configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a fresh configuration file with empty credentials.
    Init {
        /// Provider to mark as active.
        #[arg(short, long, default_value = "aws")]
        provider: String,

        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },

    /// Show the active provider.
    Provider,

    /// Switch the active provider.
    Switch {
        /// Provider name ("aws" or "cloudinary").
        provider: String,
    },

    /// List stored blobs.
    List,

    /// Upload a file.
    Upload {
        /// File to upload.
        file: PathBuf,

        /// Name to store it under (default: the file name).
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Download a blob.
    Download {
        /// Identifier of the blob.
        identifier: String,

        /// Output file (default: the identifier's last segment).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete a blob.
    Delete {
        /// Identifier of the blob.
        identifier: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = resolve_config_path(cli.config);
    let service = BlobService::new(ConfigStore::new(&config_path));

    match cli.command {
        Commands::Init { provider, force } => cmd_init(&config_path, &provider, force),

        Commands::Provider => cmd_provider(&service),

        Commands::Switch { provider } => cmd_switch(&service, &provider),

        Commands::List => cmd_list(&service).await,

        Commands::Upload { file, name } => cmd_upload(&service, &file, name).await,

        Commands::Download { identifier, output } => {
            cmd_download(&service, &identifier, output).await
        }

        Commands::Delete { identifier } => cmd_delete(&service, &identifier).await,
    }
}

fn resolve_config_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG))
}

/// Write a fresh configuration document.
fn cmd_init(path: &Path, provider: &str, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let provider: ProviderId = provider.parse().context("Invalid provider")?;
    ConfigStore::new(path)
        .save(&ConfigDocument::new(provider))
        .context("Failed to write configuration")?;

    println!("Configuration written to {}", path.display());
    println!("  Active provider: {}", provider);

    Ok(())
}

/// Show the active provider.
fn cmd_provider(service: &BlobService) -> Result<()> {
    let active = service
        .active_provider()
        .context("Failed to read configuration")?;
    println!("{}", active);

    Ok(())
}

/// Switch the active provider.
fn cmd_switch(service: &BlobService, provider: &str) -> Result<()> {
    service
        .set_active_provider(provider)
        .context("Failed to switch provider")?;

    println!("Switched to {} successfully!", provider.to_uppercase());

    Ok(())
}

/// List stored blobs.
async fn cmd_list(service: &BlobService) -> Result<()> {
    let client = service.client().context("Failed to resolve storage client")?;
    let blobs = client.list().await.context("Failed to list blobs")?;

    if blobs.is_empty() {
        println!("No blobs stored on {}.", client.provider());
    } else {
        println!("Blobs on {}:", client.provider());
        for blob in blobs {
            println!("  {} ({} bytes)", blob.key, blob.size);
        }
    }

    Ok(())
}

/// Upload a file.
async fn cmd_upload(service: &BlobService, file: &Path, name: Option<String>) -> Result<()> {
    let name = match name {
        Some(name) => name,
        None => file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("Cannot derive a name from the file path; pass --name")?,
    };
    if name.is_empty() {
        anyhow::bail!("Name cannot be empty");
    }

    info!("Uploading {} as {}", file.display(), name);

    let handle = tokio::fs::File::open(file)
        .await
        .with_context(|| format!("Failed to open {}", file.display()))?;

    let client = service.client().context("Failed to resolve storage client")?;
    let receipt = client
        .upload(&name, reader_stream(handle))
        .await
        .context("Failed to upload")?;

    println!("Uploaded {}!", name);
    println!("  Identifier: {}", receipt.identifier);
    println!("  Location: {}", receipt.locator);

    Ok(())
}

/// Download a blob.
async fn cmd_download(
    service: &BlobService,
    identifier: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let output = output.unwrap_or_else(|| {
        PathBuf::from(identifier.rsplit('/').next().unwrap_or(identifier))
    });

    info!("Downloading {} to {}", identifier, output.display());

    let client = service.client().context("Failed to resolve storage client")?;
    let data = client
        .download(identifier)
        .await
        .context("Failed to download")?;

    tokio::fs::write(&output, &data)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Downloaded {} ({} bytes)", output.display(), data.len());

    Ok(())
}

/// Delete a blob.
async fn cmd_delete(service: &BlobService, identifier: &str) -> Result<()> {
    let client = service.client().context("Failed to resolve storage client")?;
    client
        .delete(identifier)
        .await
        .context("Failed to delete")?;

    println!("Deleted {}", identifier);

    Ok(())
}
