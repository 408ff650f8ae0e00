//! Vaultine - Main entry point
//!
//! Local backup/restore engine with versioned bundles, a simulated cloud
//! ledger and a small status HTTP surface.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use vaultine::{api, scheduler, utils, BackupService, Config};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the status HTTP surface and the periodic auto-backup loop
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Create one backup now
    Backup,
    /// Restore a bundle by name
    Restore {
        /// Bundle name (manifest name or archive file name)
        name: String,

        /// Target directory (defaults to restored_<timestamp> next to the backup root)
        #[arg(short, long)]
        target: Option<PathBuf>,
    },
    /// List retained backups, most recent first
    List,
    /// Show catalog and simulated cloud storage statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };

    // Initialize logging
    let log_level = cli.log_level.as_deref().unwrap_or(&config.log.level);
    utils::logger::init(log_level)?;

    tracing::info!("Starting vaultine v{}", env!("CARGO_PKG_VERSION"));

    let service = Arc::new(BackupService::open(config.clone())?);

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => serve(service, config, port).await?,
        Command::Backup => {
            let summary = service.create_backup().await?;
            println!(
                "Backup completed: {} ({} files, {:.2} MB)",
                summary.bundle_name,
                summary.manifest.file_count,
                summary.manifest.total_megabytes()
            );
        }
        Command::Restore { name, target } => {
            let outcome = service.restore(&name, target).await?;
            println!(
                "Restore completed: {} files into {}",
                outcome.files_restored,
                outcome.target_dir.display()
            );
            if !outcome.verified {
                println!(
                    "Warning: restored file count does not match the manifest (see logs)"
                );
            }
        }
        Command::List => {
            let entries = service.list_backups().await;
            if entries.is_empty() {
                println!("No backups retained.");
            }
            for entry in entries {
                println!(
                    "{}  {}  {} files  {:.2} MB",
                    entry.manifest.name,
                    entry.manifest.created_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.manifest.file_count,
                    vaultine::models::bytes_to_mb(entry.archive_size_bytes)
                );
            }
        }
        Command::Stats => {
            let backup = service.backup_stats().await;
            let cloud = service.cloud_stats().await;
            println!("{}", serde_json::to_string_pretty(&backup)?);
            println!("{}", serde_json::to_string_pretty(&cloud)?);
        }
    }

    Ok(())
}

async fn serve(service: Arc<BackupService>, config: Config, port: Option<u16>) -> Result<()> {
    let cancel = CancellationToken::new();

    // Spawn the auto-backup loop
    let scheduler_handle = if config.scheduler.enabled {
        Some(scheduler::spawn_auto_backup(
            service.clone(),
            Duration::from_secs(config.scheduler.interval_secs),
            cancel.clone(),
        ))
    } else {
        None
    };

    // Start HTTP server
    let app = api::create_router(service);
    let addr = SocketAddr::from(([0, 0, 0, 0], port.unwrap_or(config.api.port)));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Health endpoint: http://{}/health", addr);
    tracing::info!("Metrics endpoint: http://{}/metrics", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await?;

    tracing::info!("Shutting down...");
    cancel.cancel();

    // Let an in-flight scheduled backup finish its cycle
    if let Some(handle) = scheduler_handle {
        match tokio::time::timeout(Duration::from_secs(30), handle).await {
            Ok(Ok(())) => tracing::info!("Auto-backup loop shutdown complete"),
            Ok(Err(e)) => tracing::error!("Auto-backup task panicked: {}", e),
            Err(_) => tracing::warn!("Auto-backup shutdown timeout, forcing exit"),
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }

    cancel.cancel();
}
