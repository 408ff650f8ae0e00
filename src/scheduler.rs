//! Periodic auto-backup loop.
//!
//! Runs `create_backup` on a fixed interval. Cycles never overlap: the next
//! wait only starts after the previous backup finished. The cancellation
//! token is checked between cycles, never mid-operation.

use crate::service::BackupService;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub fn spawn_auto_backup(
    service: Arc<BackupService>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Auto-backup loop started - runs every {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = cancel.cancelled() => break,
            }

            match service.create_backup().await {
                Ok(summary) => info!(
                    "Scheduled backup {} completed successfully",
                    summary.bundle_name
                ),
                Err(e) => error!("Scheduled backup failed: {e}"),
            }
        }

        info!("Auto-backup loop stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    #[tokio::test]
    async fn loop_backs_up_on_interval_and_stops_on_cancel() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.source_dirs = vec![dir.path().join("data")];
        config.storage.backup_dir = dir.path().join("backups");
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data/f.txt"), b"tick").unwrap();

        let service = Arc::new(BackupService::open(config).unwrap());
        let cancel = CancellationToken::new();
        let handle = spawn_auto_backup(service.clone(), Duration::from_millis(20), cancel.clone());

        let mut backed_up = false;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if service.backup_stats().await.total_backups >= 1 {
                backed_up = true;
                break;
            }
        }
        assert!(backed_up, "auto-backup never ran");

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn cancel_before_first_interval_runs_nothing() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.source_dirs = vec![dir.path().join("data")];
        config.storage.backup_dir = dir.path().join("backups");

        let service = Arc::new(BackupService::open(config).unwrap());
        let cancel = CancellationToken::new();
        let handle = spawn_auto_backup(service.clone(), Duration::from_secs(3600), cancel.clone());

        cancel.cancel();
        handle.await.unwrap();
        assert_eq!(service.backup_stats().await.total_backups, 0);
    }
}
