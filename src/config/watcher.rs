//! Hot Reload
//!
//! Watches the data directory and reloads the catalog whenever a `.toml`
//! file is created or modified.

use std::sync::Arc;
use std::time::Duration;

use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{error, info};

use super::loader::ConfigManager;
use crate::error::WatchError;

/// Events from the hot-reload watcher
#[derive(Debug, Clone)]
pub enum HotReloadEvent {
    /// The catalog was reloaded after a change to this file
    Reloaded(String),
    /// The reload failed and the previous catalog is still active
    Error(String),
}

/// Start watching `manager`'s data directory. Must be called from inside a
/// tokio runtime; the watcher lives until the returned receiver is dropped
/// and the next file event arrives.
pub fn start_file_watcher(
    manager: &Arc<ConfigManager>,
) -> Result<tokio::sync::mpsc::Receiver<HotReloadEvent>, WatchError> {
    let rt = tokio::runtime::Handle::try_current()?;
    let (tx, rx) = tokio::sync::mpsc::channel(32);
    let (notify_tx, notify_rx) = std::sync::mpsc::channel();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| {
            if let Ok(event) = res {
                let _ = notify_tx.send(event);
            }
        },
        Config::default().with_poll_interval(Duration::from_secs(1)),
    )?;
    watcher.watch(manager.data_dir(), RecursiveMode::Recursive)?;
    info!("Mission hot-reload watcher started for {:?}", manager.data_dir());

    let manager = Arc::clone(manager);
    std::thread::spawn(move || {
        // keep the watcher alive for as long as this thread runs
        let _watcher = watcher;

        while let Ok(event) = notify_rx.recv() {
            if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                continue;
            }
            let Some(path) = event
                .paths
                .iter()
                .find(|p| p.extension().is_some_and(|ext| ext == "toml"))
            else {
                continue;
            };
            if tx.is_closed() {
                break;
            }

            info!("Detected change in {:?}, triggering reload", path);
            let manager = Arc::clone(&manager);
            let tx = tx.clone();
            let changed = path.to_string_lossy().to_string();

            rt.spawn(async move {
                let result = tokio::task::spawn_blocking(move || manager.load()).await;
                let event = match result {
                    Ok(Ok(report)) => {
                        info!("Hot-reload completed: {} missions", report.missions);
                        HotReloadEvent::Reloaded(changed)
                    }
                    Ok(Err(e)) => {
                        error!("Hot-reload failed: {}", e);
                        HotReloadEvent::Error(e.to_string())
                    }
                    Err(e) => {
                        error!("Hot-reload task panicked: {}", e);
                        HotReloadEvent::Error(e.to_string())
                    }
                };
                let _ = tx.send(event).await;
            });
        }
    });

    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::tests::{MINING, write_data_dir};
    use crate::config::loader::MISSIONS_DIR;

    #[test]
    fn test_requires_runtime() {
        let dir = write_data_dir(&[("mining.toml", MINING)]);
        let manager = Arc::new(ConfigManager::new(dir.path()).unwrap());
        assert!(matches!(start_file_watcher(&manager), Err(WatchError::Runtime(_))));
    }

    #[tokio::test]
    async fn test_reloads_on_change() {
        let dir = write_data_dir(&[("mining.toml", MINING)]);
        let manager = Arc::new(ConfigManager::new(dir.path()).unwrap());
        manager.load().unwrap();

        let mut rx = start_file_watcher(&manager).unwrap();
        let extra = "[swim_laps]\ntype = \"swim\"\n";
        std::fs::write(dir.path().join(MISSIONS_DIR).join("swimming.toml"), extra).unwrap();

        // the first event may fire before the file is fully written
        let reloaded = tokio::time::timeout(Duration::from_secs(10), async {
            while let Some(event) = rx.recv().await {
                if matches!(event, HotReloadEvent::Reloaded(_))
                    && manager.catalog().mission("swim_laps").is_some()
                {
                    return true;
                }
            }
            false
        })
        .await;
        assert_eq!(reloaded.ok(), Some(true));
    }
}
