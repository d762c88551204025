use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use mission_tracker::config::{ConfigManager, HotReloadEvent, start_file_watcher};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mission_tracker=info".parse()?),
        )
        .init();

    let mut data_dir = PathBuf::from("data");
    let mut watch = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--watch" | "-w" => watch = true,
            other => data_dir = PathBuf::from(other),
        }
    }

    let config = Arc::new(ConfigManager::new(&data_dir)?);
    let report = match config.load() {
        Ok(report) => report,
        Err(e) => {
            error!("Failed to load missions from {:?}: {}", data_dir, e);
            return Err(e.into());
        }
    };

    let catalog = config.catalog();
    for (category, weight) in &catalog.main.categories {
        let missions = catalog.missions_in_category(category);
        info!("Category '{}' (weight {}): {} missions", category, weight, missions.len());
        for mission in missions {
            info!(
                "  {} [{}] requirement {}",
                mission.key,
                mission.mission_type,
                mission.requirement_range
            );
        }
    }
    if !report.is_clean() {
        warn!(
            "{} entry error(s), {} unreadable file(s)",
            report.entry_errors,
            report.failed_files.len()
        );
    }

    if !watch {
        return Ok(());
    }

    let mut events = start_file_watcher(&config)?;
    info!("Watching {:?} for changes, press Ctrl+C to stop", data_dir);
    loop {
        tokio::select! {
            Some(event) = events.recv() => match event {
                HotReloadEvent::Reloaded(path) => {
                    info!("Reloaded after change to {}: {} missions", path, config.catalog().len())
                }
                HotReloadEvent::Error(e) => warn!("Reload failed, keeping previous missions: {}", e),
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}
