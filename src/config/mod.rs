//! Configuration
//!
//! Main config, default templates and mission definitions, loaded from a
//! data directory of TOML files.

pub mod loader;
pub mod main_config;
pub mod mission_config;
pub mod node;
pub mod template;
pub mod watcher;

pub use loader::{ConfigManager, LoadReport, MissionCatalog};
pub use main_config::MainConfig;
pub use mission_config::MissionConfig;
pub use node::ConfigNode;
pub use template::DefaultTemplate;
pub use watcher::{HotReloadEvent, start_file_watcher};
