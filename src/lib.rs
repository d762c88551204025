//! Item-embedded mission tracking
//!
//! Missions live on inventory items. Game events are turned into a
//! [`MissionContext`](types::MissionContext) and handed to
//! [`MissionManager::find_and_progress`](mission::MissionManager::find_and_progress),
//! which picks the first mission whose type, target and options accept the
//! event and runs the progress transaction on it.

pub mod actor;
pub mod config;
pub mod error;
pub mod item;
pub mod matcher;
pub mod mission;
pub mod option;
pub mod types;

pub use actor::{Actor, CommandRunner, Player};
pub use config::{ConfigManager, MissionConfig};
pub use item::{Inventory, ItemStack};
pub use mission::{Mission, MissionManager, ProgressOutcome};
pub use types::{MissionContext, MissionType};
