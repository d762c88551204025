//! Missions
//!
//! The progress record carried by mission items, the per-player slot cache
//! and the manager that drives progress, claims and edits.

pub mod cache;
pub mod display;
pub mod events;
pub mod manager;
pub mod state;

pub use cache::PlayerMissionCache;
pub use events::{ClaimVerdict, MissionHooks, NoHooks, ProgressChange, ProgressVerdict};
pub use manager::{ClaimOutcome, MissionManager, ProgressOutcome};
pub use state::{Mission, MissionState};
