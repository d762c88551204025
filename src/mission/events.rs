//! Mission Events
//!
//! Synchronous hooks the host uses to veto or adjust progress and claims.

use uuid::Uuid;

use crate::mission::state::Mission;

/// A proposed progress update. `mission` is a copy of the mission after the
/// mutation ran; changing it has no effect.
#[derive(Debug, Clone)]
pub struct ProgressChange {
    pub actor_id: Uuid,
    pub actor_name: String,
    pub slot: usize,
    pub mission: Mission,
    pub old_progress: u32,
    pub new_progress: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressVerdict {
    /// Commit with this progress value.
    Accept(u32),
    /// Roll back and stop searching.
    Veto,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimVerdict {
    /// Consume the item and run these reward commands.
    Accept(Vec<String>),
    Veto,
}

pub trait MissionHooks: Send + Sync {
    fn on_progress(&self, change: &ProgressChange) -> ProgressVerdict {
        ProgressVerdict::Accept(change.new_progress)
    }

    fn on_claim(&self, _actor_name: &str, _mission: &Mission, rewards: &[String]) -> ClaimVerdict {
        ClaimVerdict::Accept(rewards.to_vec())
    }
}

/// Accepts everything unchanged.
#[derive(Debug, Default)]
pub struct NoHooks;

impl MissionHooks for NoHooks {}
