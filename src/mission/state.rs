//! Mission State
//!
//! The progress record embedded in a mission item, plus its two-state
//! lifecycle.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a mission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionState {
    /// progress < requirement
    InProgress,
    /// progress >= requirement
    Completed,
}

impl MissionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissionState::InProgress => "in_progress",
            MissionState::Completed => "completed",
        }
    }
}

/// Progress toward one mission, stored on the item that carries it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    uuid: Uuid,
    config_id: String,
    progress: u32,
    requirement: u32,
    completed: bool,
}

impl Mission {
    /// Fresh mission. A requirement of zero is raised to one.
    pub fn create(config_id: &str, requirement: u32) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            config_id: config_id.to_string(),
            progress: 0,
            requirement: requirement.max(1),
            completed: false,
        }
    }

    /// Repair decoded data that breaks the record's invariants.
    pub(crate) fn normalized(mut self) -> Self {
        self.requirement = self.requirement.max(1);
        if self.completed && self.progress < self.requirement {
            self.completed = false;
        }
        self
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn config_id(&self) -> &str {
        &self.config_id
    }

    pub fn progress(&self) -> u32 {
        self.progress
    }

    pub fn requirement(&self) -> u32 {
        self.requirement
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn state(&self) -> MissionState {
        if self.completed {
            MissionState::Completed
        } else {
            MissionState::InProgress
        }
    }

    /// Set progress. Reaching the requirement completes the mission.
    pub fn set_progress(&mut self, progress: u32) {
        self.progress = progress;
        if self.progress >= self.requirement {
            self.completed = true;
        }
    }

    pub fn add_progress(&mut self, amount: u32) {
        self.set_progress(self.progress.saturating_add(amount));
    }

    /// Completion as a pure function of progress. Only the edit path may
    /// move a completed mission back to in-progress.
    pub(crate) fn rederive_completion(&mut self) {
        self.completed = self.progress >= self.requirement;
    }

    /// floor(progress / requirement * 100)
    pub fn percentage(&self) -> u64 {
        u64::from(self.progress) * 100 / u64::from(self.requirement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_starts_in_progress() {
        let mission = Mission::create("mine_stone", 0);
        assert_eq!(mission.requirement(), 1);
        assert_eq!(mission.progress(), 0);
        assert_eq!(mission.state(), MissionState::InProgress);

        let other = Mission::create("mine_stone", 5);
        assert_eq!(other.requirement(), 5);
        assert_ne!(mission.uuid(), other.uuid());
    }

    #[test]
    fn test_reaching_requirement_completes() {
        let mut mission = Mission::create("mine_stone", 3);
        mission.add_progress(2);
        assert!(!mission.is_completed());
        mission.add_progress(1);
        assert!(mission.is_completed());

        // lowering progress outside the edit path keeps the mission complete
        mission.set_progress(0);
        assert!(mission.is_completed());
    }

    #[test]
    fn test_rederive_can_uncomplete() {
        let mut mission = Mission::create("mine_stone", 3);
        mission.set_progress(10);
        assert!(mission.is_completed());
        mission.set_progress(1);
        mission.rederive_completion();
        assert_eq!(mission.state(), MissionState::InProgress);
    }

    #[test]
    fn test_percentage_floors() {
        let mut mission = Mission::create("mine_stone", 3);
        mission.set_progress(1);
        assert_eq!(mission.percentage(), 33);
        mission.set_progress(u32::MAX);
        assert_eq!(mission.percentage(), u64::from(u32::MAX) * 100 / 3);
    }

    #[test]
    fn test_normalized_repairs_bad_records() {
        let json = r#"{"uuid":"7d444840-9dc0-11d1-b245-5ffdce74fad2","config_id":"x","progress":1,"requirement":0,"completed":false}"#;
        let mission: Mission = serde_json::from_str(json).unwrap();
        let mission = mission.normalized();
        assert_eq!(mission.requirement(), 1);

        let json = r#"{"uuid":"7d444840-9dc0-11d1-b245-5ffdce74fad2","config_id":"x","progress":1,"requirement":5,"completed":true}"#;
        let mission: Mission = serde_json::from_str(json).unwrap();
        assert!(!mission.normalized().is_completed());
    }
}
