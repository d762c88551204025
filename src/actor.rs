//! Actors and privileged commands
//!
//! The host game implements [`Actor`] for its player handle. [`Player`] is a
//! plain in-memory implementation used by the binary and by tests.

use std::collections::HashSet;

use tracing::info;
use uuid::Uuid;

use crate::item::Inventory;

pub trait Actor {
    fn id(&self) -> Uuid;
    fn name(&self) -> &str;
    /// Identifier of the world the actor is currently in.
    fn world(&self) -> &str;
    fn has_permission(&self, permission: &str) -> bool;
    fn inventory(&self) -> &Inventory;
    fn inventory_mut(&mut self) -> &mut Inventory;
    fn send_message(&mut self, message: &str);
}

/// Runs reward commands with full privileges.
pub trait CommandRunner: Send + Sync {
    fn run_as_console(&self, command: &str);
}

/// Logs commands instead of executing them.
#[derive(Debug, Default)]
pub struct LoggingCommandRunner;

impl CommandRunner for LoggingCommandRunner {
    fn run_as_console(&self, command: &str) {
        info!(command, "Running reward command");
    }
}

// ============================================================================
// Player
// ============================================================================

#[derive(Debug, Clone)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub world: String,
    pub permissions: HashSet<String>,
    pub inventory: Inventory,
    /// Messages delivered to this player, oldest first
    pub messages: Vec<String>,
}

impl Player {
    pub fn new(name: &str, world: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            world: world.to_string(),
            permissions: HashSet::new(),
            inventory: Inventory::new(),
            messages: Vec::new(),
        }
    }

    pub fn grant(&mut self, permission: &str) {
        self.permissions.insert(permission.to_string());
    }
}

impl Actor for Player {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn world(&self) -> &str {
        &self.world
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    fn send_message(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}
