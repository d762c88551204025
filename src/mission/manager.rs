//! Mission Manager
//!
//! Finds the mission an event should progress, runs the progress
//! transaction, and hands out and claims mission items.
//!
//! A progress update runs the caller's mutation on a copy of the mission.
//! The hooks see the proposed copy and either veto it, in which case the
//! item is never touched, or accept it with a possibly adjusted value that
//! is then written back onto the item.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::actor::{Actor, CommandRunner, LoggingCommandRunner};
use crate::config::loader::{ConfigManager, LoadReport, MissionCatalog};
use crate::config::mission_config::MissionConfig;
use crate::error::LoadError;
use crate::item::{Inventory, ItemStack, tracked_slots};
use crate::mission::cache::PlayerMissionCache;
use crate::mission::display;
use crate::mission::events::{ClaimVerdict, MissionHooks, NoHooks, ProgressChange, ProgressVerdict};
use crate::mission::state::Mission;
use crate::types::{MissionContext, MissionType};

/// Prefix of reward commands that message the claiming player directly.
pub const SAY_PREFIX: &str = "say ";
/// Replaced with the claiming player's name in reward commands.
pub const PLAYER_TOKEN: &str = "<player>";

/// Result of a progress attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressOutcome {
    /// No mission passed the filters.
    NoCandidate,
    /// A hook rejected the update. Nothing was written.
    Vetoed,
    /// A mission matched but its state did not change.
    Unchanged,
    /// The mission in this slot was updated.
    Progressed(usize),
}

/// Result of a reward claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The slot holds no mission with a loaded config.
    NotClaimable,
    Vetoed,
    /// The item was consumed and these commands ran.
    Claimed(Vec<String>),
}

type Mutation<'m> = dyn FnMut(&mut Mission) + 'm;

pub struct MissionManager {
    config: Arc<ConfigManager>,
    cache: PlayerMissionCache,
    hooks: Arc<dyn MissionHooks>,
    commands: Arc<dyn CommandRunner>,
}

impl MissionManager {
    pub fn new(config: Arc<ConfigManager>) -> Self {
        Self {
            config,
            cache: PlayerMissionCache::new(),
            hooks: Arc::new(NoHooks),
            commands: Arc::new(LoggingCommandRunner),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn MissionHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_command_runner(mut self, commands: Arc<dyn CommandRunner>) -> Self {
        self.commands = commands;
        self
    }

    pub fn config(&self) -> &Arc<ConfigManager> {
        &self.config
    }

    pub fn cache(&self) -> &PlayerMissionCache {
        &self.cache
    }

    pub fn mission_config(&self, mission: &Mission) -> Option<Arc<MissionConfig>> {
        self.config.catalog().mission(mission.config_id())
    }

    fn cache_slots(&self, catalog: &MissionCatalog) -> bool {
        catalog.main.mission.cache_slots
    }

    // ========================================================================
    // Progress
    // ========================================================================

    /// Progress the first eligible `mission_type` mission the actor carries.
    pub fn find_and_progress(
        &self,
        actor: &mut dyn Actor,
        mission_type: &MissionType,
        context: Option<&MissionContext>,
        mut mutation: impl FnMut(&mut Mission),
    ) -> ProgressOutcome {
        let catalog = self.config.catalog();
        if self.cache_slots(&catalog) {
            self.progress_from_cache(actor, &catalog, mission_type, context, &mut mutation)
        } else {
            self.progress_from_inventory(actor, &catalog, mission_type, context, &mut mutation)
        }
    }

    fn progress_from_cache(
        &self,
        actor: &mut dyn Actor,
        catalog: &MissionCatalog,
        mission_type: &MissionType,
        context: Option<&MissionContext>,
        mutation: &mut Mutation<'_>,
    ) -> ProgressOutcome {
        for (slot, config) in self.cache.get(actor.id()) {
            let mission = actor.inventory().get(slot).and_then(ItemStack::mission);
            let mission = match mission {
                Some(m) if m.config_id() == config.key => m,
                _ => {
                    error!(
                        actor = %actor.name(),
                        slot,
                        "Mission cache disagrees with inventory, rebuilding"
                    );
                    self.cache.rebuild(actor, catalog);
                    return self.progress_from_inventory(actor, catalog, mission_type, context, mutation);
                }
            };
            if mission.is_completed() {
                continue;
            }

            if let Some(outcome) =
                self.try_candidate(actor, slot, mission, &config, mission_type, context, mutation)
            {
                return outcome;
            }
        }
        ProgressOutcome::NoCandidate
    }

    fn progress_from_inventory(
        &self,
        actor: &mut dyn Actor,
        catalog: &MissionCatalog,
        mission_type: &MissionType,
        context: Option<&MissionContext>,
        mutation: &mut Mutation<'_>,
    ) -> ProgressOutcome {
        for slot in tracked_slots() {
            let Some(item) = actor.inventory_mut().get_mut(slot) else {
                continue;
            };
            let Some(mission) = item.mission() else {
                continue;
            };
            if mission.is_completed() {
                continue;
            }

            let Some(config) = catalog.mission(mission.config_id()) else {
                display::mark_broken(item, mission.config_id());
                continue;
            };
            if item.is_broken_mission() {
                display::update_mission_data(item, &mission, Some(&config));
            }

            if let Some(outcome) =
                self.try_candidate(actor, slot, mission, &config, mission_type, context, mutation)
            {
                return outcome;
            }
        }
        ProgressOutcome::NoCandidate
    }

    /// `None` means the candidate was filtered out and the search goes on.
    #[allow(clippy::too_many_arguments)]
    fn try_candidate(
        &self,
        actor: &mut dyn Actor,
        slot: usize,
        mission: Mission,
        config: &MissionConfig,
        mission_type: &MissionType,
        context: Option<&MissionContext>,
        mutation: &mut Mutation<'_>,
    ) -> Option<ProgressOutcome> {
        if config.mission_type != *mission_type {
            return None;
        }
        if config.is_world_blacklisted(actor.world()) {
            return None;
        }

        let evaluated = catch_unwind(AssertUnwindSafe(|| {
            if !mission_type.matches(config.target(), context) {
                return None;
            }
            let item = actor.inventory().get(slot)?;
            let passes = config
                .options
                .iter()
                .all(|option| option.check(&*actor, &mission, item, context));
            if !passes {
                return None;
            }

            let mut proposed = mission.clone();
            mutation(&mut proposed);
            Some(proposed)
        }));

        let mut proposed = match evaluated {
            Ok(Some(proposed)) => proposed,
            Ok(None) => return None,
            Err(panic) => {
                error!(
                    mission = %config.key,
                    actor = %actor.name(),
                    "Error processing mission: {}",
                    panic_message(&*panic)
                );
                return None;
            }
        };

        let change = ProgressChange {
            actor_id: actor.id(),
            actor_name: actor.name().to_string(),
            slot,
            mission: proposed.clone(),
            old_progress: mission.progress(),
            new_progress: proposed.progress(),
        };
        let accepted = match self.hooks.on_progress(&change) {
            ProgressVerdict::Accept(progress) => progress,
            ProgressVerdict::Veto => {
                debug!(mission = %config.key, actor = %actor.name(), "Progress vetoed");
                return Some(ProgressOutcome::Vetoed);
            }
        };

        proposed.set_progress(accepted);
        proposed.rederive_completion();

        if proposed.progress() == mission.progress() && proposed.is_completed() == mission.is_completed() {
            return Some(ProgressOutcome::Unchanged);
        }

        let item = actor.inventory_mut().get_mut(slot)?;
        display::update_mission_data(item, &proposed, Some(config));
        if proposed.is_completed() {
            info!(mission = %config.key, actor = %actor.name(), "Mission completed");
        }
        Some(ProgressOutcome::Progressed(slot))
    }

    // ========================================================================
    // Editing and claiming
    // ========================================================================

    /// Apply `edit` with no veto step. Completion follows progress in both
    /// directions. Returns false if the item carries no mission.
    pub fn edit_mission(&self, item: &mut ItemStack, edit: impl FnOnce(&mut Mission)) -> bool {
        let Some(mut mission) = item.mission() else {
            return false;
        };
        edit(&mut mission);
        mission.rederive_completion();

        let config = self.mission_config(&mission);
        display::update_mission_data(item, &mission, config.as_deref());
        true
    }

    /// Consume the mission in `slot` and run its rewards.
    pub fn claim_rewards(&self, actor: &mut dyn Actor, slot: usize) -> ClaimOutcome {
        let catalog = self.config.catalog();
        let Some(mission) = actor.inventory().get(slot).and_then(ItemStack::mission) else {
            return ClaimOutcome::NotClaimable;
        };
        let Some(config) = catalog.mission(mission.config_id()) else {
            return ClaimOutcome::NotClaimable;
        };

        let commands = match self.hooks.on_claim(actor.name(), &mission, &config.rewards) {
            ClaimVerdict::Accept(commands) => commands,
            ClaimVerdict::Veto => return ClaimOutcome::Vetoed,
        };

        let removed = actor.inventory_mut().take(slot);
        if self.cache_slots(&catalog) {
            self.cache.on_slot_change(actor, slot, removed.as_ref(), &catalog);
        }

        let name = actor.name().to_string();
        let mut executed = Vec::with_capacity(commands.len());
        for reward in commands {
            let command = reward.replace(PLAYER_TOKEN, &name);
            match command.strip_prefix(SAY_PREFIX) {
                Some(message) => actor.send_message(message.trim()),
                None => self.commands.run_as_console(&command),
            }
            executed.push(command);
        }

        info!(mission = %config.key, actor = %name, "Mission rewards claimed");
        ClaimOutcome::Claimed(executed)
    }

    // ========================================================================
    // Creating missions
    // ========================================================================

    /// New item carrying a fresh mission for `config`.
    pub fn create_mission_item(&self, config: &MissionConfig) -> ItemStack {
        let requirement = config.requirement_range.random().max(1);
        let mission = Mission::create(&config.key, requirement);
        display::build_item(config, &mission)
    }

    /// Create a mission item and put it in the actor's first free storage
    /// slot. Gives the item back if the inventory is full.
    pub fn give_mission(&self, actor: &mut dyn Actor, config: &MissionConfig) -> Result<usize, ItemStack> {
        let item = self.create_mission_item(config);
        let slot = actor.inventory_mut().add_item(item)?;

        let catalog = self.config.catalog();
        if self.cache_slots(&catalog) {
            self.cache.on_slot_change(actor, slot, None, &catalog);
        }
        info!(mission = %config.key, actor = %actor.name(), slot, "Gave mission");
        Ok(slot)
    }

    /// Pick a category by weight, then a mission within it. Non-positive
    /// weights are never picked.
    pub fn weighted_random_mission(&self, weights: &BTreeMap<String, i64>) -> Option<Arc<MissionConfig>> {
        let total: i64 = weights.values().filter(|w| **w > 0).sum();
        if total <= 0 {
            return None;
        }

        let roll = rand::thread_rng().gen_range(0..total);
        let mut gained = 0;
        for (category, weight) in weights {
            if *weight <= 0 {
                continue;
            }
            gained += weight;
            if gained > roll {
                return self.category_random_mission(category);
            }
        }
        None
    }

    pub fn category_random_mission(&self, category: &str) -> Option<Arc<MissionConfig>> {
        self.missions_in_category(category)
            .choose(&mut rand::thread_rng())
            .cloned()
    }

    pub fn missions_in_category(&self, category: &str) -> Vec<Arc<MissionConfig>> {
        self.config.catalog().missions_in_category(category)
    }

    // ========================================================================
    // Player lifecycle
    // ========================================================================

    pub fn handle_join(&self, actor: &mut dyn Actor) {
        let catalog = self.config.catalog();
        if self.cache_slots(&catalog) {
            self.cache.rebuild(actor, &catalog);
        }
    }

    pub fn handle_leave(&self, actor_id: Uuid) {
        if self.cache_slots(&self.config.catalog()) {
            self.cache.invalidate(actor_id);
        }
    }

    /// Call after the content of `slot` changed; `old` is what it held before.
    pub fn handle_slot_change(&self, actor: &mut dyn Actor, slot: usize, old: Option<&ItemStack>) {
        let catalog = self.config.catalog();
        if self.cache_slots(&catalog) {
            self.cache.on_slot_change(actor, slot, old, &catalog);
        }
    }

    /// Reload the config and rebuild the cache of every online actor.
    pub fn reload<'a, A: Actor + 'a>(
        &self,
        actors: impl IntoIterator<Item = &'a mut A>,
    ) -> Result<LoadReport, LoadError> {
        let report = self.config.load()?;
        self.cache.invalidate_all();

        let catalog = self.config.catalog();
        if self.cache_slots(&catalog) {
            for actor in actors {
                self.cache.rebuild(actor, &catalog);
            }
        }
        Ok(report)
    }
}

// ============================================================================
// Inventory queries
// ============================================================================

/// Tracked slots holding a mission accepted by `filter`, in lookup order.
pub fn mission_slots(inventory: &Inventory, filter: impl Fn(&Mission) -> bool) -> Vec<usize> {
    inventory
        .tracked_items()
        .filter_map(|(slot, item)| item.mission().filter(|m| filter(m)).map(|_| slot))
        .collect()
}

pub fn first_mission_slot(inventory: &Inventory, filter: impl Fn(&Mission) -> bool) -> Option<usize> {
    inventory
        .tracked_items()
        .find(|(_, item)| item.mission().is_some_and(|m| filter(&m)))
        .map(|(slot, _)| slot)
}

pub fn has_mission(actor: &dyn Actor, filter: impl Fn(&Mission) -> bool) -> bool {
    first_mission_slot(actor.inventory(), filter).is_some()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
