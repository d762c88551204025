//! Player Mission Cache
//!
//! Per-player index of slot -> mission config, so progress events do not
//! have to scan the whole inventory. The item is always the source of
//! truth; the index is rebuilt whenever it disagrees with the inventory.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::actor::Actor;
use crate::config::loader::MissionCatalog;
use crate::config::mission_config::MissionConfig;
use crate::item::{ItemStack, is_ignored_slot, tracked_slots};
use crate::mission::display;

pub type SlotMap = BTreeMap<usize, Arc<MissionConfig>>;

pub struct PlayerMissionCache {
    entries: DashMap<Uuid, SlotMap>,
}

impl PlayerMissionCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Snapshot of the actor's slots, empty if nothing is cached.
    pub fn get(&self, actor_id: Uuid) -> SlotMap {
        self.entries
            .get(&actor_id)
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    pub fn has_any(&self, actor_id: Uuid) -> bool {
        self.entries.get(&actor_id).is_some_and(|e| !e.is_empty())
    }

    /// Rescan the actor's inventory. Items whose config is gone are marked
    /// broken and left out; previously broken items that resolve again are
    /// repaired.
    pub fn rebuild(&self, actor: &mut dyn Actor, catalog: &MissionCatalog) -> usize {
        let actor_id = actor.id();
        let inventory = actor.inventory_mut();
        let mut slots = SlotMap::new();

        for slot in tracked_slots() {
            let Some(item) = inventory.get_mut(slot) else {
                continue;
            };
            let Some(mission) = item.mission() else {
                continue;
            };

            match catalog.mission(mission.config_id()) {
                Some(config) => {
                    if item.is_broken_mission() {
                        display::update_mission_data(item, &mission, Some(&config));
                    }
                    slots.insert(slot, config);
                }
                None => {
                    display::mark_broken(item, mission.config_id());
                }
            }
        }

        let count = slots.len();
        if slots.is_empty() {
            self.entries.remove(&actor_id);
        } else {
            self.entries.insert(actor_id, slots);
        }
        debug!(actor = %actor.name(), slots = count, "Rebuilt mission cache");
        count
    }

    pub fn invalidate(&self, actor_id: Uuid) {
        self.entries.remove(&actor_id);
    }

    pub fn invalidate_all(&self) {
        self.entries.clear();
    }

    /// Patch a single slot after `old` was replaced by whatever the
    /// inventory now holds there. Returns whether the index changed.
    pub fn on_slot_change(
        &self,
        actor: &mut dyn Actor,
        slot: usize,
        old: Option<&ItemStack>,
        catalog: &MissionCatalog,
    ) -> bool {
        if is_ignored_slot(slot) {
            return false;
        }
        let actor_id = actor.id();
        let mut slots = self.get(actor_id);
        let mut modified = false;

        if old.is_some_and(ItemStack::has_mission) {
            modified = slots.remove(&slot).is_some();
        }

        if let Some(item) = actor.inventory_mut().get_mut(slot) {
            if let Some(mission) = item.mission() {
                match catalog.mission(mission.config_id()) {
                    Some(config) => {
                        slots.insert(slot, config);
                        modified = true;
                    }
                    None => {
                        display::mark_broken(item, mission.config_id());
                    }
                }
            }
        }

        if !modified {
            return false;
        }
        if slots.is_empty() {
            self.entries.remove(&actor_id);
        } else {
            self.entries.insert(actor_id, slots);
        }
        true
    }

    /// Number of players with cached slots
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PlayerMissionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Player;
    use crate::config::loader::tests::sample_catalog;
    use crate::matcher::names::Material;
    use crate::mission::state::Mission;

    fn mission_item(config_id: &str) -> ItemStack {
        let mut item = ItemStack::new(Material::Paper, 1);
        item.set_mission(&Mission::create(config_id, 5));
        item
    }

    #[test]
    fn test_rebuild_indexes_tracked_slots() {
        let catalog = sample_catalog();
        let cache = PlayerMissionCache::new();
        let mut player = Player::new("alex", "world");
        player.inventory.set(3, Some(mission_item("mine_stone")));
        player.inventory.set(37, Some(mission_item("mine_stone")));
        player.inventory.set(40, Some(mission_item("walk_far")));
        player.inventory.set(5, Some(ItemStack::new(Material::Stone, 64)));

        assert_eq!(cache.rebuild(&mut player, &catalog), 2);
        let slots = cache.get(player.id);
        assert_eq!(slots.keys().copied().collect::<Vec<_>>(), vec![3, 40]);
        assert_eq!(slots[&40].key, "walk_far");
    }

    #[test]
    fn test_rebuild_marks_unknown_configs_broken() {
        let catalog = sample_catalog();
        let cache = PlayerMissionCache::new();
        let mut player = Player::new("alex", "world");
        player.inventory.set(0, Some(mission_item("deleted")));

        assert_eq!(cache.rebuild(&mut player, &catalog), 0);
        assert!(cache.is_empty());
        assert!(player.inventory.get(0).unwrap().is_broken_mission());
    }

    #[test]
    fn test_slot_change_patches_index() {
        let catalog = sample_catalog();
        let cache = PlayerMissionCache::new();
        let mut player = Player::new("alex", "world");

        player.inventory.set(7, Some(mission_item("mine_stone")));
        assert!(cache.on_slot_change(&mut player, 7, None, &catalog));
        assert!(cache.has_any(player.id));

        // non-mission items moving around leave the index alone
        let old = player.inventory.set(8, Some(ItemStack::new(Material::Dirt, 1)));
        assert!(!cache.on_slot_change(&mut player, 8, old.as_ref(), &catalog));

        let old = player.inventory.take(7);
        assert!(cache.on_slot_change(&mut player, 7, old.as_ref(), &catalog));
        assert!(!cache.has_any(player.id));
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_slot_change_ignores_equipment_slots() {
        let catalog = sample_catalog();
        let cache = PlayerMissionCache::new();
        let mut player = Player::new("alex", "world");
        player.inventory.set(38, Some(mission_item("mine_stone")));
        assert!(!cache.on_slot_change(&mut player, 38, None, &catalog));
        assert!(cache.get(player.id).is_empty());
    }

    #[test]
    fn test_invalidate() {
        let catalog = sample_catalog();
        let cache = PlayerMissionCache::new();
        let mut player = Player::new("alex", "world");
        player.inventory.set(0, Some(mission_item("mine_stone")));
        cache.rebuild(&mut player, &catalog);

        cache.invalidate(player.id);
        assert!(cache.get(player.id).is_empty());
    }
}
