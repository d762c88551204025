use std::collections::BTreeMap;
use std::sync::LazyLock;

use tracing::warn;

use crate::matcher::names::{Material, PotionType, Rarity};
use crate::matcher::registry::NamespacedKey;
use crate::mission::state::Mission;

// ============================================================================
// Persistent Data
// ============================================================================

pub const DATA_NAMESPACE: &str = "missions";

/// Key holding the encoded mission record.
pub static MISSION_KEY: LazyLock<NamespacedKey> =
    LazyLock::new(|| NamespacedKey::new(DATA_NAMESPACE, "mission_data"));

/// Marker set on items whose mission config no longer exists.
pub static INVALID_CONFIG_KEY: LazyLock<NamespacedKey> =
    LazyLock::new(|| NamespacedKey::new(DATA_NAMESPACE, "invalid_config"));

/// Typed key-value store carried by items and entities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistentData {
    entries: BTreeMap<NamespacedKey, String>,
}

impl PersistentData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &NamespacedKey) -> Option<&str> {
        self.entries.get(key).map(|s| s.as_str())
    }

    pub fn set(&mut self, key: NamespacedKey, value: impl Into<String>) {
        self.entries.insert(key, value.into());
    }

    pub fn has(&self, key: &NamespacedKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &NamespacedKey) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Item Stack
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemStack {
    pub material: Material,
    pub amount: u32,
    /// Custom display name
    pub name: Option<String>,
    pub lore: Vec<String>,
    pub model: Option<NamespacedKey>,
    pub rarity: Option<Rarity>,
    pub enchants: BTreeMap<NamespacedKey, u32>,
    pub potion: Option<PotionType>,
    /// Effects granted when consumed (potions, stews)
    pub effects: Vec<NamespacedKey>,
    pub data: PersistentData,
}

impl ItemStack {
    pub fn new(material: Material, amount: u32) -> Self {
        Self {
            material,
            amount,
            name: None,
            lore: Vec::new(),
            model: None,
            rarity: None,
            enchants: BTreeMap::new(),
            potion: None,
            effects: Vec::new(),
            data: PersistentData::new(),
        }
    }

    pub fn with_enchant(mut self, enchant: NamespacedKey, level: u32) -> Self {
        self.enchants.insert(enchant, level);
        self
    }

    pub fn with_potion(mut self, potion: PotionType) -> Self {
        self.potion = Some(potion);
        self
    }

    pub fn with_effect(mut self, effect: NamespacedKey) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_model(mut self, model: NamespacedKey) -> Self {
        self.model = Some(model);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.material == Material::Air || self.amount == 0
    }

    // ------------------------------------------------------------------------
    // Mission data
    // ------------------------------------------------------------------------

    pub fn has_mission(&self) -> bool {
        !self.is_empty() && self.data.has(&MISSION_KEY)
    }

    /// Decoded mission, or `None` if absent or unreadable.
    pub fn mission(&self) -> Option<Mission> {
        if self.is_empty() {
            return None;
        }
        let raw = self.data.get(&MISSION_KEY)?;
        match serde_json::from_str::<Mission>(raw) {
            Ok(mission) => Some(mission.normalized()),
            Err(e) => {
                warn!("Unreadable mission data on {} item: {}", self.material, e);
                None
            }
        }
    }

    pub fn set_mission(&mut self, mission: &Mission) {
        match serde_json::to_string(mission) {
            Ok(raw) => self.data.set(MISSION_KEY.clone(), raw),
            Err(e) => warn!("Failed to encode mission {}: {}", mission.config_id(), e),
        }
    }

    pub fn remove_mission(&mut self) -> bool {
        self.data.remove(&MISSION_KEY).is_some()
    }

    /// Carries a mission whose config could not be resolved.
    pub fn is_broken_mission(&self) -> bool {
        self.has_mission() && self.data.has(&INVALID_CONFIG_KEY)
    }
}

// ============================================================================
// Inventory
// ============================================================================

pub const INVENTORY_SIZE: usize = 41;
/// Slots 0..MAIN_SLOTS are the storage grid and hotbar.
pub const MAIN_SLOTS: usize = 36;
pub const OFF_HAND_SLOT: usize = 40;

/// Armor slots never hold tracked missions.
pub fn is_ignored_slot(slot: usize) -> bool {
    (MAIN_SLOTS..OFF_HAND_SLOT).contains(&slot)
}

/// Slots considered for mission lookup, in lookup order.
pub fn tracked_slots() -> impl Iterator<Item = usize> {
    (0..MAIN_SLOTS).chain(std::iter::once(OFF_HAND_SLOT))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    slots: Vec<Option<ItemStack>>,
}

impl Inventory {
    pub fn new() -> Self {
        Self {
            slots: vec![None; INVENTORY_SIZE],
        }
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, slot: usize) -> Option<&ItemStack> {
        self.slots.get(slot)?.as_ref()
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut ItemStack> {
        self.slots.get_mut(slot)?.as_mut()
    }

    /// Replace a slot's content, returning what was there.
    pub fn set(&mut self, slot: usize, item: Option<ItemStack>) -> Option<ItemStack> {
        let entry = self.slots.get_mut(slot)?;
        std::mem::replace(entry, item)
    }

    pub fn take(&mut self, slot: usize) -> Option<ItemStack> {
        self.set(slot, None)
    }

    /// First empty storage slot.
    pub fn first_empty(&self) -> Option<usize> {
        (0..MAIN_SLOTS).find(|&i| self.slots[i].is_none())
    }

    /// Put an item into the first empty storage slot. Gives the item back if full.
    pub fn add_item(&mut self, item: ItemStack) -> Result<usize, ItemStack> {
        match self.first_empty() {
            Some(slot) => {
                self.slots[slot] = Some(item);
                Ok(slot)
            }
            None => Err(item),
        }
    }

    /// Occupied tracked slots in lookup order.
    pub fn tracked_items(&self) -> impl Iterator<Item = (usize, &ItemStack)> {
        tracked_slots().filter_map(|slot| self.get(slot).map(|item| (slot, item)))
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mission_data_round_trip_on_item() {
        let mut item = ItemStack::new(Material::Paper, 1);
        assert!(!item.has_mission());
        assert!(item.mission().is_none());

        let mission = Mission::create("mine_stone", 4);
        item.set_mission(&mission);
        assert!(item.has_mission());
        assert_eq!(item.mission(), Some(mission));

        assert!(item.remove_mission());
        assert!(!item.has_mission());
    }

    #[test]
    fn test_garbage_mission_data_reads_as_none() {
        let mut item = ItemStack::new(Material::Paper, 1);
        item.data.set(MISSION_KEY.clone(), "not json");
        assert!(item.has_mission());
        assert!(item.mission().is_none());
    }

    #[test]
    fn test_empty_stack_never_has_mission() {
        let mut item = ItemStack::new(Material::Paper, 1);
        item.set_mission(&Mission::create("mine_stone", 1));
        item.amount = 0;
        assert!(!item.has_mission());
    }

    #[test]
    fn test_tracked_slots_skip_armor() {
        let slots: Vec<usize> = tracked_slots().collect();
        assert_eq!(slots.len(), 37);
        assert_eq!(slots.last(), Some(&OFF_HAND_SLOT));
        assert!(!slots.iter().any(|s| is_ignored_slot(*s)));
        assert!(is_ignored_slot(36) && is_ignored_slot(39));
        assert!(!is_ignored_slot(40));
    }

    #[test]
    fn test_add_item_fills_storage_then_fails() {
        let mut inventory = Inventory::new();
        for expected in 0..MAIN_SLOTS {
            assert_eq!(inventory.add_item(ItemStack::new(Material::Stone, 1)), Ok(expected));
        }
        assert!(inventory.add_item(ItemStack::new(Material::Dirt, 1)).is_err());
        // off hand is not a storage slot
        assert!(inventory.get(OFF_HAND_SLOT).is_none());
    }

    #[test]
    fn test_set_returns_previous() {
        let mut inventory = Inventory::new();
        assert!(inventory.set(3, Some(ItemStack::new(Material::Stone, 2))).is_none());
        let old = inventory.set(3, None).unwrap();
        assert_eq!(old.amount, 2);
        assert!(inventory.set(99, None).is_none());
    }
}
