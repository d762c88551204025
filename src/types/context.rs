//! Mission Contexts
//!
//! Runtime snapshot of whatever triggered a progress attempt. Each targeted
//! mission type declares the context kind it needs; [`ContextKind::satisfies`]
//! is the compatibility table used before a target is evaluated.

use std::collections::BTreeMap;

use crate::item::{ItemStack, PersistentData};
use crate::matcher::names::{EntityKind, Material};
use crate::matcher::registry::NamespacedKey;

// ============================================================================
// Snapshots
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityAge {
    Adult,
    Baby,
}

/// Worn and held items of a living entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Equipment {
    pub mainhand: Option<ItemStack>,
    pub offhand: Option<ItemStack>,
    pub helmet: Option<ItemStack>,
    pub chestplate: Option<ItemStack>,
    pub leggings: Option<ItemStack>,
    pub boots: Option<ItemStack>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySnapshot {
    pub kind: EntityKind,
    /// `None` for entities that do not age
    pub age: Option<EntityAge>,
    /// `None` for non-living entities
    pub equipment: Option<Equipment>,
    pub data: PersistentData,
}

impl EntitySnapshot {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            age: None,
            equipment: None,
            data: PersistentData::new(),
        }
    }

    pub fn with_age(mut self, age: EntityAge) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_equipment(mut self, equipment: Equipment) -> Self {
        self.equipment = Some(equipment);
        self
    }
}

// ============================================================================
// Context
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    Block,
    Entity,
    EntityKill,
    EntityDamage,
    Item,
    Enchant,
    Smelt,
}

impl ContextKind {
    /// Whether a context of kind `self` can be used where `required` is expected.
    pub fn satisfies(self, required: ContextKind) -> bool {
        self == required
            || matches!(
                (self, required),
                (ContextKind::EntityKill, ContextKind::Entity)
                    | (ContextKind::EntityDamage, ContextKind::Entity)
                    | (ContextKind::Enchant, ContextKind::Item)
            )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContextKind::Block => "block",
            ContextKind::Entity => "entity",
            ContextKind::EntityKill => "entity_kill",
            ContextKind::EntityDamage => "entity_damage",
            ContextKind::Item => "item",
            ContextKind::Enchant => "enchant",
            ContextKind::Smelt => "smelt",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissionContext {
    Block {
        material: Material,
    },
    Entity {
        entity: EntitySnapshot,
    },
    EntityKill {
        entity: EntitySnapshot,
        weapon: Option<ItemStack>,
        drops: Vec<ItemStack>,
    },
    EntityDamage {
        entity: EntitySnapshot,
        weapon: Option<ItemStack>,
    },
    Item {
        item: ItemStack,
    },
    Enchant {
        item: ItemStack,
        enchants: BTreeMap<NamespacedKey, u32>,
        anvil: bool,
    },
    Smelt {
        /// Material of the smelted result
        material: Material,
    },
}

impl MissionContext {
    pub fn kind(&self) -> ContextKind {
        match self {
            MissionContext::Block { .. } => ContextKind::Block,
            MissionContext::Entity { .. } => ContextKind::Entity,
            MissionContext::EntityKill { .. } => ContextKind::EntityKill,
            MissionContext::EntityDamage { .. } => ContextKind::EntityDamage,
            MissionContext::Item { .. } => ContextKind::Item,
            MissionContext::Enchant { .. } => ContextKind::Enchant,
            MissionContext::Smelt { .. } => ContextKind::Smelt,
        }
    }

    pub fn block(material: Material) -> Self {
        MissionContext::Block { material }
    }

    pub fn item(item: ItemStack) -> Self {
        MissionContext::Item { item }
    }

    /// The entity, for any entity-bearing context.
    pub fn entity(&self) -> Option<&EntitySnapshot> {
        match self {
            MissionContext::Entity { entity }
            | MissionContext::EntityKill { entity, .. }
            | MissionContext::EntityDamage { entity, .. } => Some(entity),
            _ => None,
        }
    }

    /// The item, for any item-bearing context.
    pub fn item_stack(&self) -> Option<&ItemStack> {
        match self {
            MissionContext::Item { item } | MissionContext::Enchant { item, .. } => Some(item),
            _ => None,
        }
    }

    pub fn material(&self) -> Option<Material> {
        match self {
            MissionContext::Block { material } | MissionContext::Smelt { material } => Some(*material),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compatibility_table() {
        assert!(ContextKind::Block.satisfies(ContextKind::Block));
        assert!(ContextKind::EntityKill.satisfies(ContextKind::Entity));
        assert!(ContextKind::EntityDamage.satisfies(ContextKind::Entity));
        assert!(ContextKind::Enchant.satisfies(ContextKind::Item));
        assert!(!ContextKind::Entity.satisfies(ContextKind::EntityKill));
        assert!(!ContextKind::Item.satisfies(ContextKind::Block));
        assert!(!ContextKind::Smelt.satisfies(ContextKind::Block));
    }

    #[test]
    fn test_accessors_follow_kind() {
        let kill = MissionContext::EntityKill {
            entity: EntitySnapshot::new(EntityKind::Zombie),
            weapon: None,
            drops: vec![],
        };
        assert_eq!(kill.entity().map(|e| e.kind), Some(EntityKind::Zombie));
        assert!(kill.item_stack().is_none());

        let block = MissionContext::block(Material::Stone);
        assert_eq!(block.material(), Some(Material::Stone));
        assert!(block.entity().is_none());
    }
}
