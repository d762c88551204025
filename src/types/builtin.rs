//! Built-in mission types
//!
//! Registered from an explicit list by [`register_builtin_types`].

use std::sync::Arc;

use super::context::{ContextKind, MissionContext};
use super::registry::TypeRegistry;
use super::{MissionTarget, MissionType, TargetedMissionType};
use crate::config::node::ConfigNode;
use crate::error::{CriteriaError, RegistryError};
use crate::matcher::{
    EnchantmentMatcher, EntityDataMatcher, EnumMatcher, ItemDataMatcher, KeyRegistries, Material,
    RegistryMatcher,
};

type TargetParser = fn(&ConfigNode<'_>, &KeyRegistries) -> Result<Arc<dyn MissionTarget>, CriteriaError>;

/// A targeted type defined by an id, its context kind and a target parser.
struct BuiltinType {
    id: &'static str,
    kind: ContextKind,
    parser: TargetParser,
}

impl TargetedMissionType for BuiltinType {
    fn id(&self) -> &str {
        self.id
    }

    fn context_kind(&self) -> ContextKind {
        self.kind
    }

    fn parse(
        &self,
        node: &ConfigNode<'_>,
        registries: &KeyRegistries,
    ) -> Result<Arc<dyn MissionTarget>, CriteriaError> {
        (self.parser)(node, registries)
    }
}

fn targeted(id: &'static str, kind: ContextKind, parser: TargetParser) -> MissionType {
    MissionType::targeted(BuiltinType { id, kind, parser })
}

pub fn break_type() -> MissionType {
    targeted("break", ContextKind::Block, parse_material_target)
}

/// Every built-in type, simple ones first.
pub fn builtin_types() -> Vec<MissionType> {
    vec![
        MissionType::simple("walk"),
        MissionType::simple("glide"),
        MissionType::simple("swim"),
        MissionType::simple("xp"),
        break_type(),
        targeted("place", ContextKind::Block, parse_material_target),
        targeted("harvest", ContextKind::Block, parse_material_target),
        targeted("smelt", ContextKind::Smelt, parse_material_target),
        targeted("kill", ContextKind::EntityKill, parse_kill_target),
        targeted("damage", ContextKind::EntityDamage, parse_damage_target),
        targeted("breed", ContextKind::Entity, parse_entity_target),
        targeted("milk", ContextKind::Entity, parse_entity_target),
        targeted("fish", ContextKind::Item, parse_item_target),
        targeted("craft", ContextKind::Item, parse_item_target),
        targeted("trade", ContextKind::Item, parse_item_target),
        targeted("repair", ContextKind::Item, parse_item_target),
        targeted("disenchant", ContextKind::Item, parse_item_target),
        targeted("brew", ContextKind::Item, parse_potion_target),
        targeted("potion", ContextKind::Item, parse_potion_target),
        targeted("enchant", ContextKind::Enchant, parse_enchant_target),
    ]
}

pub fn register_builtin_types(registry: &TypeRegistry) -> Result<(), RegistryError> {
    for mission_type in builtin_types() {
        registry.register(mission_type)?;
    }
    Ok(())
}

// ============================================================================
// Shared section helpers
// ============================================================================

fn item_section(node: &ConfigNode<'_>, key: &str, registries: &KeyRegistries) -> Result<Option<ItemDataMatcher>, CriteriaError> {
    node.get_subsection(key)
        .map(|s| ItemDataMatcher::parse(&s, registries))
        .transpose()
}

fn entity_section(node: &ConfigNode<'_>, registries: &KeyRegistries) -> Result<Option<EntityDataMatcher>, CriteriaError> {
    node.get_subsection("entity")
        .map(|s| EntityDataMatcher::parse(&s, registries))
        .transpose()
}

// ============================================================================
// Targets
// ============================================================================

/// break, place, harvest, smelt
#[derive(Debug)]
struct MaterialTarget {
    materials: EnumMatcher<Material>,
}

impl MissionTarget for MaterialTarget {
    fn matches(&self, context: &MissionContext) -> bool {
        context.material().is_some_and(|m| self.materials.matches(m))
    }
}

fn parse_material_target(node: &ConfigNode<'_>, _: &KeyRegistries) -> Result<Arc<dyn MissionTarget>, CriteriaError> {
    let materials = EnumMatcher::parse(&node.path_of("materials"), &node.get_string_list("materials"))?;
    Ok(Arc::new(MaterialTarget { materials }))
}

/// kill
#[derive(Debug)]
struct KillTarget {
    entity: Option<EntityDataMatcher>,
    weapon: Option<ItemDataMatcher>,
    drops: Vec<ItemDataMatcher>,
}

impl MissionTarget for KillTarget {
    fn matches(&self, context: &MissionContext) -> bool {
        let MissionContext::EntityKill { entity, weapon, drops } = context else {
            return false;
        };
        if self.entity.as_ref().is_some_and(|m| !m.matches(entity)) {
            return false;
        }
        if self.weapon.as_ref().is_some_and(|m| !m.matches_opt(weapon.as_ref())) {
            return false;
        }
        // each drop matcher needs at least one matching drop
        self.drops.iter().all(|m| drops.iter().any(|d| m.matches(d)))
    }
}

fn parse_kill_target(node: &ConfigNode<'_>, registries: &KeyRegistries) -> Result<Arc<dyn MissionTarget>, CriteriaError> {
    let mut drops = Vec::new();
    if let Some(section) = node.get_subsection("drops") {
        for key in section.keys() {
            let drop = section.get_subsection(key).ok_or_else(|| {
                CriteriaError::new(section.path_of(key), format!("Section '{}' is not a valid section", key))
            })?;
            drops.push(ItemDataMatcher::parse(&drop, registries)?);
        }
    }

    Ok(Arc::new(KillTarget {
        entity: entity_section(node, registries)?,
        weapon: item_section(node, "item", registries)?,
        drops,
    }))
}

/// damage
#[derive(Debug)]
struct DamageTarget {
    entity: Option<EntityDataMatcher>,
    weapon: Option<ItemDataMatcher>,
}

impl MissionTarget for DamageTarget {
    fn matches(&self, context: &MissionContext) -> bool {
        let MissionContext::EntityDamage { entity, weapon } = context else {
            return false;
        };
        self.entity.as_ref().is_none_or(|m| m.matches(entity))
            && self.weapon.as_ref().is_none_or(|m| m.matches_opt(weapon.as_ref()))
    }
}

fn parse_damage_target(node: &ConfigNode<'_>, registries: &KeyRegistries) -> Result<Arc<dyn MissionTarget>, CriteriaError> {
    Ok(Arc::new(DamageTarget {
        entity: entity_section(node, registries)?,
        weapon: item_section(node, "item", registries)?,
    }))
}

/// breed, milk
#[derive(Debug)]
struct EntityTarget {
    entity: Option<EntityDataMatcher>,
}

impl MissionTarget for EntityTarget {
    fn matches(&self, context: &MissionContext) -> bool {
        let Some(entity) = context.entity() else {
            return false;
        };
        self.entity.as_ref().is_none_or(|m| m.matches(entity))
    }
}

fn parse_entity_target(node: &ConfigNode<'_>, registries: &KeyRegistries) -> Result<Arc<dyn MissionTarget>, CriteriaError> {
    Ok(Arc::new(EntityTarget {
        entity: entity_section(node, registries)?,
    }))
}

/// fish, craft, trade, repair, disenchant
#[derive(Debug)]
struct ItemTarget {
    item: Option<ItemDataMatcher>,
}

impl MissionTarget for ItemTarget {
    fn matches(&self, context: &MissionContext) -> bool {
        let Some(item) = context.item_stack() else {
            return false;
        };
        self.item.as_ref().is_none_or(|m| m.matches(item))
    }
}

fn parse_item_target(node: &ConfigNode<'_>, registries: &KeyRegistries) -> Result<Arc<dyn MissionTarget>, CriteriaError> {
    Ok(Arc::new(ItemTarget {
        item: item_section(node, "item", registries)?,
    }))
}

/// brew, potion: the item must carry at least one listed effect
#[derive(Debug)]
struct PotionTarget {
    item: Option<ItemDataMatcher>,
    effects: RegistryMatcher,
}

impl MissionTarget for PotionTarget {
    fn matches(&self, context: &MissionContext) -> bool {
        let Some(item) = context.item_stack() else {
            return false;
        };
        if self.item.as_ref().is_some_and(|m| !m.matches(item)) {
            return false;
        }
        self.effects.is_any() || item.effects.iter().any(|e| self.effects.matches(e))
    }
}

fn parse_potion_target(node: &ConfigNode<'_>, registries: &KeyRegistries) -> Result<Arc<dyn MissionTarget>, CriteriaError> {
    let effects = RegistryMatcher::parse(
        &node.path_of("effects"),
        &registries.effects,
        &node.get_string_list("effects"),
    )?;
    Ok(Arc::new(PotionTarget {
        item: item_section(node, "item", registries)?,
        effects,
    }))
}

/// enchant
#[derive(Debug)]
struct EnchantTarget {
    enchants: Option<EnchantmentMatcher>,
    item: Option<ItemDataMatcher>,
    ignore_anvil: bool,
}

impl MissionTarget for EnchantTarget {
    fn matches(&self, context: &MissionContext) -> bool {
        let MissionContext::Enchant { item, enchants, anvil } = context else {
            return false;
        };
        if self.ignore_anvil && *anvil {
            return false;
        }
        if self.item.as_ref().is_some_and(|m| !m.matches(item)) {
            return false;
        }
        self.enchants.as_ref().is_none_or(|m| m.matches(enchants))
    }
}

fn parse_enchant_target(node: &ConfigNode<'_>, registries: &KeyRegistries) -> Result<Arc<dyn MissionTarget>, CriteriaError> {
    let match_any = node.get_bool_or("match_any_enchant", false);
    let enchants = match node.get_subsection("enchants") {
        Some(section) => EnchantmentMatcher::parse(&section, &registries.enchantments, match_any)?,
        None => None,
    };
    Ok(Arc::new(EnchantTarget {
        enchants,
        item: item_section(node, "item", registries)?,
        ignore_anvil: node.get_bool_or("ignore_anvil", false),
    }))
}
