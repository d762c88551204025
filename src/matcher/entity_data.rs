use super::enum_matcher::EnumMatcher;
use super::item_data::{ItemDataMatcher, parse_data_key};
use super::names::EntityKind;
use super::registry::{KeyRegistries, NamespacedKey};
use crate::config::node::ConfigNode;
use crate::error::CriteriaError;
use crate::item::ItemStack;
use crate::types::context::{EntityAge, EntitySnapshot, Equipment};

/// Per-slot equipment requirements. Unset slots are not checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct EquipmentMatcher {
    mainhand: Option<ItemDataMatcher>,
    offhand: Option<ItemDataMatcher>,
    helmet: Option<ItemDataMatcher>,
    chestplate: Option<ItemDataMatcher>,
    leggings: Option<ItemDataMatcher>,
    boots: Option<ItemDataMatcher>,
}

impl EquipmentMatcher {
    fn parse(node: &ConfigNode<'_>, registries: &KeyRegistries) -> Result<Self, CriteriaError> {
        let slot = |name: &str| {
            node.get_subsection(name)
                .map(|s| ItemDataMatcher::parse(&s, registries))
                .transpose()
        };
        Ok(Self {
            mainhand: slot("mainhand")?,
            offhand: slot("offhand")?,
            helmet: slot("helmet")?,
            chestplate: slot("chestplate")?,
            leggings: slot("leggings")?,
            boots: slot("boots")?,
        })
    }

    fn matches(&self, equipment: &Equipment) -> bool {
        let check = |matcher: &Option<ItemDataMatcher>, item: &Option<ItemStack>| {
            matcher.as_ref().is_none_or(|m| m.matches_opt(item.as_ref()))
        };
        check(&self.mainhand, &equipment.mainhand)
            && check(&self.offhand, &equipment.offhand)
            && check(&self.helmet, &equipment.helmet)
            && check(&self.chestplate, &equipment.chestplate)
            && check(&self.leggings, &equipment.leggings)
            && check(&self.boots, &equipment.boots)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum EntityCheck {
    Kind(EnumMatcher<EntityKind>),
    Age(EntityAge),
    Equipment(Box<EquipmentMatcher>),
    Monster,
    Data(NamespacedKey),
}

impl EntityCheck {
    fn matches(&self, entity: &EntitySnapshot) -> bool {
        match self {
            EntityCheck::Kind(m) => m.matches(entity.kind),
            EntityCheck::Age(age) => entity.age == Some(*age),
            EntityCheck::Equipment(m) => entity.equipment.as_ref().is_some_and(|eq| m.matches(eq)),
            EntityCheck::Monster => entity.kind.is_monster(),
            EntityCheck::Data(key) => entity.data.has(key),
        }
    }
}

/// Conjunction of optional entity checks. Keys:
/// `types`, `adult` / `baby`, `equipment.<slot>`, `monster`, `pdc`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityDataMatcher {
    checks: Vec<EntityCheck>,
}

impl EntityDataMatcher {
    pub fn parse(node: &ConfigNode<'_>, registries: &KeyRegistries) -> Result<Self, CriteriaError> {
        let mut checks = Vec::new();

        let types = node.get_string_list("types");
        if !types.is_empty() {
            checks.push(EntityCheck::Kind(EnumMatcher::parse(&node.path_of("types"), &types)?));
        }

        let adult = node.get_bool_or("adult", false);
        let baby = node.get_bool_or("baby", false);
        if adult && baby {
            return Err(CriteriaError::new(
                node.path(),
                "Cannot have both 'adult' and 'baby' set to true.",
            ));
        }
        if adult {
            checks.push(EntityCheck::Age(EntityAge::Adult));
        }
        if baby {
            checks.push(EntityCheck::Age(EntityAge::Baby));
        }

        if let Some(section) = node.get_subsection("equipment") {
            let equipment = EquipmentMatcher::parse(&section, registries)?;
            checks.push(EntityCheck::Equipment(Box::new(equipment)));
        }

        if node.get_bool_or("monster", false) {
            checks.push(EntityCheck::Monster);
        }

        let path = node.path_of("pdc");
        for key in node.get_string_list("pdc") {
            checks.push(EntityCheck::Data(parse_data_key(&path, &key)?));
        }

        Ok(Self { checks })
    }

    pub fn matches(&self, entity: &EntitySnapshot) -> bool {
        self.checks.iter().all(|c| c.matches(entity))
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}
