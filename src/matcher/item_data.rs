use std::collections::BTreeSet;

use super::enchant::EnchantmentMatcher;
use super::enum_matcher::EnumMatcher;
use super::names::{Material, PotionType};
use super::range::IntRange;
use super::registry::{KeyRegistries, NamespacedKey};
use crate::config::node::ConfigNode;
use crate::error::CriteriaError;
use crate::item::ItemStack;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ItemCheck {
    Material(EnumMatcher<Material>),
    Potion(EnumMatcher<PotionType>),
    Model(BTreeSet<NamespacedKey>),
    Enchants(EnchantmentMatcher),
    Amount(IntRange),
    Data(NamespacedKey),
}

impl ItemCheck {
    fn matches(&self, item: &ItemStack) -> bool {
        match self {
            ItemCheck::Material(m) => m.matches(item.material),
            ItemCheck::Potion(m) => item.potion.is_some_and(|p| m.matches(p)),
            ItemCheck::Model(models) => item.model.as_ref().is_some_and(|k| models.contains(k)),
            ItemCheck::Enchants(m) => m.matches(&item.enchants),
            ItemCheck::Amount(range) => range.contains(item.amount),
            ItemCheck::Data(key) => item.data.has(key),
        }
    }
}

/// Conjunction of optional item checks. Keys:
/// `materials`, `potion_types`, `item_models`, `enchants` (+ `match_any_enchant`),
/// `amount`, `pdc`. No keys means any item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDataMatcher {
    checks: Vec<ItemCheck>,
}

impl ItemDataMatcher {
    pub fn parse(node: &ConfigNode<'_>, registries: &KeyRegistries) -> Result<Self, CriteriaError> {
        let mut checks = Vec::new();

        let materials = node.get_string_list("materials");
        if !materials.is_empty() {
            checks.push(ItemCheck::Material(EnumMatcher::parse(
                &node.path_of("materials"),
                &materials,
            )?));
        }

        let potions = node.get_string_list("potion_types");
        if !potions.is_empty() {
            checks.push(ItemCheck::Potion(EnumMatcher::parse(
                &node.path_of("potion_types"),
                &potions,
            )?));
        }

        let models = node.get_string_list("item_models");
        if !models.is_empty() {
            let path = node.path_of("item_models");
            let keys = models
                .iter()
                .map(|m| parse_data_key(&path, m))
                .collect::<Result<BTreeSet<_>, _>>()?;
            checks.push(ItemCheck::Model(keys));
        }

        if let Some(section) = node.get_subsection("enchants") {
            let match_any = node.get_bool_or("match_any_enchant", false);
            if let Some(enchants) = EnchantmentMatcher::parse(&section, &registries.enchantments, match_any)? {
                checks.push(ItemCheck::Enchants(enchants));
            }
        }

        if let Some(amount) = node.get_string("amount") {
            let range = IntRange::parse(&amount)
                .map_err(|e| CriteriaError::new(node.path_of("amount"), e.reason))?;
            checks.push(ItemCheck::Amount(range));
        }

        let path = node.path_of("pdc");
        for key in node.get_string_list("pdc") {
            checks.push(ItemCheck::Data(parse_data_key(&path, &key)?));
        }

        Ok(Self { checks })
    }

    pub fn matches(&self, item: &ItemStack) -> bool {
        self.checks.iter().all(|c| c.matches(item))
    }

    /// Missing items never match, even with no checks configured.
    pub fn matches_opt(&self, item: Option<&ItemStack>) -> bool {
        item.is_some_and(|i| self.matches(i))
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

/// A `namespace:key` value from config; the namespace is mandatory.
pub(crate) fn parse_data_key(path: &str, text: &str) -> Result<NamespacedKey, CriteriaError> {
    let text = text.trim();
    if !text.contains(':') {
        return Err(invalid_key(path, text));
    }
    NamespacedKey::parse(text).ok_or_else(|| invalid_key(path, text))
}

fn invalid_key(path: &str, text: &str) -> CriteriaError {
    CriteriaError::new(
        path,
        format!("Invalid NamespacedKey format: '{}'. Must be 'namespace:key'.", text),
    )
}
