use std::collections::BTreeMap;

use super::range::IntRange;
use super::registry::{KeyRegistry, NamespacedKey, RegistryMatcher};
use super::wildcard::WILDCARD;
use crate::config::node::ConfigNode;
use crate::error::CriteriaError;

/// Enchantment requirements read from an `enchants` table.
///
/// ```toml
/// [targets.enchants]
/// sharpness = "3+"
/// "*_protection" = "1-2"
/// "*" = "5"          # any enchantment at level 5
/// ```
///
/// In "all" mode every listed enchantment must be present within its range.
/// In "any" mode one satisfied entry is enough. The `*` entry is checked
/// against every enchantment on the item, separately from the named ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnchantmentMatcher {
    targets: BTreeMap<NamespacedKey, IntRange>,
    global: Option<IntRange>,
    match_any: bool,
}

impl EnchantmentMatcher {
    /// `None` when the table lists nothing.
    pub fn parse(
        node: &ConfigNode<'_>,
        registry: &KeyRegistry,
        match_any: bool,
    ) -> Result<Option<Self>, CriteriaError> {
        let mut targets = BTreeMap::new();
        let mut global = None;

        for key in node.keys() {
            let path = node.path_of(key);
            let range = match node.get_string(key) {
                None => IntRange::ANY,
                Some(text) if text == "true" || text.trim() == WILDCARD => IntRange::ANY,
                Some(text) => IntRange::parse(&text).map_err(|e| {
                    CriteriaError::new(&path, format!("Invalid range for enchant '{}': {}", key, e.reason))
                })?,
            };

            let matcher = RegistryMatcher::parse(&path, registry, &[key])?;
            if matcher.is_any() {
                global = Some(range);
            } else {
                for enchant in matcher.values() {
                    targets.insert(enchant.clone(), range);
                }
            }
        }

        if targets.is_empty() && global.is_none() {
            return Ok(None);
        }
        Ok(Some(Self {
            targets,
            global,
            match_any,
        }))
    }

    pub fn matches(&self, enchants: &BTreeMap<NamespacedKey, u32>) -> bool {
        if let Some(global) = &self.global {
            let met = enchants.values().any(|level| global.contains(*level));
            if self.match_any && met {
                return true;
            }
            if !self.match_any && !met {
                return false;
            }
        }

        if self.targets.is_empty() {
            return !self.match_any;
        }

        let satisfied = |(enchant, range): (&NamespacedKey, &IntRange)| {
            enchants.get(enchant).is_some_and(|level| range.contains(*level))
        };

        if self.match_any {
            self.targets.iter().any(satisfied)
        } else {
            self.targets.iter().all(satisfied)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::registry::KeyRegistries;

    fn parse(src: &str, match_any: bool) -> Option<EnchantmentMatcher> {
        let table: toml::Table = src.parse().unwrap();
        let registries = KeyRegistries::builtin();
        EnchantmentMatcher::parse(&ConfigNode::root(&table), &registries.enchantments, match_any).unwrap()
    }

    fn enchants(list: &[(&str, u32)]) -> BTreeMap<NamespacedKey, u32> {
        list.iter().map(|(k, l)| (NamespacedKey::minecraft(k), *l)).collect()
    }

    #[test]
    fn test_all_mode_requires_every_entry() {
        let matcher = parse("sharpness = \"3+\"\nunbreaking = \"1-3\"", false).unwrap();
        assert!(matcher.matches(&enchants(&[("sharpness", 4), ("unbreaking", 2)])));
        assert!(!matcher.matches(&enchants(&[("sharpness", 4)])));
        assert!(!matcher.matches(&enchants(&[("sharpness", 2), ("unbreaking", 2)])));
    }

    #[test]
    fn test_any_mode_accepts_one_entry() {
        let matcher = parse("sharpness = \"3+\"\nunbreaking = \"1-3\"", true).unwrap();
        assert!(matcher.matches(&enchants(&[("unbreaking", 1)])));
        assert!(!matcher.matches(&enchants(&[("mending", 1)])));
    }

    #[test]
    fn test_global_wildcard_entry() {
        let any = parse("\"*\" = \"5\"", true).unwrap();
        assert!(any.matches(&enchants(&[("efficiency", 5)])));
        assert!(!any.matches(&enchants(&[("efficiency", 4)])));

        let all = parse("\"*\" = \"5\"\nmending = true", false).unwrap();
        assert!(all.matches(&enchants(&[("efficiency", 5), ("mending", 1)])));
        assert!(!all.matches(&enchants(&[("mending", 1)])));
    }

    #[test]
    fn test_glob_keys_expand() {
        let matcher = parse("\"*_protection\" = \"1+\"", true).unwrap();
        assert!(matcher.matches(&enchants(&[("fire_protection", 2)])));
        assert!(!matcher.matches(&enchants(&[("protection", 2)])));
    }

    #[test]
    fn test_empty_table_builds_nothing() {
        assert!(parse("", false).is_none());
    }

    #[test]
    fn test_bad_entries_fail() {
        let registries = KeyRegistries::builtin();
        let bad_range: toml::Table = "sharpness = \"lots\"".parse().unwrap();
        let err = EnchantmentMatcher::parse(&ConfigNode::at(&bad_range, "item.enchants"), &registries.enchantments, false)
            .unwrap_err();
        assert_eq!(err.path, "item.enchants.sharpness");

        let unknown: toml::Table = "sharpnes = \"1\"".parse().unwrap();
        assert!(EnchantmentMatcher::parse(&ConfigNode::root(&unknown), &registries.enchantments, false).is_err());
    }
}
