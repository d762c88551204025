//! Namespaced keys and open registries
//!
//! Enchantments, potion effects and similar content are identified by
//! `namespace:name` keys supplied by the host rather than a closed enum.

use std::collections::BTreeSet;
use std::fmt;

use super::wildcard;
use crate::error::CriteriaError;

pub const DEFAULT_NAMESPACE: &str = "minecraft";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespacedKey {
    namespace: String,
    key: String,
}

impl NamespacedKey {
    pub fn new(namespace: &str, key: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            key: key.to_string(),
        }
    }

    pub fn minecraft(key: &str) -> Self {
        Self::new(DEFAULT_NAMESPACE, key)
    }

    /// Parse `namespace:key` or a bare `key` in the default namespace.
    /// Returns `None` for empty parts or characters outside `[a-z0-9._-]` (`/` allowed in the key).
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (namespace, key) = match text.split_once(':') {
            Some((ns, key)) => (ns, key),
            None => (DEFAULT_NAMESPACE, text),
        };

        let valid_ns = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || "._-".contains(c);
        let valid_key = |c: char| valid_ns(c) || c == '/';

        if namespace.is_empty() || key.is_empty() {
            return None;
        }
        if !namespace.chars().all(valid_ns) || !key.chars().all(valid_key) {
            return None;
        }
        Some(Self::new(namespace, key))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Key without the namespace when it is the default one.
    pub fn minimal(&self) -> String {
        if self.namespace == DEFAULT_NAMESPACE {
            self.key.clone()
        } else {
            self.to_string()
        }
    }
}

impl fmt::Display for NamespacedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.key)
    }
}

// ============================================================================
// Registries
// ============================================================================

/// A named set of keys provided by the host.
#[derive(Debug, Clone, Default)]
pub struct KeyRegistry {
    name: String,
    keys: BTreeSet<NamespacedKey>,
}

impl KeyRegistry {
    pub fn new(name: &str, keys: impl IntoIterator<Item = NamespacedKey>) -> Self {
        Self {
            name: name.to_string(),
            keys: keys.into_iter().collect(),
        }
    }

    fn vanilla(name: &str, keys: &[&str]) -> Self {
        Self::new(name, keys.iter().map(|k| NamespacedKey::minecraft(k)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn insert(&mut self, key: NamespacedKey) -> bool {
        self.keys.insert(key)
    }

    pub fn contains(&self, key: &NamespacedKey) -> bool {
        self.keys.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamespacedKey> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// The registries mission targets resolve keys against.
#[derive(Debug, Clone)]
pub struct KeyRegistries {
    pub enchantments: KeyRegistry,
    pub effects: KeyRegistry,
}

impl KeyRegistries {
    /// Vanilla content.
    pub fn builtin() -> Self {
        Self {
            enchantments: KeyRegistry::vanilla(
                "Enchantment",
                &[
                    "protection",
                    "fire_protection",
                    "blast_protection",
                    "projectile_protection",
                    "feather_falling",
                    "thorns",
                    "respiration",
                    "aqua_affinity",
                    "sharpness",
                    "smite",
                    "bane_of_arthropods",
                    "knockback",
                    "fire_aspect",
                    "looting",
                    "sweeping_edge",
                    "efficiency",
                    "silk_touch",
                    "unbreaking",
                    "fortune",
                    "power",
                    "punch",
                    "flame",
                    "infinity",
                    "luck_of_the_sea",
                    "lure",
                    "mending",
                ],
            ),
            effects: KeyRegistry::vanilla(
                "MobEffect",
                &[
                    "speed",
                    "slowness",
                    "haste",
                    "strength",
                    "instant_health",
                    "instant_damage",
                    "jump_boost",
                    "regeneration",
                    "resistance",
                    "fire_resistance",
                    "water_breathing",
                    "invisibility",
                    "night_vision",
                    "weakness",
                    "poison",
                    "wither",
                    "luck",
                    "slow_falling",
                ],
            ),
        }
    }
}

impl Default for KeyRegistries {
    fn default() -> Self {
        Self::builtin()
    }
}

// ============================================================================
// Matcher
// ============================================================================

/// Set-membership matcher over keys of an open registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryMatcher {
    values: BTreeSet<NamespacedKey>,
    any: bool,
}

impl RegistryMatcher {
    pub fn any() -> Self {
        Self {
            values: BTreeSet::new(),
            any: true,
        }
    }

    pub fn parse<S: AsRef<str>>(
        path: &str,
        registry: &KeyRegistry,
        targets: &[S],
    ) -> Result<Self, CriteriaError> {
        if targets.is_empty() || targets.iter().any(|t| t.as_ref().trim() == wildcard::WILDCARD) {
            return Ok(Self::any());
        }

        let mut values = BTreeSet::new();
        for target in targets {
            let token = target.as_ref().trim().to_ascii_lowercase();

            if wildcard::is_pattern(&token) {
                let mut found = false;
                for key in registry.iter() {
                    if wildcard::matches(&token, &key.minimal()) {
                        values.insert(key.clone());
                        found = true;
                    }
                }
                if !found {
                    return Err(CriteriaError::new(
                        path,
                        format!("Wildcard '{}' did not match any existing {}", token, registry.name()),
                    ));
                }
                continue;
            }

            let key = NamespacedKey::parse(&token).ok_or_else(|| {
                CriteriaError::new(
                    path,
                    format!("Invalid NamespacedKey format: '{}'. Must be 'namespace:key'.", token),
                )
            })?;
            if !registry.contains(&key) {
                return Err(CriteriaError::new(
                    path,
                    format!("Invalid registry key: '{}' in {}", key, registry.name()),
                ));
            }
            values.insert(key);
        }

        Ok(Self { values, any: false })
    }

    pub fn matches(&self, key: &NamespacedKey) -> bool {
        self.any || self.values.contains(key)
    }

    pub fn is_any(&self) -> bool {
        self.any
    }

    pub fn values(&self) -> &BTreeSet<NamespacedKey> {
        &self.values
    }
}
