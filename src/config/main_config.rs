//! Main Config
//!
//! `config.toml` at the root of the data directory.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{ConfigError, with_context};

/// File shape as written on disk
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMainConfig {
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub mission: RawMissionSettings,
    pub categories: Option<BTreeMap<String, i64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMissionSettings {
    pub cache_slots: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionSettings {
    /// Index mission slots per player instead of scanning the inventory.
    pub cache_slots: bool,
}

impl Default for MissionSettings {
    fn default() -> Self {
        Self { cache_slots: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainConfig {
    pub debug: bool,
    pub mission: MissionSettings,
    /// Category -> draw weight
    pub categories: BTreeMap<String, i64>,
}

impl Default for MainConfig {
    /// Placeholder used until the first load; has no categories.
    fn default() -> Self {
        Self {
            debug: false,
            mission: MissionSettings::default(),
            categories: BTreeMap::new(),
        }
    }
}

impl MainConfig {
    pub fn from_raw(raw: RawMainConfig) -> Result<Self, ConfigError> {
        let categories = with_context("Section: categories", || {
            let categories = raw
                .categories
                .ok_or_else(|| ConfigError::new("Section is missing"))?;

            if categories.is_empty() {
                return Err(ConfigError::new("You must have at least one category"));
            }
            if let Some((name, _)) = categories.iter().find(|(_, w)| **w < 0) {
                return Err(ConfigError::new(format!(
                    "Category '{}' cannot have negative weight",
                    name
                )));
            }
            Ok(categories)
        })?;

        Ok(Self {
            debug: raw.debug,
            mission: MissionSettings {
                cache_slots: raw.mission.cache_slots.unwrap_or(true),
            },
            categories,
        })
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Result<MainConfig, ConfigError> {
        let raw: RawMainConfig = toml::from_str(src).unwrap();
        MainConfig::from_raw(raw)
    }

    #[test]
    fn test_defaults() {
        let config = parse("[categories]\nmining = 3\ncombat = 1\n").unwrap();
        assert!(!config.debug);
        assert!(config.mission.cache_slots);
        assert_eq!(config.categories.get("mining"), Some(&3));
        assert!(config.has_category("combat"));
    }

    #[test]
    fn test_cache_slots_can_be_disabled() {
        let config = parse("debug = true\n[mission]\ncache_slots = false\n[categories]\na = 1\n").unwrap();
        assert!(config.debug);
        assert!(!config.mission.cache_slots);
    }

    #[test]
    fn test_category_validation() {
        let err = parse("").unwrap_err();
        assert_eq!(err.to_string(), "Section: categories > Section is missing");

        let err = parse("[categories]\n").unwrap_err();
        assert_eq!(err.message(), "You must have at least one category");

        let err = parse("[categories]\nmining = -2\n").unwrap_err();
        assert_eq!(err.message(), "Category 'mining' cannot have negative weight");
    }
}
