//! Default Templates
//!
//! `missions/defaults.toml` holds the templates missions inherit from. The
//! `[default]` table is the root and must define every essential field;
//! other tables are named templates that only set what they change and are
//! resolved against the root with [`DefaultTemplate::inherit_from`].

use crate::config::node::ConfigNode;
use crate::error::ConfigError;
use crate::matcher::names::{Material, NamedVariant, Rarity};
use crate::matcher::range::IntRange;
use crate::matcher::registry::NamespacedKey;

/// Name of the root template.
pub const ROOT_TEMPLATE: &str = "default";

/// A partially populated mission definition. `None` means "not specified".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultTemplate {
    pub name: Option<String>,
    pub completed_name: Option<String>,
    pub lore: Option<Vec<String>>,
    pub completed_lore: Option<Vec<String>>,
    pub requirement_range: Option<String>,
    pub category: Option<String>,
    pub item_rarity: Option<Rarity>,
    pub item_material: Option<Material>,
    pub item_model: Option<NamespacedKey>,
    pub completed_item_model: Option<NamespacedKey>,
    /// Raw `custom_options` section, parsed per mission
    pub options: Option<toml::Table>,
    pub rewards: Option<Vec<String>>,
    pub blacklisted_worlds: Option<Vec<String>>,
}

impl DefaultTemplate {
    /// Parse the root template. Every essential field must be present.
    pub fn parse_base(node: &ConfigNode<'_>) -> Result<Self, ConfigError> {
        let mut template = Self::read(node)?;

        let missing = [
            ("name", template.name.is_none()),
            ("requirement_range", template.requirement_range.is_none()),
            ("category", template.category.is_none()),
            ("item_material", template.item_material.is_none()),
            ("item_rarity", template.item_rarity.is_none()),
        ];
        if let Some((field, _)) = missing.iter().find(|(_, absent)| *absent) {
            return Err(ConfigError::new(format!("Missing field: {}", node.path_of(field))));
        }

        if template.completed_name.is_none() {
            template.completed_name = template.name.clone();
        }
        Ok(template)
    }

    /// Parse a named template. Any field may be absent, but not all of them.
    pub fn parse(node: &ConfigNode<'_>) -> Result<Self, ConfigError> {
        let template = Self::read(node)?;
        if template == Self::default() {
            return Err(ConfigError::new(format!(
                "Template '{}' does not set any field",
                node.name()
            )));
        }
        Ok(template)
    }

    /// Copy of `self` with every unset field taken from `parent`.
    pub fn inherit_from(&self, parent: &DefaultTemplate) -> DefaultTemplate {
        fn pick<T: Clone>(own: &Option<T>, parent: &Option<T>) -> Option<T> {
            own.as_ref().or(parent.as_ref()).cloned()
        }

        DefaultTemplate {
            name: pick(&self.name, &parent.name),
            completed_name: pick(&self.completed_name, &parent.completed_name),
            lore: pick(&self.lore, &parent.lore),
            completed_lore: pick(&self.completed_lore, &parent.completed_lore),
            requirement_range: pick(&self.requirement_range, &parent.requirement_range),
            category: pick(&self.category, &parent.category),
            item_rarity: pick(&self.item_rarity, &parent.item_rarity),
            item_material: pick(&self.item_material, &parent.item_material),
            item_model: pick(&self.item_model, &parent.item_model),
            completed_item_model: pick(&self.completed_item_model, &parent.completed_item_model),
            options: pick(&self.options, &parent.options),
            rewards: pick(&self.rewards, &parent.rewards),
            blacklisted_worlds: pick(&self.blacklisted_worlds, &parent.blacklisted_worlds),
        }
    }

    fn read(node: &ConfigNode<'_>) -> Result<Self, ConfigError> {
        let requirement_range = node.get_non_blank("requirement_range");
        if let Some(text) = &requirement_range {
            parse_requirement(text)?;
        }

        Ok(Self {
            name: node.get_non_blank("name"),
            completed_name: node.get_non_blank("completed_name"),
            lore: node.get_list("lore"),
            completed_lore: node.get_list("completed_lore"),
            requirement_range,
            category: node.get_non_blank("category"),
            item_rarity: parse_rarity(node)?,
            item_material: parse_material(node)?,
            item_model: parse_model(node, "item_model")?,
            completed_item_model: parse_model(node, "completed_item_model")?,
            options: node.get_subsection("custom_options").map(|n| n.table().clone()),
            rewards: node.get_list("rewards"),
            blacklisted_worlds: node.get_list("blacklisted_worlds"),
        })
    }
}

// ============================================================================
// Field parsers shared with mission configs
// ============================================================================

pub(crate) fn parse_requirement(text: &str) -> Result<IntRange, ConfigError> {
    IntRange::parse(text).map_err(|e| {
        ConfigError::new(format!("Invalid requirement_range '{}': {}", text, e.reason))
    })
}

pub(crate) fn parse_rarity(node: &ConfigNode<'_>) -> Result<Option<Rarity>, ConfigError> {
    let Some(text) = node.get_non_blank("item_rarity") else {
        return Ok(None);
    };
    Rarity::from_name(&text)
        .map(Some)
        .ok_or_else(|| ConfigError::new(format!("Invalid {}: {}", Rarity::KIND, text)))
}

pub(crate) fn parse_material(node: &ConfigNode<'_>) -> Result<Option<Material>, ConfigError> {
    let Some(text) = node.get_non_blank("item_material") else {
        return Ok(None);
    };
    Material::parse(&text)
        .map(Some)
        .ok_or_else(|| ConfigError::new(format!("Invalid {}: {}", Material::KIND, text)))
}

/// Blank values count as unset.
pub(crate) fn parse_model(
    node: &ConfigNode<'_>,
    key: &str,
) -> Result<Option<NamespacedKey>, ConfigError> {
    let Some(text) = node.get_non_blank(key) else {
        return Ok(None);
    };
    NamespacedKey::parse(&text)
        .map(Some)
        .ok_or_else(|| ConfigError::new(format!("Invalid {} '{}'", key, text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: &str = r#"
[default]
name = "<type_cap> mission"
lore = ["<progress>/<requirement>"]
completed_lore = ["[LORE!]", "Done!"]
requirement_range = "10-20"
category = "common"
item_material = "PAPER"
item_rarity = "common"
rewards = ["give <player> diamond 1"]

[hard]
requirement_range = "50+"
item_rarity = "EPIC"

[empty]
"#;

    fn templates() -> toml::Table {
        DEFAULTS.parse().unwrap()
    }

    fn node<'a>(table: &'a toml::Table, name: &str) -> ConfigNode<'a> {
        ConfigNode::root(table).get_subsection(name).unwrap()
    }

    #[test]
    fn test_parse_base() {
        let table = templates();
        let root = DefaultTemplate::parse_base(&node(&table, "default")).unwrap();
        assert_eq!(root.name.as_deref(), Some("<type_cap> mission"));
        assert_eq!(root.completed_name, root.name);
        assert_eq!(root.item_material, Some(Material::Paper));
        assert_eq!(root.item_rarity, Some(Rarity::Common));
        assert!(root.item_model.is_none());
    }

    #[test]
    fn test_parse_base_requires_essentials() {
        let table: toml::Table = "[default]\nname = \"x\"\ncategory = \"common\"\n".parse().unwrap();
        let err = DefaultTemplate::parse_base(&node(&table, "default")).unwrap_err();
        assert_eq!(err.message(), "Missing field: default.requirement_range");
    }

    #[test]
    fn test_named_template_inherits_unset_fields() {
        let table = templates();
        let root = DefaultTemplate::parse_base(&node(&table, "default")).unwrap();
        let hard = DefaultTemplate::parse(&node(&table, "hard")).unwrap();
        assert!(hard.name.is_none());

        let resolved = hard.inherit_from(&root);
        assert_eq!(resolved.requirement_range.as_deref(), Some("50+"));
        assert_eq!(resolved.item_rarity, Some(Rarity::Epic));
        assert_eq!(resolved.name, root.name);
        assert_eq!(resolved.rewards, root.rewards);
        // inherit_from leaves both inputs untouched
        assert!(hard.name.is_none());
    }

    #[test]
    fn test_only_name_set_takes_root_values_elsewhere() {
        let table: toml::Table = "[named]\nname = \"Special\"\n".parse().unwrap();
        let defaults = templates();
        let root = DefaultTemplate::parse_base(&node(&defaults, "default")).unwrap();

        let resolved = DefaultTemplate::parse(&node(&table, "named"))
            .unwrap()
            .inherit_from(&root);
        assert_eq!(resolved.name.as_deref(), Some("Special"));
        assert_eq!(resolved.category, root.category);
        assert_eq!(resolved.lore, root.lore);
        assert_eq!(resolved.item_material, root.item_material);
    }

    #[test]
    fn test_empty_template_is_rejected() {
        let table = templates();
        let err = DefaultTemplate::parse(&node(&table, "empty")).unwrap_err();
        assert_eq!(err.message(), "Template 'empty' does not set any field");
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let table: toml::Table = "[t]\nitem_rarity = \"LEGENDARY\"\n".parse().unwrap();
        let err = DefaultTemplate::parse(&node(&table, "t")).unwrap_err();
        assert_eq!(err.message(), "Invalid ItemRarity: LEGENDARY");

        let table: toml::Table = "[t]\nrequirement_range = \"lots\"\n".parse().unwrap();
        assert!(DefaultTemplate::parse(&node(&table, "t")).is_err());
    }
}
