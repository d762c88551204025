//! Mission Config
//!
//! One resolved mission definition. Every field comes from the mission's own
//! table, else from its template, else the entry fails to load.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::warn;

use super::template::{self, DefaultTemplate};
use crate::config::node::ConfigNode;
use crate::error::{ConfigError, with_context};
use crate::matcher::names::{Material, Rarity};
use crate::matcher::range::IntRange;
use crate::matcher::registry::{KeyRegistries, NamespacedKey};
use crate::option::{MissionOption, OptionRegistry};
use crate::types::{MissionTarget, MissionType, TypeRegistry};

/// Completed-lore token replaced by the struck-through active lore.
pub const LORE_SENTINEL: &str = "[LORE!]";
/// Reward token replaced by the template's rewards.
pub const REWARDS_SENTINEL: &str = "[REWARDS!]";
/// Completed-name token replaced by the resolved name.
pub const NAME_TOKEN: &str = "[NAME]";

/// Registries and tables a mission entry is resolved against.
#[derive(Clone, Copy)]
pub struct ParseEnv<'a> {
    pub types: &'a TypeRegistry,
    pub options: &'a OptionRegistry,
    pub registries: &'a KeyRegistries,
    pub categories: &'a BTreeMap<String, i64>,
}

#[derive(Debug, Clone)]
pub struct MissionConfig {
    /// Lowercase table name
    pub key: String,
    pub name: String,
    pub completed_name: String,
    pub lore: Vec<String>,
    pub completed_lore: Vec<String>,
    pub category: String,
    pub mission_type: MissionType,
    pub task: String,
    /// Present only for targeted types
    pub target: Option<Arc<dyn MissionTarget>>,
    pub options: Vec<Arc<dyn MissionOption>>,
    pub rarity: Rarity,
    pub requirement_range: IntRange,
    pub item_model: Option<NamespacedKey>,
    pub completed_item_model: Option<NamespacedKey>,
    pub material: Material,
    pub rewards: Vec<String>,
    pub blacklisted_worlds: BTreeSet<String>,
}

impl MissionConfig {
    /// `template` must already be resolved against the root template.
    pub fn parse(
        node: &ConfigNode<'_>,
        template: &DefaultTemplate,
        template_name: &str,
        env: ParseEnv<'_>,
    ) -> Result<Self, ConfigError> {
        let key = node.name().to_ascii_lowercase();
        let resolve = |own: Option<String>, inherited: &Option<String>, field: &str| {
            resolve_field(own, inherited, field, template_name)
        };

        let name = resolve(node.get_non_blank("name"), &template.name, "name")?;
        let completed_name = resolve(
            node.get_non_blank("completed_name"),
            &template.completed_name,
            "completed_name",
        )?
        .replace(NAME_TOKEN, &name);

        let lore = resolve_field(node.get_list("lore"), &template.lore, "lore", template_name)?;
        let mut completed_lore = resolve_field(
            node.get_list("completed_lore"),
            &template.completed_lore,
            "completed_lore",
            template_name,
        )?;
        let struck = lore.iter().map(|line| format!("<st>{}</st>", line));
        splice_sentinel(&mut completed_lore, LORE_SENTINEL, struck);

        let category = resolve(node.get_non_blank("category"), &template.category, "category")?;
        if !env.categories.contains_key(&category) {
            return Err(ConfigError::new(format!(
                "Category '{}' is not defined in config.toml categories",
                category
            )));
        }

        let type_id = node
            .get_non_blank("type")
            .ok_or_else(|| ConfigError::new("Missing field: type"))?
            .to_ascii_lowercase();
        let mission_type = env.types.get(&type_id).ok_or_else(|| {
            ConfigError::new(format!(
                "Invalid type id '{}', known types: {}",
                type_id,
                env.types.ids().join(", ")
            ))
        })?;

        let target = match &mission_type {
            MissionType::Targeted(targeted) => {
                let targets = node.get_subsection("targets").unwrap_or_else(|| node.clone());
                let target = with_context("while parsing targets", || {
                    targeted
                        .parse(&targets, env.registries)
                        .map_err(ConfigError::from)
                })?;
                Some(target)
            }
            MissionType::Simple(_) => None,
        };

        let options = parse_options(node, template, env.options)?;

        let rarity = template::parse_rarity(node)?
            .or(template.item_rarity)
            .ok_or_else(|| ConfigError::missing_field("item_rarity", template_name))?;
        let material = template::parse_material(node)?
            .or(template.item_material)
            .ok_or_else(|| ConfigError::missing_field("item_material", template_name))?;

        let range_text = resolve(
            node.get_non_blank("requirement_range"),
            &template.requirement_range,
            "requirement_range",
        )?;
        let requirement_range = template::parse_requirement(&range_text)?;

        let item_model = template::parse_model(node, "item_model")?.or_else(|| template.item_model.clone());
        let completed_item_model = template::parse_model(node, "completed_item_model")?
            .or_else(|| template.completed_item_model.clone())
            .or_else(|| item_model.clone());

        let mut rewards = resolve_field(node.get_list("rewards"), &template.rewards, "rewards", template_name)?;
        if rewards.iter().any(|r| r == REWARDS_SENTINEL) {
            let inherited = template.rewards.clone().unwrap_or_default();
            if inherited.is_empty() {
                warn!(
                    mission = %key,
                    "{} used but template '{}' has no rewards",
                    REWARDS_SENTINEL,
                    template_name
                );
            }
            splice_sentinel(&mut rewards, REWARDS_SENTINEL, inherited);
        }

        let blacklisted_worlds = node
            .get_list("blacklisted_worlds")
            .or_else(|| template.blacklisted_worlds.clone())
            .unwrap_or_default()
            .into_iter()
            .collect();

        Ok(Self {
            key,
            name,
            completed_name,
            lore,
            completed_lore,
            category,
            mission_type,
            task: node.get_string("task_description").unwrap_or_default(),
            target,
            options,
            rarity,
            requirement_range,
            item_model,
            completed_item_model,
            material,
            rewards,
            blacklisted_worlds,
        })
    }

    pub fn target(&self) -> Option<&dyn MissionTarget> {
        self.target.as_deref()
    }

    pub fn is_world_blacklisted(&self, world: &str) -> bool {
        self.blacklisted_worlds.contains(world)
    }
}

/// Own value, else the template's, else a missing-field error naming both.
fn resolve_field<T: Clone>(
    own: Option<T>,
    inherited: &Option<T>,
    field: &str,
    template_name: &str,
) -> Result<T, ConfigError> {
    own.or_else(|| inherited.clone())
        .ok_or_else(|| ConfigError::missing_field(field, template_name))
}

/// Options come from the mission's own `custom_options`, else the template's.
fn parse_options(
    node: &ConfigNode<'_>,
    template: &DefaultTemplate,
    registry: &OptionRegistry,
) -> Result<Vec<Arc<dyn MissionOption>>, ConfigError> {
    let section = match (node.get_subsection("custom_options"), &template.options) {
        (Some(own), _) => own,
        (None, Some(table)) => ConfigNode::at(table, &node.path_of("custom_options")),
        (None, None) => return Ok(Vec::new()),
    };

    let empty = toml::Table::new();
    let mut options = Vec::new();
    for id in section.keys() {
        let option_node = section
            .get_subsection(id)
            .unwrap_or_else(|| ConfigNode::at(&empty, &section.path_of(id)));

        match registry.parse(id, &option_node) {
            Some(Ok(option)) => options.push(option),
            Some(Err(e)) => {
                return Err(ConfigError::new(format!("while parsing option '{}': {}", id, e)));
            }
            None => warn!("Unknown option '{}' at {}", id, node.path()),
        }
    }
    Ok(options)
}

/// Replace the first `sentinel` in `list` with `replacement`. Returns whether
/// a substitution happened.
fn splice_sentinel(
    list: &mut Vec<String>,
    sentinel: &str,
    replacement: impl IntoIterator<Item = String>,
) -> bool {
    match list.iter().position(|line| line == sentinel) {
        Some(idx) => {
            list.splice(idx..=idx, replacement);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Player;
    use crate::item::ItemStack;
    use crate::mission::state::Mission;
    use crate::types::MissionContext;

    const ROOT: &str = r#"
name = "<type_cap> mission"
completed_name = "[NAME] (done)"
lore = ["Progress <progress>/<requirement>"]
completed_lore = ["[LORE!]", "Claim me"]
requirement_range = "5-10"
category = "common"
item_material = "PAPER"
item_rarity = "COMMON"
rewards = ["give <player> diamond 1"]
"#;

    struct Fixture {
        types: TypeRegistry,
        options: OptionRegistry,
        registries: KeyRegistries,
        categories: BTreeMap<String, i64>,
        root: DefaultTemplate,
    }

    impl Fixture {
        fn new() -> Self {
            let root_table: toml::Table = ROOT.parse().unwrap();
            Self {
                types: TypeRegistry::with_builtin_types().unwrap(),
                options: OptionRegistry::with_builtin_options().unwrap(),
                registries: KeyRegistries::builtin(),
                categories: BTreeMap::from([("common".to_string(), 1), ("rare".to_string(), 1)]),
                root: DefaultTemplate::parse_base(&ConfigNode::at(&root_table, "default")).unwrap(),
            }
        }

        fn env(&self) -> ParseEnv<'_> {
            ParseEnv {
                types: &self.types,
                options: &self.options,
                registries: &self.registries,
                categories: &self.categories,
            }
        }

        fn parse(&self, src: &str) -> Result<MissionConfig, ConfigError> {
            let table: toml::Table = src.parse().unwrap();
            let node = ConfigNode::root(&table).get_subsection("Mine_Stone").unwrap();
            MissionConfig::parse(&node, &self.root, "default", self.env())
        }
    }

    #[test]
    fn test_fields_fall_back_to_template() {
        let fixture = Fixture::new();
        let config = fixture
            .parse("[Mine_Stone]\ntype = \"break\"\nmaterials = [\"STONE\"]\n")
            .unwrap();

        assert_eq!(config.key, "mine_stone");
        assert_eq!(config.name, "<type_cap> mission");
        assert_eq!(config.completed_name, "<type_cap> mission (done)");
        assert_eq!(config.requirement_range, IntRange::new(5, 10));
        assert_eq!(config.material, Material::Paper);
        assert_eq!(config.rewards, vec!["give <player> diamond 1"]);
        assert_eq!(config.task, "");
        assert!(config.target().is_some());
        assert!(config.options.is_empty());
    }

    #[test]
    fn test_lore_sentinel_strikes_active_lore() {
        let fixture = Fixture::new();
        let config = fixture
            .parse("[Mine_Stone]\ntype = \"walk\"\nlore = [\"a\", \"b\"]\n")
            .unwrap();
        assert_eq!(config.completed_lore, vec!["<st>a</st>", "<st>b</st>", "Claim me"]);
    }

    #[test]
    fn test_reward_sentinel_is_replaced_once() {
        let fixture = Fixture::new();
        let config = fixture
            .parse(
                "[Mine_Stone]\ntype = \"walk\"\nrewards = [\"say hi\", \"[REWARDS!]\", \"[REWARDS!]\"]\n",
            )
            .unwrap();
        assert_eq!(
            config.rewards,
            vec!["say hi", "give <player> diamond 1", "[REWARDS!]"]
        );
    }

    #[test]
    fn test_targets_section_and_models() {
        let fixture = Fixture::new();
        let config = fixture
            .parse(
                r#"
[Mine_Stone]
type = "break"
item_model = "missions:scroll"
task_description = "Mine stone"
[Mine_Stone.targets]
materials = ["DIRT"]
"#,
            )
            .unwrap();

        let target = config.target().unwrap();
        assert!(target.matches(&MissionContext::block(Material::Dirt)));
        assert!(!target.matches(&MissionContext::block(Material::Stone)));
        assert_eq!(config.task, "Mine stone");
        assert_eq!(config.completed_item_model, config.item_model);
    }

    #[test]
    fn test_entry_errors() {
        let fixture = Fixture::new();

        let err = fixture.parse("[Mine_Stone]\nname = \"x\"\n").unwrap_err();
        assert_eq!(err.message(), "Missing field: type");

        let err = fixture.parse("[Mine_Stone]\ntype = \"dig\"\n").unwrap_err();
        assert!(err.message().starts_with("Invalid type id 'dig'"));

        let err = fixture
            .parse("[Mine_Stone]\ntype = \"walk\"\ncategory = \"legendary\"\n")
            .unwrap_err();
        assert!(err.message().contains("legendary"));

        let err = fixture
            .parse("[Mine_Stone]\ntype = \"break\"\nmaterials = [\"NOPE_*\"]\n")
            .unwrap_err();
        assert_eq!(err.contexts(), ["while parsing targets"]);
    }

    #[test]
    fn test_missing_field_names_template() {
        let fixture = Fixture::new();
        let table: toml::Table = "[m]\ntype = \"walk\"\n".parse().unwrap();
        let node = ConfigNode::root(&table).get_subsection("m").unwrap();
        let err = MissionConfig::parse(&node, &DefaultTemplate::default(), "sparse", fixture.env())
            .unwrap_err();
        assert_eq!(
            err.message(),
            "Field: 'name' is missing in both mission and template 'sparse'"
        );
    }

    #[test]
    fn test_missing_list_fields_are_fatal() {
        let fixture = Fixture::new();
        let scalars = r#"
[m]
type = "walk"
name = "Walk"
completed_name = "Walked"
requirement_range = "5"
category = "common"
item_material = "PAPER"
item_rarity = "COMMON"
"#;
        let cases = [
            ("", "lore"),
            ("lore = [\"a\"]\n", "completed_lore"),
            ("lore = [\"a\"]\ncompleted_lore = [\"b\"]\n", "rewards"),
        ];

        for (extra, field) in cases {
            let table: toml::Table = format!("{}{}", scalars, extra).parse().unwrap();
            let node = ConfigNode::root(&table).get_subsection("m").unwrap();
            let err = MissionConfig::parse(&node, &DefaultTemplate::default(), "sparse", fixture.env())
                .unwrap_err();
            assert_eq!(
                err.message(),
                format!("Field: '{}' is missing in both mission and template 'sparse'", field)
            );
        }

        let table: toml::Table = format!("{}lore = []\ncompleted_lore = []\nrewards = []\n", scalars)
            .parse()
            .unwrap();
        let node = ConfigNode::root(&table).get_subsection("m").unwrap();
        let config = MissionConfig::parse(&node, &DefaultTemplate::default(), "sparse", fixture.env()).unwrap();
        assert!(config.lore.is_empty());
        assert!(config.rewards.is_empty());
    }

    #[test]
    fn test_options_are_parsed_and_unknown_ones_skipped() {
        let fixture = Fixture::new();
        let config = fixture
            .parse(
                r#"
[Mine_Stone]
type = "walk"
[Mine_Stone.custom_options.permission]
values = ["missions.vip"]
[Mine_Stone.custom_options.cooldown]
seconds = 5
"#,
            )
            .unwrap();
        assert_eq!(config.options.len(), 1);

        let mut player = Player::new("alex", "world");
        let mission = Mission::create("mine_stone", 1);
        let item = ItemStack::new(Material::Paper, 1);
        assert!(!config.options[0].check(&player, &mission, &item, None));
        player.grant("missions.vip");
        assert!(config.options[0].check(&player, &mission, &item, None));
    }

    #[test]
    fn test_blacklisted_worlds() {
        let fixture = Fixture::new();
        let config = fixture
            .parse("[Mine_Stone]\ntype = \"walk\"\nblacklisted_worlds = [\"world_nether\"]\n")
            .unwrap();
        assert!(config.is_world_blacklisted("world_nether"));
        assert!(!config.is_world_blacklisted("world"));
    }
}
