//! Mission Display
//!
//! Renders a mission's name and lore onto its item. Config strings use
//! `<placeholder>` tags; markup tags the host understands (`<red>`, `<st>`)
//! pass through untouched.

use tracing::error;

use crate::config::mission_config::MissionConfig;
use crate::item::{INVALID_CONFIG_KEY, ItemStack};
use crate::mission::state::Mission;

pub const BROKEN_NAME: &str = "BROKEN MISSION";

const UNKNOWN: &str = "unknown";

/// Placeholder values for one mission
#[derive(Debug, Clone)]
pub struct MissionTags {
    values: Vec<(&'static str, String)>,
}

impl MissionTags {
    /// Tags for `mission`. Config-derived values read "unknown" when the
    /// config is missing.
    pub fn new(mission: &Mission, config: Option<&MissionConfig>) -> Self {
        let type_id = config
            .map(|c| c.mission_type.id().to_string())
            .unwrap_or_else(|| UNKNOWN.to_string());
        let category = config
            .map(|c| c.category.clone())
            .unwrap_or_else(|| UNKNOWN.to_string());
        let task = config.map(|c| c.task.clone()).unwrap_or_default();

        Self {
            values: vec![
                ("uuid", mission.uuid().to_string()),
                ("type_cap", capitalize(&type_id)),
                ("type", type_id),
                ("progress", mission.progress().to_string()),
                ("requirement", mission.requirement().to_string()),
                ("category_cap", capitalize(&category)),
                ("category", category),
                ("percentage", mission.percentage().to_string()),
                ("config_id", mission.config_id().to_string()),
                ("completed", mission.is_completed().to_string()),
                ("task", task),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(tag, _)| *tag == name)
            .map(|(_, value)| value.as_str())
    }

    /// Substitute known `<tag>`s in one pass; substituted values are not
    /// scanned again.
    pub fn render(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(open) = rest.find('<') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let value = after
                .find('>')
                .and_then(|close| self.get(&after[..close]).map(|value| (close, value)));
            match value {
                Some((close, value)) => {
                    out.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('<');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Rewrite the item's name, lore and model for the mission's current state.
pub fn refresh_display(item: &mut ItemStack, mission: &Mission, config: &MissionConfig) {
    let tags = MissionTags::new(mission, Some(config));
    let (name, lore, model) = if mission.is_completed() {
        (&config.completed_name, &config.completed_lore, &config.completed_item_model)
    } else {
        (&config.name, &config.lore, &config.item_model)
    };

    item.name = Some(tags.render(name));
    item.lore = lore.iter().map(|line| tags.render(line)).collect();
    item.model = model.clone();
}

/// Fresh item of the config's material carrying `mission`.
pub fn build_item(config: &MissionConfig, mission: &Mission) -> ItemStack {
    let mut item = ItemStack::new(config.material, 1);
    item.rarity = Some(config.rarity);
    item.set_mission(mission);
    refresh_display(&mut item, mission, config);
    item
}

/// Store `mission` on the item. With a config, the broken marker is cleared
/// and the display refreshed.
pub fn update_mission_data(item: &mut ItemStack, mission: &Mission, config: Option<&MissionConfig>) {
    if config.is_some() {
        item.data.remove(&INVALID_CONFIG_KEY);
    }
    item.set_mission(mission);
    if let Some(config) = config {
        refresh_display(item, mission, config);
    }
}

/// Flag an item whose config id no longer resolves. Returns false if the
/// item carries no mission or is already flagged.
pub fn mark_broken(item: &mut ItemStack, config_id: &str) -> bool {
    if item.is_broken_mission() || item.mission().is_none() {
        return false;
    }

    item.data.set(INVALID_CONFIG_KEY.clone(), "1");
    error!(
        config_id,
        "Config entry is missing or invalid, please check your config if this is not intentional"
    );

    item.lore
        .insert(0, format!("<red>MISSION HAS INVALID CONFIG ID: </red>{}", config_id));
    item.name = Some(BROKEN_NAME.to_string());
    true
}
