//! Mission Options
//!
//! Extra gating checks that sit beside a mission's target, configured under
//! `custom_options.<id>`. Each option id maps to a factory that builds the
//! option from its config table.

use std::fmt;
use std::sync::Arc;

use crate::actor::Actor;
use crate::config::node::ConfigNode;
use crate::error::{CriteriaError, RegistryError};
use crate::item::ItemStack;
use crate::mission::state::Mission;
use crate::types::MissionContext;
use crate::types::registry::ClosableRegistry;

pub trait MissionOption: fmt::Debug + Send + Sync {
    fn check(
        &self,
        actor: &dyn Actor,
        mission: &Mission,
        item: &ItemStack,
        context: Option<&MissionContext>,
    ) -> bool;
}

pub type OptionFactory =
    Arc<dyn Fn(&ConfigNode<'_>) -> Result<Arc<dyn MissionOption>, CriteriaError> + Send + Sync>;

/// Registered option factories
pub struct OptionRegistry {
    factories: ClosableRegistry<OptionFactory>,
}

impl OptionRegistry {
    pub fn new() -> Self {
        Self {
            factories: ClosableRegistry::new("Option"),
        }
    }

    pub fn with_builtin_options() -> Result<Self, RegistryError> {
        let registry = Self::new();
        registry.register("permission", PermissionOption::factory)?;
        Ok(registry)
    }

    pub fn register<F>(&self, id: &str, factory: F) -> Result<(), RegistryError>
    where
        F: Fn(&ConfigNode<'_>) -> Result<Arc<dyn MissionOption>, CriteriaError> + Send + Sync + 'static,
    {
        self.factories.register(id, Arc::new(factory))
    }

    /// `None` when no factory is registered under `id`.
    pub fn parse(
        &self,
        id: &str,
        node: &ConfigNode<'_>,
    ) -> Option<Result<Arc<dyn MissionOption>, CriteriaError>> {
        let factory = self.factories.get(id)?;
        Some(factory(node))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains(id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.factories.ids()
    }

    pub fn close(&self) {
        self.factories.close()
    }

    pub fn is_closed(&self) -> bool {
        self.factories.is_closed()
    }
}

impl Default for OptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Permission
// ============================================================================

/// Passes when `values` is empty or the actor holds any listed permission.
#[derive(Debug, Clone)]
pub struct PermissionOption {
    permissions: Vec<String>,
}

impl PermissionOption {
    pub fn parse(node: &ConfigNode<'_>) -> Self {
        Self {
            permissions: node.get_string_list("values"),
        }
    }

    pub fn factory(node: &ConfigNode<'_>) -> Result<Arc<dyn MissionOption>, CriteriaError> {
        Ok(Arc::new(Self::parse(node)))
    }
}

impl MissionOption for PermissionOption {
    fn check(
        &self,
        actor: &dyn Actor,
        _mission: &Mission,
        _item: &ItemStack,
        _context: Option<&MissionContext>,
    ) -> bool {
        self.permissions.is_empty() || self.permissions.iter().any(|p| actor.has_permission(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Player;
    use crate::matcher::Material;

    fn permission_option(src: &str) -> Arc<dyn MissionOption> {
        let registry = OptionRegistry::with_builtin_options().unwrap();
        let table: toml::Table = src.parse().unwrap();
        registry
            .parse("permission", &ConfigNode::at(&table, "custom_options.permission"))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_permission_option() {
        let option = permission_option("values = [\"missions.vip\", \"missions.staff\"]");
        let mission = Mission::create("mine_stone", 1);
        let item = ItemStack::new(Material::Paper, 1);

        let mut player = Player::new("alex", "world");
        assert!(!option.check(&player, &mission, &item, None));
        player.grant("missions.staff");
        assert!(option.check(&player, &mission, &item, None));
    }

    #[test]
    fn test_empty_permission_list_passes() {
        let option = permission_option("");
        let player = Player::new("alex", "world");
        assert!(option.check(
            &player,
            &Mission::create("x", 1),
            &ItemStack::new(Material::Paper, 1),
            None
        ));
    }

    #[test]
    fn test_unknown_option_and_duplicates() {
        let registry = OptionRegistry::with_builtin_options().unwrap();
        let table = toml::Table::new();
        assert!(registry.parse("cooldown", &ConfigNode::root(&table)).is_none());
        assert!(registry.register("Permission", PermissionOption::factory).is_err());

        registry.close();
        assert_eq!(
            registry.register("region", PermissionOption::factory),
            Err(RegistryError::Closed("region".to_string()))
        );
    }
}
