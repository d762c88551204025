//! Type Registry
//!
//! Ids are case-normalized. Registration is only possible until the registry
//! is closed, which happens once the first config load has finished.

use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::info;

use super::MissionType;
use super::builtin;
use crate::error::RegistryError;

/// Id-keyed store that can be frozen after startup.
pub struct ClosableRegistry<T> {
    name: &'static str,
    entries: DashMap<String, T>,
    closed: AtomicBool,
}

impl<T: Clone> ClosableRegistry<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: DashMap::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn register(&self, id: &str, value: T) -> Result<(), RegistryError> {
        let id = id.trim().to_ascii_lowercase();
        if self.is_closed() {
            return Err(RegistryError::Closed(id));
        }
        match self.entries.entry(id) {
            Entry::Occupied(e) => Err(RegistryError::DuplicateId(e.key().clone())),
            Entry::Vacant(e) => {
                e.insert(value);
                Ok(())
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<T> {
        let id = id.trim().to_ascii_lowercase();
        self.entries.get(&id).map(|e| e.value().clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(&id.trim().to_ascii_lowercase())
    }

    /// Sorted ids.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Snapshot of every entry, sorted by id.
    pub fn all(&self) -> Vec<T> {
        let mut all: Vec<(String, T)> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all.into_iter().map(|(_, v)| v).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze the registry. Idempotent.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("{} registry closed with {} entries", self.name, self.entries.len());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Registered mission types
pub struct TypeRegistry {
    types: ClosableRegistry<MissionType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            types: ClosableRegistry::new("Type"),
        }
    }

    /// Registry holding every built-in type.
    pub fn with_builtin_types() -> Result<Self, RegistryError> {
        let registry = Self::new();
        builtin::register_builtin_types(&registry)?;
        Ok(registry)
    }

    pub fn register(&self, mission_type: MissionType) -> Result<(), RegistryError> {
        let id = mission_type.id().to_string();
        self.types.register(&id, mission_type)
    }

    pub fn get(&self, id: &str) -> Option<MissionType> {
        self.types.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.types.contains(id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.types.ids()
    }

    pub fn types(&self) -> Vec<MissionType> {
        self.types.all()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn close(&self) {
        self.types.close()
    }

    pub fn is_closed(&self) -> bool {
        self.types.is_closed()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let registry = TypeRegistry::new();
        registry.register(MissionType::simple("walk")).unwrap();
        assert_eq!(
            registry.register(MissionType::simple("WALK")),
            Err(RegistryError::DuplicateId("walk".to_string()))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_is_case_normalized() {
        let registry = TypeRegistry::new();
        registry.register(MissionType::simple("Swim")).unwrap();
        assert!(registry.get("SWIM").is_some());
        assert!(registry.get(" swim ").is_some());
        assert!(registry.get("fly").is_none());
    }

    #[test]
    fn test_closed_registry_rejects_registration() {
        let registry = TypeRegistry::new();
        registry.close();
        assert!(registry.is_closed());
        assert_eq!(
            registry.register(MissionType::simple("walk")),
            Err(RegistryError::Closed("walk".to_string()))
        );
    }

    #[test]
    fn test_builtin_types_are_registered() {
        let registry = TypeRegistry::with_builtin_types().unwrap();
        for id in ["walk", "break", "kill", "enchant", "potion", "smelt"] {
            assert!(registry.contains(id), "missing {}", id);
        }
        assert_eq!(registry.types().len(), registry.len());
        assert_eq!(registry.ids().first().map(String::as_str), Some("break"));
    }
}
