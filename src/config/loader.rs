//! Config Manager
//!
//! Loads `config.toml`, the default templates and every mission file under a
//! data directory into a [`MissionCatalog`]. A load builds a complete new
//! catalog on the side and swaps it in with a single `Arc` assignment, so
//! readers always see one consistent generation.
//!
//! Failure granularity:
//! - a bad mission entry falls back to its previous version, or is dropped
//! - a bad named template falls back to the root template
//! - an unreadable mission file drops its entries and, once something has
//!   loaded before, restores the last clean catalog wholesale
//! - an unreadable main config or defaults file aborts the load

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{error, info, warn};

use super::main_config::{MainConfig, RawMainConfig};
use super::mission_config::{MissionConfig, ParseEnv};
use super::node::ConfigNode;
use super::template::{DefaultTemplate, ROOT_TEMPLATE};
use crate::error::{ConfigError, LoadError, RegistryError, with_context};
use crate::matcher::registry::KeyRegistries;
use crate::option::OptionRegistry;
use crate::types::TypeRegistry;

pub const MAIN_CONFIG_FILE: &str = "config.toml";
pub const MISSIONS_DIR: &str = "missions";
pub const DEFAULTS_FILE: &str = "defaults.toml";

const RULE: &str = "========================================================";

// ============================================================================
// Catalog
// ============================================================================

/// One complete, immutable generation of loaded config
#[derive(Debug, Default)]
pub struct MissionCatalog {
    pub main: MainConfig,
    /// Resolved templates keyed by name, the root included
    pub templates: BTreeMap<String, DefaultTemplate>,
    pub missions: BTreeMap<String, Arc<MissionConfig>>,
    /// The cycle that produced this catalog had no errors.
    pub loaded: bool,
    /// Zero until the first load has been installed.
    pub generation: u64,
}

impl MissionCatalog {
    pub fn mission(&self, id: &str) -> Option<Arc<MissionConfig>> {
        self.missions.get(id).cloned()
    }

    pub fn template(&self, name: &str) -> Option<&DefaultTemplate> {
        self.templates.get(name)
    }

    /// Missions whose category matches, ignoring case, in key order.
    pub fn missions_in_category(&self, category: &str) -> Vec<Arc<MissionConfig>> {
        self.missions
            .values()
            .filter(|m| m.category.eq_ignore_ascii_case(category))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.missions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.missions.is_empty()
    }
}

/// Outcome of one load cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub missions: usize,
    pub templates: usize,
    /// Entries that failed to parse
    pub entry_errors: usize,
    /// Failed entries kept at their previous version
    pub fallbacks: usize,
    /// Mission files that could not be read or parsed
    pub failed_files: Vec<PathBuf>,
    /// The last clean catalog was restored because a file failed.
    pub rolled_back: bool,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.entry_errors == 0 && self.failed_files.is_empty()
    }
}

// ============================================================================
// Config Manager
// ============================================================================

pub struct ConfigManager {
    data_dir: PathBuf,
    types: TypeRegistry,
    options: OptionRegistry,
    registries: KeyRegistries,
    catalog: RwLock<Arc<MissionCatalog>>,
    /// Most recent catalog whose load cycle had no errors
    last_clean: RwLock<Option<Arc<MissionCatalog>>>,
}

impl ConfigManager {
    /// Manager with the built-in types and options registered. More can be
    /// registered until the first successful load.
    pub fn new(data_dir: &Path) -> Result<Self, RegistryError> {
        Ok(Self::with_registries(
            data_dir,
            TypeRegistry::with_builtin_types()?,
            OptionRegistry::with_builtin_options()?,
            KeyRegistries::builtin(),
        ))
    }

    pub fn with_registries(
        data_dir: &Path,
        types: TypeRegistry,
        options: OptionRegistry,
        registries: KeyRegistries,
    ) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            types,
            options,
            registries,
            catalog: RwLock::new(Arc::new(MissionCatalog::default())),
            last_clean: RwLock::new(None),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn options(&self) -> &OptionRegistry {
        &self.options
    }

    pub fn key_registries(&self) -> &KeyRegistries {
        &self.registries
    }

    /// Current generation.
    pub fn catalog(&self) -> Arc<MissionCatalog> {
        let guard = self.catalog.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    pub fn main_config(&self) -> MainConfig {
        self.catalog().main.clone()
    }

    fn install(&self, catalog: Arc<MissionCatalog>) {
        if catalog.loaded {
            let mut clean = self.last_clean.write().unwrap_or_else(|e| e.into_inner());
            *clean = Some(Arc::clone(&catalog));
        }
        let mut guard = self.catalog.write().unwrap_or_else(|e| e.into_inner());
        *guard = catalog;
    }

    /// Catalog to fall back to when a load cycle has to be abandoned: the
    /// last clean one, else whatever is installed.
    fn rollback_target(&self, current: Arc<MissionCatalog>) -> Arc<MissionCatalog> {
        let clean = self.last_clean.read().unwrap_or_else(|e| e.into_inner());
        clean.clone().unwrap_or(current)
    }

    /// Run one load cycle. On `Err` the current catalog is left in place.
    pub fn load(&self) -> Result<LoadReport, LoadError> {
        let previous = self.catalog();
        info!("Loading missions from {:?}", self.data_dir);

        let main = self.load_main_config().inspect_err(|e| self.report_load_error(e, previous.main.debug))?;
        let templates = self
            .load_templates(main.debug)
            .inspect_err(|e| self.report_load_error(e, main.debug))?;

        let env = ParseEnv {
            types: &self.types,
            options: &self.options,
            registries: &self.registries,
            categories: &main.categories,
        };

        let mut report = LoadReport {
            templates: templates.len(),
            ..LoadReport::default()
        };
        let mut missions: BTreeMap<String, Arc<MissionConfig>> = BTreeMap::new();
        let mut sources: BTreeMap<String, PathBuf> = BTreeMap::new();

        for path in self.mission_files() {
            let table = match read_table(&path) {
                Ok(table) => table,
                Err(e) => {
                    self.report_file_error(&path, &e, main.debug);
                    report.failed_files.push(path);
                    continue;
                }
            };

            let file_name = display_name(&path);
            let root = ConfigNode::root(&table);
            for entry in root.keys() {
                let Some(node) = root.get_subsection(entry) else {
                    continue;
                };
                let key = entry.to_ascii_lowercase();

                let parsed = with_context(format!("Mission: {}", entry), || {
                    if let Some(first) = sources.get(&key) {
                        return Err(ConfigError::new(format!(
                            "Duplicate mission key '{}', already defined in {}",
                            key,
                            display_name(first)
                        )));
                    }
                    let template_name = node
                        .get_non_blank("template")
                        .map(|t| t.to_ascii_lowercase())
                        .unwrap_or_else(|| ROOT_TEMPLATE.to_string());
                    let template = templates.get(&template_name).ok_or_else(|| {
                        ConfigError::new(format!("Unknown template '{}'", template_name))
                    })?;
                    MissionConfig::parse(&node, template, &template_name, env)
                })
                .map_err(|e| e.with_context(format!("In file: {}", file_name)));

                match parsed {
                    Ok(config) => {
                        sources.insert(key.clone(), path.clone());
                        missions.insert(key, Arc::new(config));
                    }
                    Err(e) => {
                        report.entry_errors += 1;
                        self.report_config_error(&e, main.debug);
                        if sources.contains_key(&key) {
                            continue;
                        }
                        if let Some(old) = previous.missions.get(&key) {
                            warn!("Using old version of mission: {}", key);
                            missions.insert(key, Arc::clone(old));
                            report.fallbacks += 1;
                        }
                    }
                }
            }
        }

        if !report.failed_files.is_empty() && previous.generation > 0 {
            let restored = self.rollback_target(previous);
            error!(
                "{} mission file(s) could not be read, restoring the last working set of {} missions",
                report.failed_files.len(),
                restored.len()
            );
            report.rolled_back = true;
            report.missions = restored.len();
            self.install(restored);
            return Ok(report);
        }

        report.missions = missions.len();
        self.install(Arc::new(MissionCatalog {
            main,
            templates,
            missions,
            loaded: report.is_clean(),
            generation: previous.generation + 1,
        }));

        self.types.close();
        self.options.close();

        if report.is_clean() {
            info!("Loaded {} missions and {} templates", report.missions, report.templates);
        } else {
            warn!(
                "Loaded {} missions and {} templates with {} error(s), check the log above",
                report.missions,
                report.templates,
                report.entry_errors + report.failed_files.len()
            );
        }
        Ok(report)
    }

    fn load_main_config(&self) -> Result<MainConfig, LoadError> {
        let path = self.data_dir.join(MAIN_CONFIG_FILE);
        let content = read_file(&path)?;
        let raw: RawMainConfig = toml::from_str(&content).map_err(|source| LoadError::Parse {
            path: path.clone(),
            source,
        })?;
        let main = MainConfig::from_raw(raw)
            .map_err(|e| e.with_context(format!("Loading main config ({})", MAIN_CONFIG_FILE)))?;
        Ok(main)
    }

    /// Root template plus every named template resolved against it.
    fn load_templates(&self, debug: bool) -> Result<BTreeMap<String, DefaultTemplate>, LoadError> {
        let path = self.data_dir.join(MISSIONS_DIR).join(DEFAULTS_FILE);
        let table = read_table(&path)?;
        let root_node = ConfigNode::root(&table);

        let root = with_context("Loading default templates", || {
            let node = root_node.get_subsection(ROOT_TEMPLATE).ok_or_else(|| {
                ConfigError::new(format!("No [{}] table in {}", ROOT_TEMPLATE, DEFAULTS_FILE))
            })?;
            DefaultTemplate::parse_base(&node)
        })?;

        let mut templates = BTreeMap::new();
        for name in root_node.keys() {
            let Some(node) = root_node.get_subsection(name) else {
                continue;
            };
            let name = name.to_ascii_lowercase();
            if name == ROOT_TEMPLATE {
                continue;
            }

            let resolved = match DefaultTemplate::parse(&node) {
                Ok(template) => template.inherit_from(&root),
                Err(e) => {
                    let e = e
                        .with_context(format!("Template: {}", name))
                        .with_context(format!("In file: {}", DEFAULTS_FILE));
                    self.report_config_error(&e, debug);
                    warn!("Template '{}' falls back to the root template", name);
                    root.clone()
                }
            };
            templates.insert(name, resolved);
        }
        templates.insert(ROOT_TEMPLATE.to_string(), root);
        Ok(templates)
    }

    /// Every `.toml` below the missions directory except the defaults file,
    /// in path order.
    fn mission_files(&self) -> Vec<PathBuf> {
        let dir = self.data_dir.join(MISSIONS_DIR);
        let defaults = dir.join(DEFAULTS_FILE);
        let mut paths = Vec::new();
        collect_toml_files(&dir, &mut paths);
        paths.retain(|p| *p != defaults);
        paths.sort();
        paths
    }

    // ------------------------------------------------------------------------
    // Operator reporting
    // ------------------------------------------------------------------------

    fn report_config_error(&self, e: &ConfigError, debug: bool) {
        error!("{}", RULE);
        error!("          MISSION CONFIG ERROR");
        error!("          Version: {}", env!("CARGO_PKG_VERSION"));
        error!("{}", RULE);
        for line in e.report().lines() {
            error!("{}", line);
        }
        log_source_chain(e, debug);
        error!("{}", RULE);
    }

    fn report_file_error(&self, path: &Path, e: &LoadError, debug: bool) {
        error!("{}", RULE);
        error!("          TOML READING ERROR");
        error!("          Version: {}", env!("CARGO_PKG_VERSION"));
        error!("");
        error!("     Please verify that the file is valid TOML.");
        error!("{}", RULE);
        error!("File: {}", display_name(path));
        error!("Error: {}", e);
        log_source_chain(e, debug);
        error!("{}", RULE);
    }

    fn report_load_error(&self, e: &LoadError, debug: bool) {
        match e {
            LoadError::Config(config) => self.report_config_error(config, debug),
            LoadError::Io { path, .. } | LoadError::Parse { path, .. } => {
                self.report_file_error(path, e, debug)
            }
        }
    }
}

fn log_source_chain(e: &dyn std::error::Error, debug: bool) {
    if !debug {
        if e.source().is_some() {
            error!("Enable debug mode to see the error source chain.");
        }
        return;
    }
    let mut source = e.source();
    while let Some(cause) = source {
        error!("  Caused by: {}", cause);
        source = cause.source();
    }
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_table(path: &Path) -> Result<toml::Table, LoadError> {
    let content = read_file(path)?;
    toml::from_str(&content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn collect_toml_files(dir: &Path, paths: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Missions directory {:?} is not readable: {}", dir, e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_toml_files(&path, paths);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            paths.push(path);
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    pub(crate) const MAIN: &str = r#"
debug = false

[mission]
cache_slots = true

[categories]
mining = 3
travel = 1
"#;

    pub(crate) const DEFAULTS: &str = r#"
[default]
name = "<type_cap> mission"
completed_name = "[NAME] (complete)"
lore = ["<progress>/<requirement>"]
completed_lore = ["[LORE!]", "Right click to claim"]
requirement_range = "5"
category = "mining"
item_material = "PAPER"
item_rarity = "COMMON"
rewards = ["give <player> diamond 1"]

[long]
requirement_range = "100"
category = "travel"
"#;

    pub(crate) const MINING: &str = r#"
[mine_stone]
type = "break"
materials = ["STONE"]

[walk_far]
type = "walk"
template = "long"
"#;

    pub(crate) fn write_data_dir(missions: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(MAIN_CONFIG_FILE), MAIN).unwrap();
        fs::create_dir_all(dir.path().join(MISSIONS_DIR)).unwrap();
        fs::write(dir.path().join(MISSIONS_DIR).join(DEFAULTS_FILE), DEFAULTS).unwrap();
        for (name, content) in missions {
            let path = dir.path().join(MISSIONS_DIR).join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }
        dir
    }

    /// Catalog with `mine_stone` (break STONE, 5) and `walk_far` (walk, 100).
    pub(crate) fn sample_catalog() -> Arc<MissionCatalog> {
        let dir = write_data_dir(&[("mining.toml", MINING)]);
        let manager = ConfigManager::new(dir.path()).unwrap();
        manager.load().unwrap();
        manager.catalog()
    }

    #[test]
    fn test_load_data_dir() {
        let dir = write_data_dir(&[("mining.toml", MINING)]);
        let manager = ConfigManager::new(dir.path()).unwrap();
        let report = manager.load().unwrap();

        assert!(report.is_clean());
        assert_eq!(report.missions, 2);
        assert_eq!(report.templates, 2);

        let catalog = manager.catalog();
        assert!(catalog.loaded);
        assert_eq!(catalog.generation, 1);
        let walk = catalog.mission("walk_far").unwrap();
        assert_eq!(walk.category, "travel");
        assert_eq!(walk.requirement_range.min(), 100);
        assert_eq!(walk.completed_name, "<type_cap> mission (complete)");
        assert_eq!(catalog.missions_in_category("MINING").len(), 1);
    }

    #[test]
    fn test_registries_close_after_first_load() {
        let dir = write_data_dir(&[("mining.toml", MINING)]);
        let manager = ConfigManager::new(dir.path()).unwrap();
        assert!(!manager.types().is_closed());
        manager.load().unwrap();
        assert!(manager.types().is_closed());
        assert!(manager.options().is_closed());
    }

    #[test]
    fn test_nested_files_are_loaded() {
        let dir = write_data_dir(&[
            ("mining.toml", MINING),
            ("extra/combat.toml", "[slay]\ntype = \"kill\"\n"),
        ]);
        let manager = ConfigManager::new(dir.path()).unwrap();
        manager.load().unwrap();
        assert!(manager.catalog().mission("slay").is_some());
    }

    #[test]
    fn test_bad_entry_falls_back_to_previous_version() {
        let dir = write_data_dir(&[("mining.toml", MINING)]);
        let manager = ConfigManager::new(dir.path()).unwrap();
        manager.load().unwrap();

        let broken = MINING.replace("materials = [\"STONE\"]", "materials = [\"NOT_A_BLOCK\"]");
        fs::write(dir.path().join(MISSIONS_DIR).join("mining.toml"), broken).unwrap();
        let report = manager.load().unwrap();

        assert_eq!(report.entry_errors, 1);
        assert_eq!(report.fallbacks, 1);
        let catalog = manager.catalog();
        assert!(!catalog.loaded);
        assert!(catalog.mission("mine_stone").is_some());
        assert_eq!(catalog.generation, 2);
    }

    #[test]
    fn test_bad_entry_without_previous_version_is_dropped() {
        let dir = write_data_dir(&[("mining.toml", "[dig]\ntype = \"dig\"\n[ok]\ntype = \"walk\"\n")]);
        let manager = ConfigManager::new(dir.path()).unwrap();
        let report = manager.load().unwrap();
        assert_eq!(report.entry_errors, 1);
        assert_eq!(report.missions, 1);
        assert!(manager.catalog().mission("dig").is_none());
    }

    #[test]
    fn test_unreadable_file_restores_previous_catalog() {
        let dir = write_data_dir(&[("mining.toml", MINING)]);
        let manager = ConfigManager::new(dir.path()).unwrap();
        manager.load().unwrap();

        fs::write(dir.path().join(MISSIONS_DIR).join("travel.toml"), "[oops\n").unwrap();
        fs::write(dir.path().join(MISSIONS_DIR).join("mining.toml"), "[only]\ntype = \"walk\"\n").unwrap();
        let report = manager.load().unwrap();

        assert!(report.rolled_back);
        assert_eq!(report.failed_files.len(), 1);
        let catalog = manager.catalog();
        assert_eq!(catalog.generation, 1);
        assert!(catalog.mission("mine_stone").is_some());
        assert!(catalog.mission("only").is_none());
    }

    #[test]
    fn test_rollback_skips_generation_with_errors() {
        let dir = write_data_dir(&[("mining.toml", MINING)]);
        let manager = ConfigManager::new(dir.path()).unwrap();
        manager.load().unwrap();

        // generation 2 installs with an entry error
        let partial = format!("{}\n[dig]\ntype = \"dig\"\n[swim_laps]\ntype = \"swim\"\n", MINING);
        fs::write(dir.path().join(MISSIONS_DIR).join("mining.toml"), partial).unwrap();
        let report = manager.load().unwrap();
        assert_eq!(report.entry_errors, 1);
        assert_eq!(manager.catalog().generation, 2);
        assert!(!manager.catalog().loaded);

        fs::write(dir.path().join(MISSIONS_DIR).join("travel.toml"), "[oops\n").unwrap();
        let report = manager.load().unwrap();

        assert!(report.rolled_back);
        assert_eq!(report.missions, 2);
        let catalog = manager.catalog();
        assert!(catalog.loaded);
        assert_eq!(catalog.generation, 1);
        assert!(catalog.mission("swim_laps").is_none());
        assert!(catalog.mission("mine_stone").is_some());
    }

    #[test]
    fn test_unreadable_file_on_first_load_installs_the_rest() {
        let dir = write_data_dir(&[("mining.toml", MINING), ("broken.toml", "not toml at all = = =")]);
        let manager = ConfigManager::new(dir.path()).unwrap();
        let report = manager.load().unwrap();
        assert!(!report.rolled_back);
        assert_eq!(report.missions, 2);
        assert!(!manager.catalog().loaded);
    }

    #[test]
    fn test_duplicate_keys_keep_first_definition() {
        let dir = write_data_dir(&[
            ("a.toml", "[Twin]\ntype = \"walk\"\nname = \"first\"\n"),
            ("b.toml", "[twin]\ntype = \"walk\"\nname = \"second\"\n"),
        ]);
        let manager = ConfigManager::new(dir.path()).unwrap();
        let report = manager.load().unwrap();
        assert_eq!(report.entry_errors, 1);
        assert_eq!(manager.catalog().mission("twin").unwrap().name, "first");
    }

    #[test]
    fn test_unknown_and_broken_templates() {
        let dir = write_data_dir(&[("m.toml", "[a]\ntype = \"walk\"\ntemplate = \"nope\"\n")]);
        let manager = ConfigManager::new(dir.path()).unwrap();
        let report = manager.load().unwrap();
        assert_eq!(report.entry_errors, 1);

        let defaults = format!("{}\n[blank]\n", DEFAULTS);
        fs::write(dir.path().join(MISSIONS_DIR).join(DEFAULTS_FILE), defaults).unwrap();
        fs::write(dir.path().join(MISSIONS_DIR).join("m.toml"), "[a]\ntype = \"walk\"\ntemplate = \"blank\"\n").unwrap();
        manager.load().unwrap();
        let catalog = manager.catalog();
        assert_eq!(catalog.template("blank"), catalog.template(ROOT_TEMPLATE));
        assert_eq!(catalog.mission("a").unwrap().category, "mining");
    }

    #[test]
    fn test_fatal_errors_keep_current_catalog() {
        let dir = write_data_dir(&[("mining.toml", MINING)]);
        let manager = ConfigManager::new(dir.path()).unwrap();
        manager.load().unwrap();

        fs::write(dir.path().join(MAIN_CONFIG_FILE), "[categories]\n").unwrap();
        assert!(matches!(manager.load(), Err(LoadError::Config(_))));

        fs::write(dir.path().join(MAIN_CONFIG_FILE), MAIN).unwrap();
        fs::remove_file(dir.path().join(MISSIONS_DIR).join(DEFAULTS_FILE)).unwrap();
        assert!(matches!(manager.load(), Err(LoadError::Io { .. })));

        assert_eq!(manager.catalog().generation, 1);
        assert_eq!(manager.catalog().len(), 2);
    }
}
