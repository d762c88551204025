//! Value Matchers
//!
//! Composable predicates built once from config and evaluated on every
//! progress attempt. Construction failures are [`CriteriaError`]s carrying the
//! field path; evaluation never fails.
//!
//! [`CriteriaError`]: crate::error::CriteriaError

pub mod enchant;
pub mod entity_data;
pub mod enum_matcher;
pub mod item_data;
pub mod names;
pub mod range;
pub mod registry;
pub mod wildcard;

pub use enchant::EnchantmentMatcher;
pub use entity_data::EntityDataMatcher;
pub use enum_matcher::EnumMatcher;
pub use item_data::ItemDataMatcher;
pub use names::{EntityKind, Material, NamedVariant, PotionType, Rarity};
pub use range::IntRange;
pub use registry::{KeyRegistries, KeyRegistry, NamespacedKey, RegistryMatcher};
