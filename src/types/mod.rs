//! Mission Types
//!
//! A mission type is either simple (an id, nothing to match) or targeted:
//! it parses a target from config once at load time and evaluates it against
//! a runtime [`MissionContext`] on every progress attempt.

pub mod builtin;
pub mod context;
pub mod registry;

use std::fmt;
use std::sync::Arc;

use tracing::error;

use crate::config::node::ConfigNode;
use crate::error::CriteriaError;
use crate::matcher::registry::KeyRegistries;

pub use context::{ContextKind, MissionContext};
pub use registry::TypeRegistry;

/// Parsed, immutable criteria for one mission config.
pub trait MissionTarget: fmt::Debug + Send + Sync {
    fn matches(&self, context: &MissionContext) -> bool;
}

/// A mission type that carries match criteria.
pub trait TargetedMissionType: Send + Sync {
    fn id(&self) -> &str;

    /// Context shape this type's targets expect.
    fn context_kind(&self) -> ContextKind;

    /// Called once per mission config during load.
    fn parse(
        &self,
        node: &ConfigNode<'_>,
        registries: &KeyRegistries,
    ) -> Result<Arc<dyn MissionTarget>, CriteriaError>;
}

#[derive(Clone)]
pub enum MissionType {
    Simple(String),
    Targeted(Arc<dyn TargetedMissionType>),
}

impl MissionType {
    pub fn simple(id: &str) -> Self {
        MissionType::Simple(id.trim().to_ascii_lowercase())
    }

    pub fn targeted(mission_type: impl TargetedMissionType + 'static) -> Self {
        MissionType::Targeted(Arc::new(mission_type))
    }

    pub fn id(&self) -> &str {
        match self {
            MissionType::Simple(id) => id,
            MissionType::Targeted(t) => t.id(),
        }
    }

    pub fn is_targeted(&self) -> bool {
        matches!(self, MissionType::Targeted(_))
    }

    /// Evaluate `target` against `context`, guarding against a context of the
    /// wrong shape. A mismatch is logged and counts as no match.
    pub fn matches(&self, target: Option<&dyn MissionTarget>, context: Option<&MissionContext>) -> bool {
        let MissionType::Targeted(targeted) = self else {
            return true;
        };
        let Some(target) = target else {
            return true;
        };
        let Some(context) = context else {
            error!(mission_type = %targeted.id(), "No context supplied for targeted mission type");
            return false;
        };

        let expected = targeted.context_kind();
        if !context.kind().satisfies(expected) {
            error!(
                mission_type = %targeted.id(),
                "Context mismatch: expected {}, got {}",
                expected.as_str(),
                context.kind().as_str()
            );
            return false;
        }

        target.matches(context)
    }
}

impl PartialEq for MissionType {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for MissionType {}

impl fmt::Debug for MissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissionType::Simple(id) => write!(f, "Simple({})", id),
            MissionType::Targeted(t) => write!(f, "Targeted({})", t.id()),
        }
    }
}

impl fmt::Display for MissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
