//! Error types
//!
//! Config problems carry a breadcrumb chain ("Mission: x", "In file: y") so the
//! operator can find the offending entry. Criteria errors are produced by the
//! matcher layer and always name the field path that failed.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A matcher could not be built from its config values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid criteria at '{path}': {reason}")]
pub struct CriteriaError {
    pub path: String,
    pub reason: String,
}

impl CriteriaError {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Registration failures for the type and option registries.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate id '{0}'")]
    DuplicateId(String),
    #[error("registry closed, cannot register '{0}'")]
    Closed(String),
}

/// A single config entry (or a whole file section) failed to resolve.
#[derive(Debug, Error)]
pub struct ConfigError {
    message: String,
    /// Innermost context first.
    contexts: Vec<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            contexts: Vec::new(),
            source: None,
        }
    }

    /// Field could not be resolved from the mission or its template.
    pub fn missing_field(field: &str, template: &str) -> Self {
        Self::new(format!(
            "Field: '{}' is missing in both mission and template '{}'",
            field, template
        ))
    }

    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Push an outer breadcrumb.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.contexts.push(context.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Breadcrumbs, innermost first.
    pub fn contexts(&self) -> &[String] {
        &self.contexts
    }

    /// Multi-line report, outermost context first.
    pub fn report(&self) -> String {
        let mut out = String::new();
        for ctx in self.contexts.iter().rev() {
            out.push_str("  -> ");
            out.push_str(ctx);
            out.push('\n');
        }
        out.push_str("  Error: ");
        out.push_str(&self.message);
        out
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ctx in self.contexts.iter().rev() {
            write!(f, "{} > ", ctx)?;
        }
        f.write_str(&self.message)
    }
}

impl From<CriteriaError> for ConfigError {
    fn from(err: CriteriaError) -> Self {
        ConfigError::new(err.to_string())
    }
}

/// Run `f`, tagging any error it returns with `context`.
pub fn with_context<T>(
    context: impl Into<String>,
    f: impl FnOnce() -> Result<T, ConfigError>,
) -> Result<T, ConfigError> {
    f().map_err(|e| e.with_context(context))
}

/// Whole-cycle load failures.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{0}")]
    Config(#[from] ConfigError),
}

/// The hot-reload watcher could not be started.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("hot-reload needs a tokio runtime: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),
    #[error("failed to watch data directory: {0}")]
    Notify(#[from] notify::Error),
}
