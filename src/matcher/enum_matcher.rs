use std::collections::BTreeSet;

use super::names::NamedVariant;
use super::wildcard;
use crate::error::CriteriaError;

/// Set-membership matcher over a closed enumeration.
///
/// An empty input list, or one containing `*`, matches every value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMatcher<E: NamedVariant> {
    values: BTreeSet<E>,
    any: bool,
}

impl<E: NamedVariant> EnumMatcher<E> {
    pub fn any() -> Self {
        Self {
            values: BTreeSet::new(),
            any: true,
        }
    }

    pub fn of(values: impl IntoIterator<Item = E>) -> Self {
        Self {
            values: values.into_iter().collect(),
            any: false,
        }
    }

    /// Resolve config tokens. `path` is the config field the tokens came from.
    pub fn parse<S: AsRef<str>>(path: &str, targets: &[S]) -> Result<Self, CriteriaError> {
        if targets.is_empty() || targets.iter().any(|t| t.as_ref().trim() == wildcard::WILDCARD) {
            return Ok(Self::any());
        }

        let mut values = BTreeSet::new();
        for target in targets {
            let token = target.as_ref().trim().to_ascii_uppercase();

            if let Some(exact) = E::from_name(&token) {
                values.insert(exact);
                continue;
            }

            if !wildcard::is_pattern(&token) {
                return Err(CriteriaError::new(path, format!("Invalid {}: {}", E::KIND, token)));
            }

            let mut found = false;
            for constant in E::all() {
                if wildcard::matches(&token, constant.name()) {
                    values.insert(*constant);
                    found = true;
                }
            }
            if !found {
                return Err(CriteriaError::new(
                    path,
                    format!("Wildcard '{}' did not match any existing {}", token, E::KIND),
                ));
            }
        }

        Ok(Self { values, any: false })
    }

    pub fn matches(&self, value: E) -> bool {
        self.any || self.values.contains(&value)
    }

    pub fn is_any(&self) -> bool {
        self.any
    }

    pub fn values(&self) -> &BTreeSet<E> {
        &self.values
    }
}
