//! Inclusive integer ranges
//!
//! Used for requirement sampling, stack amounts and enchantment levels.
//!
//! Text forms:
//! - `"5"` is `[5, 5]`
//! - `"3-7"` is `[3, 7]` (bounds are trimmed, and swapped if reversed)
//! - `"10+"` is `[10, MAX]`
//! - `"-4"` is `[0, 4]`

use std::fmt;

use rand::Rng;

use crate::error::CriteriaError;

const SPLITTER: char = '-';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntRange {
    min: u32,
    max: u32,
}

impl IntRange {
    /// Every non-negative value.
    pub const ANY: IntRange = IntRange { min: 0, max: u32::MAX };

    /// Panics if `min > max`; callers holding untrusted bounds use [`IntRange::ordered`].
    pub fn new(min: u32, max: u32) -> Self {
        assert!(
            min <= max,
            "IntRange min ({}) cannot be greater than max ({})",
            min,
            max
        );
        Self { min, max }
    }

    pub fn single(value: u32) -> Self {
        Self { min: value, max: value }
    }

    pub fn ordered(a: u32, b: u32) -> Self {
        Self::new(a.min(b), a.max(b))
    }

    pub fn parse(text: &str) -> Result<Self, CriteriaError> {
        let text = text.trim();
        let bad = |reason: String| CriteriaError::new("range", format!("'{}': {}", text, reason));
        let number = |s: &str| {
            s.trim()
                .parse::<u32>()
                .map_err(|e| bad(format!("'{}' is not a non-negative integer ({})", s.trim(), e)))
        };

        if text.len() > 1 {
            if let Some(lower) = text.strip_suffix('+') {
                return Ok(Self::new(number(lower)?, u32::MAX));
            }
            if let Some(upper) = text.strip_prefix(SPLITTER) {
                return Ok(Self::new(0, number(upper)?));
            }
        }

        match text.split_once(SPLITTER) {
            Some((a, b)) => Ok(Self::ordered(number(a)?, number(b)?)),
            None => Ok(Self::single(number(text)?)),
        }
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn contains(&self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Uniform draw over the inclusive interval.
    pub fn random(&self) -> u32 {
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

impl fmt::Display for IntRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else if self.max == u32::MAX {
            write!(f, "{}+", self.min)
        } else {
            write!(f, "{}-{}", self.min, self.max)
        }
    }
}
