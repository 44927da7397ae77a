//! Version range handling.
//!
//! Ranges use interval notation:
//! - `1.0`         -> `>= 1.0.0`
//! - `[1.0]`       -> exactly `1.0.0`
//! - `[1.0,2.0]`   -> `>= 1.0.0` and `<= 2.0.0`
//! - `(1.0,2.0)`   -> `> 1.0.0` and `< 2.0.0`
//! - `[1.0,)`      -> `>= 1.0.0`
//! - `(,2.0]`      -> `<= 2.0.0`
//! - `*` or empty  -> any version
//!
//! Versions are parsed leniently: `1` and `1.0` become `1.0.0` and a leading
//! `v` is accepted.

use semver::Version;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while parsing versions and ranges.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionRangeError {
    /// A version inside the range is not a valid semantic version.
    #[error("invalid version '{input}': {reason}")]
    InvalidVersion {
        /// The rejected version text.
        input: String,
        /// Parser message.
        reason: String,
    },

    /// The range text does not follow interval notation.
    #[error("malformed version range '{input}': {reason}")]
    Malformed {
        /// The rejected range text.
        input: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// The bounds exclude every version.
    #[error("version range '{input}' cannot match any version")]
    Empty {
        /// The rejected range text.
        input: String,
    },
}

/// Parse a version, padding missing minor/patch components.
pub fn parse_version(input: &str) -> Result<Version, VersionRangeError> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);

    let split = trimmed.find(['-', '+']).unwrap_or(trimmed.len());
    let (core, suffix) = trimmed.split_at(split);
    let normalized = match core.matches('.').count() {
        0 => format!("{core}.0.0{suffix}"),
        1 => format!("{core}.0{suffix}"),
        _ => trimmed.to_string(),
    };

    Version::parse(&normalized).map_err(|e| VersionRangeError::InvalidVersion {
        input: input.to_string(),
        reason: e.to_string(),
    })
}

/// One end of a version range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bound {
    /// Bounding version.
    pub version: Version,
    /// Whether the bounding version itself is accepted.
    pub inclusive: bool,
}

impl Bound {
    /// Inclusive bound.
    #[must_use]
    pub const fn inclusive(version: Version) -> Self {
        Self {
            version,
            inclusive: true,
        }
    }

    /// Exclusive bound.
    #[must_use]
    pub const fn exclusive(version: Version) -> Self {
        Self {
            version,
            inclusive: false,
        }
    }
}

/// The set of versions a dependency accepts.
///
/// An exact version, when present, takes precedence over the bounds. A range
/// without any bound accepts every version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VersionRange {
    /// Lower bound.
    pub min: Option<Bound>,
    /// Upper bound.
    pub max: Option<Bound>,
    /// Exact version.
    pub exact: Option<Version>,
}

impl VersionRange {
    /// Range accepting every version.
    #[must_use]
    pub const fn any() -> Self {
        Self {
            min: None,
            max: None,
            exact: None,
        }
    }

    /// Range accepting a single version.
    #[must_use]
    pub const fn exact(version: Version) -> Self {
        Self {
            min: None,
            max: None,
            exact: Some(version),
        }
    }

    /// `>= version`.
    #[must_use]
    pub const fn at_least(version: Version) -> Self {
        Self {
            min: Some(Bound::inclusive(version)),
            max: None,
            exact: None,
        }
    }

    /// `<= version`.
    #[must_use]
    pub const fn at_most(version: Version) -> Self {
        Self {
            min: None,
            max: Some(Bound::inclusive(version)),
            exact: None,
        }
    }

    /// `>= min` and `<= max`.
    #[must_use]
    pub const fn between(min: Version, max: Version) -> Self {
        Self {
            min: Some(Bound::inclusive(min)),
            max: Some(Bound::inclusive(max)),
            exact: None,
        }
    }

    /// Replace the lower bound.
    #[must_use]
    pub fn with_min(mut self, min: Bound) -> Self {
        self.min = Some(min);
        self
    }

    /// Replace the upper bound.
    #[must_use]
    pub fn with_max(mut self, max: Bound) -> Self {
        self.max = Some(max);
        self
    }

    /// Whether this range accepts every version.
    #[must_use]
    pub const fn is_any(&self) -> bool {
        self.min.is_none() && self.max.is_none() && self.exact.is_none()
    }

    /// Check whether a version satisfies the range.
    #[must_use]
    pub fn contains(&self, version: &Version) -> bool {
        if let Some(exact) = &self.exact {
            return exact == version;
        }

        let above_min = self.min.as_ref().is_none_or(|min| {
            if min.inclusive {
                version >= &min.version
            } else {
                version > &min.version
            }
        });
        let below_max = self.max.as_ref().is_none_or(|max| {
            if max.inclusive {
                version <= &max.version
            } else {
                version < &max.version
            }
        });

        above_min && below_max
    }

    /// Parse a range from interval notation.
    pub fn parse(input: &str) -> Result<Self, VersionRangeError> {
        let s = input.trim();
        if s.is_empty() || s == "*" {
            return Ok(Self::any());
        }

        let malformed = |reason| VersionRangeError::Malformed {
            input: input.to_string(),
            reason,
        };

        // A bare version is a minimum
        if !s.starts_with(['[', '(']) {
            return Ok(Self::at_least(parse_version(s)?));
        }

        let min_inclusive = s.starts_with('[');
        let max_inclusive = if s.ends_with(']') {
            true
        } else if s.ends_with(')') {
            false
        } else {
            return Err(malformed("missing closing ']' or ')'"));
        };
        if s.len() < 3 {
            return Err(malformed("empty interval"));
        }

        let inner = &s[1..s.len() - 1];
        let Some((low, high)) = inner.split_once(',') else {
            if !(min_inclusive && max_inclusive) {
                return Err(malformed("an exact version must be written as [version]"));
            }
            return Ok(Self::exact(parse_version(inner)?));
        };

        if high.contains(',') {
            return Err(malformed("more than two bounds"));
        }

        let (low, high) = (low.trim(), high.trim());
        if low.is_empty() && high.is_empty() {
            return Err(malformed("at least one bound is required"));
        }

        let min = if low.is_empty() {
            None
        } else {
            Some(Bound {
                version: parse_version(low)?,
                inclusive: min_inclusive,
            })
        };
        let max = if high.is_empty() {
            None
        } else {
            Some(Bound {
                version: parse_version(high)?,
                inclusive: max_inclusive,
            })
        };

        if let (Some(min), Some(max)) = (&min, &max) {
            let empty = min.version > max.version
                || (min.version == max.version && !(min.inclusive && max.inclusive));
            if empty {
                return Err(VersionRangeError::Empty {
                    input: input.to_string(),
                });
            }
        }

        Ok(Self {
            min,
            max,
            exact: None,
        })
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(exact) = &self.exact {
            return write!(f, "[{exact}]");
        }

        match (&self.min, &self.max) {
            (None, None) => f.write_str("*"),
            (min, max) => {
                let open = if min.as_ref().is_some_and(|b| b.inclusive) {
                    '['
                } else {
                    '('
                };
                let close = if max.as_ref().is_some_and(|b| b.inclusive) {
                    ']'
                } else {
                    ')'
                };
                write!(f, "{open}")?;
                if let Some(min) = min {
                    write!(f, "{}", min.version)?;
                }
                f.write_str(",")?;
                if let Some(max) = max {
                    write!(f, "{}", max.version)?;
                }
                write!(f, "{close}")
            }
        }
    }
}

impl FromStr for VersionRange {
    type Err = VersionRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for VersionRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
