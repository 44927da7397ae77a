//! Candidate version selection.
//!
//! Given every known version of a package and a requested range, pick the
//! version a dependency should resolve to.

use crate::package::{Package, PackageId};
use crate::version::VersionRange;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Which satisfying version to prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyVersion {
    /// The lowest satisfying version.
    Lowest,
    /// The highest patch release of the lowest satisfying `major.minor`.
    HighestPatch,
    /// The highest minor release of the lowest satisfying major.
    HighestMinor,
    /// The highest satisfying version.
    #[default]
    Highest,
}

impl DependencyVersion {
    /// Parse a policy name (`lowest`, `highest-patch`, `highest-minor`, `highest`).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lowest" => Some(Self::Lowest),
            "highest-patch" | "highestpatch" => Some(Self::HighestPatch),
            "highest-minor" | "highestminor" => Some(Self::HighestMinor),
            "highest" => Some(Self::Highest),
            _ => None,
        }
    }

    /// Canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lowest => "lowest",
            Self::HighestPatch => "highest-patch",
            Self::HighestMinor => "highest-minor",
            Self::Highest => "highest",
        }
    }
}

impl fmt::Display for DependencyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options applied when selecting among candidate versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionOptions {
    /// Which satisfying version to prefer.
    pub dependency_version: DependencyVersion,
    /// Whether pre-release versions may be selected.
    pub allow_prerelease: bool,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            dependency_version: DependencyVersion::Highest,
            allow_prerelease: true,
        }
    }
}

/// Select the best candidate for `id` within `range`.
///
/// Candidates with a different id are ignored. The result is deterministic:
/// candidates are ordered by version descending with a stable sort, so among
/// duplicates of one version the first supplied wins.
#[must_use]
pub fn select_best(
    candidates: &[Arc<Package>],
    id: &PackageId,
    range: &VersionRange,
    options: &SelectionOptions,
) -> Option<Arc<Package>> {
    let mut matching: Vec<&Arc<Package>> = candidates
        .iter()
        .filter(|p| p.id() == id && range.contains(p.version()))
        .filter(|p| {
            options.allow_prerelease
                || p.version().pre.is_empty()
                || range.exact.as_ref() == Some(p.version())
        })
        .collect();

    matching.sort_by(|a, b| b.version().cmp(a.version()));

    let chosen = match options.dependency_version {
        DependencyVersion::Highest => matching.first(),
        DependencyVersion::Lowest => matching.last(),
        DependencyVersion::HighestPatch => {
            let lowest = matching.last()?.version();
            matching
                .iter()
                .find(|p| p.version().major == lowest.major && p.version().minor == lowest.minor)
        }
        DependencyVersion::HighestMinor => {
            let lowest = matching.last()?.version();
            matching.iter().find(|p| p.version().major == lowest.major)
        }
    };

    chosen.map(|p| Arc::clone(p))
}
