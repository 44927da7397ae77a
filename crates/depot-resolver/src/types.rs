//! Core types for dependency resolution.
//!
//! This module contains the values produced by every resolution operation:
//! - `ResolveError`: fatal failures that abort a walk
//! - `ResolveWarning`: non-fatal notices collected alongside a result
//! - `Resolved`: a result value paired with its warnings
//! - `WarningSink`: where callers forward warnings

use depot_core::{Dependency, ErrorCode, PackageIdentity, Version};
use std::fmt;
use thiserror::Error;
use tracing::warn;

fn join(identities: &[PackageIdentity], separator: &str) -> String {
    identities
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

/// Where an uninstall takes place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum UninstallScope {
    /// The shared package repository.
    #[default]
    Repository,
    /// A named project.
    Project(String),
}

impl fmt::Display for UninstallScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Repository => f.write_str("the repository"),
            Self::Project(name) => write!(f, "project '{name}'"),
        }
    }
}

/// Errors that abort a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// A declared dependency matched nothing in any consulted repository.
    #[error("unable to resolve dependency '{dependency}' of {package}")]
    UnresolvedDependency {
        /// The package declaring the dependency.
        package: PackageIdentity,
        /// The dependency that could not be resolved.
        dependency: Dependency,
    },

    /// A dependency chain revisits a package that is still being walked.
    #[error("circular dependency detected: {}", join(.chain, " => "))]
    CircularDependency {
        /// Packages on the cycle in visitation order, ending with the revisited one.
        chain: Vec<PackageIdentity>,
    },

    /// Replacing an installed version would break packages depending on it.
    #[error(
        "cannot replace installed {installed} with version {new_version}: required by {}",
        join(.dependents, ", ")
    )]
    Conflict {
        /// The installed package being replaced.
        installed: PackageIdentity,
        /// The version that would replace it.
        new_version: Version,
        /// Dependents whose ranges exclude the new version.
        dependents: Vec<PackageIdentity>,
    },

    /// Removing a package would orphan packages depending on it.
    #[error("unable to uninstall {package} from {scope}: required by {}", join(.dependents, ", "))]
    DependentsExist {
        /// The package being removed.
        package: PackageIdentity,
        /// Where it is being removed from.
        scope: UninstallScope,
        /// Packages that still depend on it.
        dependents: Vec<PackageIdentity>,
    },
}

impl ResolveError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnresolvedDependency { .. } => ErrorCode::E0201,
            Self::CircularDependency { .. } => ErrorCode::E0202,
            Self::Conflict { .. } => ErrorCode::E0203,
            Self::DependentsExist { .. } => ErrorCode::E0204,
        }
    }

    /// Get suggestions for fixing this error.
    #[must_use]
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::UnresolvedDependency { dependency, .. } => vec![
                format!("Check that a repository provides '{}'", dependency.id),
                format!("Widen the range '{}'", dependency.range),
            ],
            Self::CircularDependency { .. } => vec![
                "Review the dependency chain for the listed packages".to_string(),
                "Consider refactoring to break the circular dependency".to_string(),
            ],
            Self::Conflict { dependents, .. } => vec![
                format!("Update {} first", join(dependents, ", ")),
                "Use force to install anyway".to_string(),
            ],
            Self::DependentsExist { dependents, .. } => vec![
                format!("Uninstall {} first", join(dependents, ", ")),
                "Use force to uninstall anyway".to_string(),
            ],
        }
    }

    /// Packages named by this error.
    #[must_use]
    pub fn packages(&self) -> Vec<PackageIdentity> {
        match self {
            Self::UnresolvedDependency { package, .. } => vec![package.clone()],
            Self::CircularDependency { chain } => chain.clone(),
            Self::Conflict {
                installed,
                dependents,
                ..
            } => std::iter::once(installed.clone())
                .chain(dependents.iter().cloned())
                .collect(),
            Self::DependentsExist {
                package,
                dependents,
                ..
            } => std::iter::once(package.clone())
                .chain(dependents.iter().cloned())
                .collect(),
        }
    }
}

impl From<ResolveError> for depot_core::Error {
    fn from(err: ResolveError) -> Self {
        let packages: Vec<String> = err.packages().iter().map(ToString::to_string).collect();
        match err {
            ResolveError::CircularDependency { .. } => Self::circular_dependency(packages),
            other => Self::resolution(other.code(), other.to_string(), packages, other.suggestions()),
        }
    }
}

/// Non-fatal notices produced while resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveWarning {
    /// A package was removed despite dependents because force was set.
    DependentsIgnored {
        /// The removed package.
        package: PackageIdentity,
        /// Where it was removed from.
        scope: UninstallScope,
        /// Dependents that may now be broken.
        dependents: Vec<PackageIdentity>,
    },

    /// A dependency was kept during a cascading uninstall.
    SkippedDependency {
        /// The dependency left installed.
        package: PackageIdentity,
        /// Packages outside the removal set that still need it.
        dependents: Vec<PackageIdentity>,
    },

    /// A version conflict was allowed because force was set.
    ConflictIgnored {
        /// The installed package being replaced.
        installed: PackageIdentity,
        /// The replacing version.
        new_version: Version,
        /// Dependents whose ranges exclude the new version.
        dependents: Vec<PackageIdentity>,
    },
}

impl ResolveWarning {
    /// Short machine-readable kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::DependentsIgnored { .. } => "dependents-ignored",
            Self::SkippedDependency { .. } => "skipped-dependency",
            Self::ConflictIgnored { .. } => "conflict-ignored",
        }
    }

    /// The package the warning is about.
    #[must_use]
    pub const fn package(&self) -> &PackageIdentity {
        match self {
            Self::DependentsIgnored { package, .. } | Self::SkippedDependency { package, .. } => {
                package
            }
            Self::ConflictIgnored { installed, .. } => installed,
        }
    }

    /// Dependents named by the warning.
    #[must_use]
    pub fn dependents(&self) -> &[PackageIdentity] {
        match self {
            Self::DependentsIgnored { dependents, .. }
            | Self::SkippedDependency { dependents, .. }
            | Self::ConflictIgnored { dependents, .. } => dependents,
        }
    }
}

impl fmt::Display for ResolveWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DependentsIgnored {
                package,
                scope,
                dependents,
            } => write!(
                f,
                "{package} was removed from {scope} although {} depend on it",
                join(dependents, ", ")
            ),
            Self::SkippedDependency {
                package,
                dependents,
            } => write!(
                f,
                "{package} was not removed because {} still depend on it",
                join(dependents, ", ")
            ),
            Self::ConflictIgnored {
                installed,
                new_version,
                dependents,
            } => write!(
                f,
                "{} {new_version} replaces {installed} although {} require it",
                installed.id,
                join(dependents, ", ")
            ),
        }
    }
}

/// Receiver for warnings produced by a resolution.
pub trait WarningSink {
    /// Report one warning.
    fn report(&mut self, warning: &ResolveWarning);
}

impl WarningSink for Vec<ResolveWarning> {
    fn report(&mut self, warning: &ResolveWarning) {
        self.push(warning.clone());
    }
}

/// Sink forwarding every warning to `tracing` at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingWarningSink;

impl WarningSink for TracingWarningSink {
    fn report(&mut self, warning: &ResolveWarning) {
        warn!(kind = warning.kind(), package = %warning.package(), "{warning}");
    }
}

/// A successful result together with the warnings raised producing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    /// The result.
    pub value: T,
    /// Warnings in the order they were raised.
    pub warnings: Vec<ResolveWarning>,
}

impl<T> Resolved<T> {
    /// Wrap a value with warnings.
    #[must_use]
    pub const fn new(value: T, warnings: Vec<ResolveWarning>) -> Self {
        Self { value, warnings }
    }

    /// Check whether any warning was raised.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Transform the value, keeping the warnings.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        Resolved {
            value: f(self.value),
            warnings: self.warnings,
        }
    }

    /// Forward every warning to a sink and return the value.
    pub fn report_to(self, sink: &mut impl WarningSink) -> T {
        for warning in &self.warnings {
            sink.report(warning);
        }
        self.value
    }
}
