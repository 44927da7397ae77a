//! Resolver settings and partial settings layers.

use depot_core::{DependencyVersion, SelectionOptions};
use serde::{Deserialize, Serialize};

/// Fully merged resolver settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ResolverSettings {
    /// Which satisfying version a dependency resolves to.
    pub dependency_version: DependencyVersion,
    /// Whether pre-release versions may be selected.
    pub allow_prerelease: bool,
    /// Whether a package already scheduled for install must satisfy the
    /// range of a later dependency on the same id before it is reused.
    pub verify_shared_dependencies: bool,
    /// Downgrade blocking dependents and version conflicts to warnings.
    pub force: bool,
    /// Cascade uninstalls into dependencies nobody else needs.
    pub remove_dependencies: bool,
    /// Cascade updates into the dependencies of the replaced package.
    pub update_dependencies: bool,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            dependency_version: DependencyVersion::Highest,
            allow_prerelease: true,
            verify_shared_dependencies: true,
            force: false,
            remove_dependencies: false,
            update_dependencies: false,
        }
    }
}

impl ResolverSettings {
    /// Version selection options derived from these settings.
    #[must_use]
    pub const fn selection(&self) -> SelectionOptions {
        SelectionOptions {
            dependency_version: self.dependency_version,
            allow_prerelease: self.allow_prerelease,
        }
    }

    /// Apply a layer on top of these settings.
    ///
    /// The layer's `dependency-version` must already be validated; unknown
    /// names are ignored here.
    pub fn apply(&mut self, layer: &SettingsLayer) {
        if let Some(policy) = layer
            .dependency_version
            .as_deref()
            .and_then(DependencyVersion::parse)
        {
            self.dependency_version = policy;
        }
        if let Some(allow) = layer.allow_prerelease {
            self.allow_prerelease = allow;
        }
        if let Some(verify) = layer.verify_shared_dependencies {
            self.verify_shared_dependencies = verify;
        }
        if let Some(force) = layer.force {
            self.force = force;
        }
        if let Some(remove) = layer.remove_dependencies {
            self.remove_dependencies = remove;
        }
        if let Some(update) = layer.update_dependencies {
            self.update_dependencies = update;
        }
    }
}

/// One configuration layer: every field is optional.
///
/// This is the shape of `depot.json`, of the environment and of explicit
/// overrides. `dependency-version` stays a string so that an unknown policy
/// can be reported with its source instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SettingsLayer {
    /// Version selection policy name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency_version: Option<String>,
    /// Whether pre-release versions may be selected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_prerelease: Option<bool>,
    /// Verify reused packages against later dependency ranges.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify_shared_dependencies: Option<bool>,
    /// Downgrade blocking errors to warnings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
    /// Cascade uninstalls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_dependencies: Option<bool>,
    /// Cascade updates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_dependencies: Option<bool>,
}

impl SettingsLayer {
    /// Whether the layer sets nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Set the version selection policy.
    #[must_use]
    pub fn dependency_version(mut self, policy: DependencyVersion) -> Self {
        self.dependency_version = Some(policy.as_str().to_string());
        self
    }

    /// Set `force`.
    #[must_use]
    pub const fn force(mut self, force: bool) -> Self {
        self.force = Some(force);
        self
    }

    /// Set `remove-dependencies`.
    #[must_use]
    pub const fn remove_dependencies(mut self, remove: bool) -> Self {
        self.remove_dependencies = Some(remove);
        self
    }

    /// Set `update-dependencies`.
    #[must_use]
    pub const fn update_dependencies(mut self, update: bool) -> Self {
        self.update_dependencies = Some(update);
        self
    }
}
