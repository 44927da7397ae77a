//! Environment variable configuration support.

use crate::error::{ConfigError, Result};
use crate::settings::SettingsLayer;

/// Environment variables read by depot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepotEnvVar {
    /// `DEPOT_DEPENDENCY_VERSION` - version selection policy.
    DependencyVersion,
    /// `DEPOT_ALLOW_PRERELEASE` - allow pre-release versions.
    AllowPrerelease,
    /// `DEPOT_VERIFY_SHARED_DEPENDENCIES` - verify reused packages.
    VerifySharedDependencies,
    /// `DEPOT_FORCE` - downgrade blocking errors to warnings.
    Force,
    /// `DEPOT_REMOVE_DEPENDENCIES` - cascade uninstalls.
    RemoveDependencies,
    /// `DEPOT_UPDATE_DEPENDENCIES` - cascade updates.
    UpdateDependencies,
    /// `DEPOT_CONFIG` - path to the settings file.
    Config,
}

impl DepotEnvVar {
    /// Every variable, in a stable order.
    pub const ALL: [Self; 7] = [
        Self::DependencyVersion,
        Self::AllowPrerelease,
        Self::VerifySharedDependencies,
        Self::Force,
        Self::RemoveDependencies,
        Self::UpdateDependencies,
        Self::Config,
    ];

    /// Get the environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DependencyVersion => "DEPOT_DEPENDENCY_VERSION",
            Self::AllowPrerelease => "DEPOT_ALLOW_PRERELEASE",
            Self::VerifySharedDependencies => "DEPOT_VERIFY_SHARED_DEPENDENCIES",
            Self::Force => "DEPOT_FORCE",
            Self::RemoveDependencies => "DEPOT_REMOVE_DEPENDENCIES",
            Self::UpdateDependencies => "DEPOT_UPDATE_DEPENDENCIES",
            Self::Config => "DEPOT_CONFIG",
        }
    }

    /// Get the value from the process environment.
    #[must_use]
    pub fn get(self) -> Option<String> {
        std::env::var(self.as_str()).ok()
    }
}

/// Raw values read from the environment.
///
/// Values are kept as strings until [`EnvConfig::to_layer`] so that a bad
/// value is reported against the variable that carried it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    values: Vec<(DepotEnvVar, String)>,
}

impl EnvConfig {
    /// Read configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|var| var.get())
    }

    /// Read configuration through an arbitrary lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(DepotEnvVar) -> Option<String>) -> Self {
        let values = DepotEnvVar::ALL
            .into_iter()
            .filter_map(|var| lookup(var).map(|value| (var, value)))
            .filter(|(_, value)| !value.trim().is_empty())
            .collect();
        Self { values }
    }

    /// Raw value of one variable.
    #[must_use]
    pub fn get(&self, var: DepotEnvVar) -> Option<&str> {
        self.values
            .iter()
            .find(|(v, _)| *v == var)
            .map(|(_, value)| value.as_str())
    }

    /// Check whether any depot variable is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Settings file path override.
    #[must_use]
    pub fn config_path(&self) -> Option<&str> {
        self.get(DepotEnvVar::Config)
    }

    /// Convert to a settings layer.
    ///
    /// # Errors
    /// Returns error if a boolean variable holds something other than a
    /// recognised boolean.
    pub fn to_layer(&self) -> Result<SettingsLayer> {
        Ok(SettingsLayer {
            dependency_version: self
                .get(DepotEnvVar::DependencyVersion)
                .map(|v| v.trim().to_string()),
            allow_prerelease: self.bool_var(DepotEnvVar::AllowPrerelease)?,
            verify_shared_dependencies: self.bool_var(DepotEnvVar::VerifySharedDependencies)?,
            force: self.bool_var(DepotEnvVar::Force)?,
            remove_dependencies: self.bool_var(DepotEnvVar::RemoveDependencies)?,
            update_dependencies: self.bool_var(DepotEnvVar::UpdateDependencies)?,
        })
    }

    fn bool_var(&self, var: DepotEnvVar) -> Result<Option<bool>> {
        self.get(var)
            .map(|value| {
                parse_bool(value).ok_or_else(|| ConfigError::EnvError {
                    var: var.as_str().to_string(),
                    message: format!("expected a boolean, got '{value}'"),
                })
            })
            .transpose()
    }
}

/// Parse a boolean (1/true/yes/on, 0/false/no/off).
#[must_use]
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
