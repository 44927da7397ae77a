//! Configuration loader with hierarchical merging.

use crate::env::EnvConfig;
use crate::error::{ConfigError, Result};
use crate::settings::{ResolverSettings, SettingsLayer};
use crate::validate::{Severity, ValidationResult, Validator};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default settings file name inside a project directory.
pub const SETTINGS_FILE_NAME: &str = "depot.json";

/// Configuration source in hierarchy order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigSource {
    /// Built-in defaults.
    Defaults = 0,
    /// Project settings file.
    Project = 1,
    /// Environment variables.
    Environment = 2,
    /// Explicit overrides.
    Overrides = 3,
}

impl ConfigSource {
    /// Get description for display.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Defaults => "built-in defaults",
            Self::Project => "project configuration",
            Self::Environment => "environment variables",
            Self::Overrides => "explicit overrides",
        }
    }
}

/// Configuration loader.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Project directory.
    project_dir: PathBuf,
    /// Environment snapshot.
    env_config: EnvConfig,
    /// Highest-priority layer.
    overrides: SettingsLayer,
    /// Validator applied to each layer and to the merged result.
    validator: Validator,
}

impl ConfigLoader {
    /// Create a loader for a project directory, reading the process environment.
    #[must_use]
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            env_config: EnvConfig::from_env(),
            overrides: SettingsLayer::default(),
            validator: Validator::new(),
        }
    }

    /// Replace the environment snapshot.
    #[must_use]
    pub fn with_env(mut self, env_config: EnvConfig) -> Self {
        self.env_config = env_config;
        self
    }

    /// Set explicit overrides.
    #[must_use]
    pub fn with_overrides(mut self, overrides: SettingsLayer) -> Self {
        self.overrides = overrides;
        self
    }

    /// Treat validation warnings as errors.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.validator = Validator::new().strict(strict);
        self
    }

    /// Get the project settings path.
    ///
    /// `DEPOT_CONFIG` wins; relative values are taken from the project directory.
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.env_config.config_path().map_or_else(
            || self.project_dir.join(SETTINGS_FILE_NAME),
            |path| self.resolve_path(path),
        )
    }

    /// Load a settings file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is not a valid settings layer.
    pub fn load_file(path: &Path) -> Result<SettingsLayer> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::json(path, &e))
    }

    /// Collect the layers that contribute to the merged settings, lowest first.
    ///
    /// A missing project file is skipped; any other file error is returned.
    ///
    /// # Errors
    /// Returns error if the project file or the environment is invalid.
    pub fn layers(&self) -> Result<Vec<(ConfigSource, SettingsLayer)>> {
        let mut layers = Vec::with_capacity(3);

        let path = self.settings_path();
        match Self::load_file(&path) {
            Ok(layer) => {
                debug!(path = %path.display(), "loaded project settings");
                layers.push((ConfigSource::Project, layer));
            }
            Err(e) if e.is_not_found() => {
                debug!(path = %path.display(), "no project settings file");
            }
            Err(e) => return Err(e),
        }

        let env_layer = self.env_config.to_layer()?;
        if !env_layer.is_empty() {
            layers.push((ConfigSource::Environment, env_layer));
        }

        if !self.overrides.is_empty() {
            layers.push((ConfigSource::Overrides, self.overrides.clone()));
        }

        Ok(layers)
    }

    /// Build resolved settings by merging all sources.
    ///
    /// # Errors
    /// Returns error if any layer is invalid or the merged settings fail validation.
    pub fn resolve(&self) -> Result<ResolverSettings> {
        let mut settings = ResolverSettings::default();
        let mut report = ValidationResult::new();

        for (source, layer) in self.layers()? {
            let checked = self.validator.validate_layer(&layer, source.description());
            let failed = checked.has_errors();
            report.extend(checked.issues);
            if !failed {
                settings.apply(&layer);
            }
        }

        report.extend(self.validator.validate_settings(&settings).issues);
        for issue in &report.issues {
            if issue.severity == Severity::Warning {
                warn!(code = issue.code, field = %issue.field, "{}", issue.message);
            }
        }
        report.into_result()?;

        info!(
            dependency_version = %settings.dependency_version,
            force = settings.force,
            remove_dependencies = settings.remove_dependencies,
            update_dependencies = settings.update_dependencies,
            "resolver settings loaded"
        );
        Ok(settings)
    }

    /// Resolve a path relative to project directory.
    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = PathBuf::from(path);
        if path.is_absolute() {
            path
        } else {
            self.project_dir.join(path)
        }
    }

    /// Get environment configuration.
    #[must_use]
    pub const fn env(&self) -> &EnvConfig {
        &self.env_config
    }

    /// Get project directory.
    #[must_use]
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::DepotEnvVar;
    use depot_core::DependencyVersion;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn env(pairs: &[(DepotEnvVar, &str)]) -> EnvConfig {
        EnvConfig::from_lookup(|var| {
            pairs
                .iter()
                .find(|(v, _)| *v == var)
                .map(|(_, value)| (*value).to_string())
        })
    }

    fn project(settings: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE_NAME), settings).unwrap();
        dir
    }

    #[test]
    fn defaults_without_any_source() {
        let dir = TempDir::new().unwrap();
        let settings = ConfigLoader::new(dir.path())
            .with_env(EnvConfig::default())
            .resolve()
            .unwrap();
        assert_eq!(settings, ResolverSettings::default());
    }

    #[test]
    fn layers_override_in_order() {
        let dir = project(r#"{"dependency-version": "lowest", "force": true, "remove-dependencies": true}"#);
        let settings = ConfigLoader::new(dir.path())
            .with_env(env(&[
                (DepotEnvVar::DependencyVersion, "highest-patch"),
                (DepotEnvVar::Force, "false"),
            ]))
            .with_overrides(SettingsLayer::default().dependency_version(DependencyVersion::HighestMinor))
            .resolve()
            .unwrap();

        assert_eq!(settings.dependency_version, DependencyVersion::HighestMinor);
        assert!(!settings.force);
        assert!(settings.remove_dependencies);
    }

    #[test]
    fn config_path_from_env() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("custom.json"), r#"{"update-dependencies": true}"#).unwrap();
        let loader = ConfigLoader::new(dir.path()).with_env(env(&[(DepotEnvVar::Config, "custom.json")]));
        assert!(loader.settings_path().ends_with("custom.json"));
        assert!(loader.resolve().unwrap().update_dependencies);
    }

    #[test]
    fn invalid_json_is_reported() {
        let dir = project("{ not json");
        let err = ConfigLoader::new(dir.path())
            .with_env(EnvConfig::default())
            .resolve()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidJson { .. }));
    }

    #[test]
    fn unknown_policy_fails_validation() {
        let dir = project(r#"{"dependency-version": "newest"}"#);
        let err = ConfigLoader::new(dir.path())
            .with_env(EnvConfig::default())
            .resolve()
            .unwrap_err();
        match err {
            ConfigError::InvalidValue { ref field, .. } => {
                assert!(field.contains("project configuration"));
                assert_eq!(err.key(), Some(field.as_str()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_policy_in_every_layer_is_collected() {
        let dir = project(r#"{"dependency-version": "newest"}"#);
        let err = ConfigLoader::new(dir.path())
            .with_env(env(&[(DepotEnvVar::DependencyVersion, "oldest")]))
            .resolve()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationFailed { count: 2, .. }));
    }

    #[test]
    fn strict_loader_rejects_warnings() {
        let dir = project(r#"{"force": true, "remove-dependencies": true}"#);
        let loader = ConfigLoader::new(dir.path()).with_env(EnvConfig::default());
        assert!(loader.resolve().is_ok());
        assert!(loader.strict(true).resolve().is_err());
    }

    #[test]
    fn layers_skip_empty_sources() {
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::new(dir.path())
            .with_env(env(&[(DepotEnvVar::Force, "1")]))
            .with_overrides(SettingsLayer::default());
        let layers = loader.layers().unwrap();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].0, ConfigSource::Environment);
    }
}
