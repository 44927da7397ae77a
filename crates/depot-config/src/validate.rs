//! Configuration validation with descriptive errors.

use crate::error::{ConfigError, Result};
use crate::settings::{ResolverSettings, SettingsLayer};
use depot_core::DependencyVersion;

/// Validation severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational message.
    Info,
    /// Warning (may indicate issues).
    Warning,
    /// Error (must be fixed).
    Error,
}

/// Validation issue.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity level.
    pub severity: Severity,
    /// Issue code for programmatic handling.
    pub code: &'static str,
    /// Settings key.
    pub field: String,
    /// Human-readable message.
    pub message: String,
    /// Suggested fix.
    pub hint: Option<String>,
}

impl ValidationIssue {
    /// Create a new error.
    #[must_use]
    pub fn error(code: &'static str, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, field, message)
    }

    /// Create a new warning.
    #[must_use]
    pub fn warning(
        code: &'static str,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Warning, code, field, message)
    }

    /// Create a new info message.
    #[must_use]
    pub fn info(code: &'static str, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, field, message)
    }

    fn new(
        severity: Severity,
        code: &'static str,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code,
            field: field.into(),
            message: message.into(),
            hint: None,
        }
    }

    /// Add a hint to the issue.
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Validation result containing all issues.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// All validation issues.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Create a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an issue.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Add multiple issues.
    pub fn extend(&mut self, issues: impl IntoIterator<Item = ValidationIssue>) {
        self.issues.extend(issues);
    }

    /// Check if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// Check if there are any warnings.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Warning)
    }

    /// Get error count.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Get warning count.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    /// Convert to result, failing if there are errors.
    ///
    /// A single error is reported as [`ConfigError::InvalidValue`] so its
    /// field and hint survive; several are collected into
    /// [`ConfigError::ValidationFailed`].
    ///
    /// # Errors
    /// Returns error if validation has errors.
    pub fn into_result(self) -> Result<()> {
        let mut errors: Vec<ValidationIssue> = self
            .issues
            .into_iter()
            .filter(|i| i.severity == Severity::Error)
            .collect();

        match errors.len() {
            0 => Ok(()),
            1 => {
                let issue = errors.remove(0);
                let hint = issue
                    .hint
                    .unwrap_or_else(|| format!("review the value of '{}'", issue.field));
                Err(ConfigError::invalid_value(issue.field, issue.message, hint))
            }
            count => Err(ConfigError::ValidationFailed {
                count,
                errors: errors
                    .iter()
                    .map(|i| format!("{}: {}", i.field, i.message))
                    .collect(),
            }),
        }
    }
}

/// Settings validator.
#[derive(Debug, Default)]
pub struct Validator {
    strict: bool,
}

impl Validator {
    /// Create a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// In strict mode warnings are reported as errors.
    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Validate one settings layer before it is merged.
    ///
    /// `origin` names where the layer came from and prefixes field names.
    #[must_use]
    pub fn validate_layer(&self, layer: &SettingsLayer, origin: &str) -> ValidationResult {
        let mut result = ValidationResult::new();

        if let Some(policy) = &layer.dependency_version
            && DependencyVersion::parse(policy).is_none()
        {
            result.add(
                ValidationIssue::error(
                    "unknown-dependency-version",
                    format!("{origin}: dependency-version"),
                    format!("unknown version selection policy '{policy}'"),
                )
                .with_hint("use one of: lowest, highest-patch, highest-minor, highest"),
            );
        }

        result
    }

    /// Validate merged settings for questionable combinations.
    #[must_use]
    pub fn validate_settings(&self, settings: &ResolverSettings) -> ValidationResult {
        let mut result = ValidationResult::new();

        if settings.force && settings.remove_dependencies {
            result.add(self.warning(
                ValidationIssue::warning(
                    "force-cascade",
                    "force",
                    "force together with remove-dependencies may remove packages other packages still need",
                )
                .with_hint("disable one of force or remove-dependencies"),
            ));
        }

        if !settings.verify_shared_dependencies {
            result.add(
                ValidationIssue::info(
                    "unverified-shared-dependencies",
                    "verify-shared-dependencies",
                    "a package already scheduled for install is reused for any later range",
                )
                .with_hint("set verify-shared-dependencies to true to check ranges"),
            );
        }

        if !settings.allow_prerelease && settings.dependency_version == DependencyVersion::Lowest {
            result.add(ValidationIssue::info(
                "lowest-stable",
                "dependency-version",
                "lowest selection skips pre-releases, so the first stable version is chosen",
            ));
        }

        result
    }

    fn warning(&self, mut issue: ValidationIssue) -> ValidationIssue {
        if self.strict {
            issue.severity = Severity::Error;
        }
        issue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_policy_is_an_error() {
        let layer = SettingsLayer {
            dependency_version: Some("newest".to_string()),
            ..SettingsLayer::default()
        };
        let result = Validator::new().validate_layer(&layer, "depot.json");
        assert!(result.has_errors());
        assert_eq!(result.issues[0].field, "depot.json: dependency-version");
        match result.into_result().unwrap_err() {
            ConfigError::InvalidValue { field, hint, .. } => {
                assert_eq!(field, "depot.json: dependency-version");
                assert!(hint.contains("highest-minor"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn several_errors_are_collected() {
        let mut result = ValidationResult::new();
        result.add(ValidationIssue::error("a", "env: dependency-version", "bad"));
        result.add(ValidationIssue::error("b", "depot.json: dependency-version", "bad"));
        match result.into_result().unwrap_err() {
            ConfigError::ValidationFailed { count, errors } => {
                assert_eq!(count, 2);
                assert_eq!(errors[0], "env: dependency-version: bad");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn known_policy_passes() {
        let layer = SettingsLayer {
            dependency_version: Some("Highest-Minor".to_string()),
            ..SettingsLayer::default()
        };
        assert!(!Validator::new().validate_layer(&layer, "env").has_errors());
    }

    #[test]
    fn force_with_cascade_warns() {
        let settings = ResolverSettings {
            force: true,
            remove_dependencies: true,
            ..ResolverSettings::default()
        };
        let result = Validator::new().validate_settings(&settings);
        assert_eq!(result.warning_count(), 1);
        assert_eq!(result.error_count(), 0);
        assert!(result.into_result().is_ok());
    }

    #[test]
    fn strict_mode_promotes_warnings() {
        let settings = ResolverSettings {
            force: true,
            remove_dependencies: true,
            ..ResolverSettings::default()
        };
        let result = Validator::new().strict(true).validate_settings(&settings);
        assert!(result.has_errors());
    }

    #[test]
    fn defaults_are_clean() {
        let result = Validator::new().validate_settings(&ResolverSettings::default());
        assert!(result.issues.is_empty());
    }
}
