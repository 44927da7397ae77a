//! Error types for depot operations.
//!
//! Each error has:
//! - A unique error code (e.g., E0201) for easy reference and searching
//! - A clear error message explaining what went wrong
//! - Suggestions for how to fix the issue

use std::fmt;
use thiserror::Error;

/// Error codes for depot errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Resolution errors (E02xx)
    /// A dependency could not be resolved
    E0201,
    /// Circular dependency detected
    E0202,
    /// Installing a version would break installed dependents
    E0203,
    /// Removing a package would break installed dependents
    E0204,

    // Input errors (E04xx)
    /// Invalid package id
    E0401,
    /// Invalid version
    E0402,
    /// Invalid version range
    E0403,

    // Configuration errors (E11xx)
    /// Invalid configuration
    E1101,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::E0201 => "E0201",
            Self::E0202 => "E0202",
            Self::E0203 => "E0203",
            Self::E0204 => "E0204",
            Self::E0401 => "E0401",
            Self::E0402 => "E0402",
            Self::E0403 => "E0403",
            Self::E1101 => "E1101",
        }
    }

    /// Get a brief title for this error code.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::E0201 => "Unresolved dependency",
            Self::E0202 => "Circular dependency",
            Self::E0203 => "Conflicting versions",
            Self::E0204 => "Dependents exist",
            Self::E0401 => "Invalid package id",
            Self::E0402 => "Invalid version",
            Self::E0403 => "Invalid version range",
            Self::E1101 => "Invalid configuration",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for depot.
#[derive(Error, Debug)]
pub enum Error {
    /// Dependency resolution failed.
    #[error("[{code}] resolution failed: {message}")]
    Resolution {
        /// Error code.
        #[source]
        code: ErrorCodeSource,
        /// Error message.
        message: String,
        /// Packages involved in the failure.
        packages: Vec<String>,
        /// Suggestions for fixing.
        suggestions: Vec<String>,
    },

    /// Circular dependency.
    #[error("[{code}] circular dependency detected: {cycle}")]
    CircularDependency {
        /// Error code.
        #[source]
        code: ErrorCodeSource,
        /// The dependency cycle.
        cycle: String,
        /// Packages involved.
        packages: Vec<String>,
        /// Suggestions for fixing.
        suggestions: Vec<String>,
    },

    /// Invalid user input (ids, versions, ranges).
    #[error("[{code}] invalid input '{input}': {message}")]
    InvalidInput {
        /// Error code.
        #[source]
        code: ErrorCodeSource,
        /// The rejected input.
        input: String,
        /// Error message.
        message: String,
        /// Suggestions for fixing.
        suggestions: Vec<String>,
    },

    /// Configuration error.
    #[error("[{code}] config error: {message}")]
    Config {
        /// Error code.
        #[source]
        code: ErrorCodeSource,
        /// Error message.
        message: String,
        /// Configuration key.
        key: Option<String>,
        /// Suggestions for fixing.
        suggestions: Vec<String>,
    },
}

/// Wrapper to make `ErrorCode` usable as a source.
#[derive(Debug)]
pub struct ErrorCodeSource(pub ErrorCode);

impl fmt::Display for ErrorCodeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_str())
    }
}

impl std::error::Error for ErrorCodeSource {}

impl Error {
    /// Get the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Resolution { code, .. }
            | Self::CircularDependency { code, .. }
            | Self::InvalidInput { code, .. }
            | Self::Config { code, .. } => code.0,
        }
    }

    /// Get suggestions for fixing this error.
    #[must_use]
    pub fn suggestions(&self) -> &[String] {
        match self {
            Self::Resolution { suggestions, .. }
            | Self::CircularDependency { suggestions, .. }
            | Self::InvalidInput { suggestions, .. }
            | Self::Config { suggestions, .. } => suggestions,
        }
    }

    /// Create a resolution error carrying its own code and suggestions.
    #[must_use]
    pub fn resolution(
        code: ErrorCode,
        message: impl Into<String>,
        packages: Vec<String>,
        suggestions: Vec<String>,
    ) -> Self {
        Self::Resolution {
            code: ErrorCodeSource(code),
            message: message.into(),
            packages,
            suggestions,
        }
    }

    /// Create a circular dependency error from the packages on the cycle.
    #[must_use]
    pub fn circular_dependency(packages: Vec<String>) -> Self {
        Self::CircularDependency {
            code: ErrorCodeSource(ErrorCode::E0202),
            cycle: packages.join(" => "),
            packages,
            suggestions: vec![
                "Review the dependency chain for the listed packages".to_string(),
                "Consider refactoring to break the circular dependency".to_string(),
            ],
        }
    }

    /// Create an input error for a rejected package id, version or range.
    #[must_use]
    pub fn invalid_input(code: ErrorCode, input: impl Into<String>, message: impl Into<String>) -> Self {
        let suggestions = match code {
            ErrorCode::E0401 => vec!["Package ids must be non-empty".to_string()],
            ErrorCode::E0402 => vec!["Versions look like 1.2.3, 1.2 or 1".to_string()],
            _ => vec![
                "Ranges use interval notation, e.g. [1.0,2.0) or 1.0".to_string(),
                "Use * to accept any version".to_string(),
            ],
        };
        Self::InvalidInput {
            code: ErrorCodeSource(code),
            input: input.into(),
            message: message.into(),
            suggestions,
        }
    }

    /// Create a config error.
    #[must_use]
    pub fn config(message: impl Into<String>, key: Option<String>) -> Self {
        let mut suggestions = vec!["Check your depot.json for errors".to_string()];
        if let Some(ref k) = key {
            suggestions.push(format!("Review the value of '{k}'"));
        }
        Self::Config {
            code: ErrorCodeSource(ErrorCode::E1101),
            message: message.into(),
            key,
            suggestions,
        }
    }

    /// Format the error with suggestions for display.
    #[must_use]
    pub fn display_with_suggestions(&self) -> String {
        let mut output = format!("{self}");
        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\n\nSuggestions:");
            for suggestion in suggestions {
                output.push_str("\n  - ");
                output.push_str(suggestion);
            }
        }
        output
    }
}

impl From<crate::PackageIdError> for Error {
    fn from(err: crate::PackageIdError) -> Self {
        let message = err.to_string();
        Self::invalid_input(ErrorCode::E0401, err.0, message)
    }
}

impl From<crate::VersionRangeError> for Error {
    fn from(err: crate::VersionRangeError) -> Self {
        match &err {
            crate::VersionRangeError::InvalidVersion { input, .. } => {
                Self::invalid_input(ErrorCode::E0402, input.clone(), err.to_string())
            }
            crate::VersionRangeError::Malformed { input, .. }
            | crate::VersionRangeError::Empty { input } => {
                Self::invalid_input(ErrorCode::E0403, input.clone(), err.to_string())
            }
        }
    }
}

/// Result type for depot operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ErrorCode::E0202.as_str(), "E0202");
        assert_eq!(ErrorCode::E0202.title(), "Circular dependency");
        assert_eq!(ErrorCode::E0204.to_string(), "E0204");
    }

    #[test]
    fn test_resolution_error_keeps_code() {
        let err = Error::resolution(
            ErrorCode::E0201,
            "unable to resolve dependency 'Acme.Logging [2.0,)' of App 1.0.0",
            vec!["App 1.0.0".to_string()],
            vec!["Check that a repository provides 'Acme.Logging'".to_string()],
        );
        assert_eq!(err.code(), ErrorCode::E0201);
        assert!(err.to_string().starts_with("[E0201] resolution failed"));
        assert_eq!(err.suggestions().len(), 1);
    }

    #[test]
    fn test_circular_dependency_joins_chain() {
        let err = Error::circular_dependency(vec!["A 1.0.0".into(), "B 1.0.0".into(), "A 1.0.0".into()]);
        assert_eq!(err.code(), ErrorCode::E0202);
        assert!(err.to_string().contains("A 1.0.0 => B 1.0.0 => A 1.0.0"));
    }

    #[test]
    fn test_range_error_conversion() {
        let err: Error = crate::VersionRange::parse("[1.0").unwrap_err().into();
        assert_eq!(err.code(), ErrorCode::E0403);

        let err: Error = crate::parse_version("x.y").unwrap_err().into();
        assert_eq!(err.code(), ErrorCode::E0402);
    }

    #[test]
    fn test_display_with_suggestions() {
        let err = Error::config("bad value", Some("dependency-version".to_string()));
        let display = err.display_with_suggestions();
        assert!(display.starts_with("[E1101]"));
        assert!(display.contains("Suggestions:"));
        assert!(display.contains("dependency-version"));
    }
}
