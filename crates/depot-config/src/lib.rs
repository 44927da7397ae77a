//! Resolver configuration for depot.
//!
//! Settings are merged from several layers, later layers winning:
//! 1. Built-in defaults
//! 2. Project file (`depot.json`)
//! 3. Environment variables (`DEPOT_*`)
//! 4. Explicit overrides (for example from a command line)
//!
//! The merged [`ResolverSettings`] are validated before being handed out.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod env;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validate;

pub use env::{DepotEnvVar, EnvConfig};
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, ConfigSource, SETTINGS_FILE_NAME};
pub use settings::{ResolverSettings, SettingsLayer};
pub use validate::{Severity, ValidationIssue, ValidationResult, Validator};
