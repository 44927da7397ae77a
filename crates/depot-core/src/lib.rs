//! Core types for the depot dependency resolver.
//!
//! This crate provides the foundational types used by every resolver component:
//! - Case-insensitive package ids and versioned identities
//! - Identity comparison policies (by id, by id and version)
//! - Version ranges in interval notation
//! - Best-candidate version selection
//! - Error codes and suggestions

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
mod matching;
mod package;
mod version;

pub use error::{Error, ErrorCode, Result};
pub use matching::{DependencyVersion, SelectionOptions, select_best};
pub use package::{
    Dependency, IdentityKey, IdentityPolicy, Package, PackageId, PackageIdError, PackageIdentity,
};
pub use version::{Bound, VersionRange, VersionRangeError, parse_version};

// Re-export commonly used types
pub use semver::Version;
