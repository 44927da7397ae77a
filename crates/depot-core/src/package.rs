//! Package ids, identities and dependencies.
//!
//! This module defines the package types shared by the resolver:
//! - `PackageId`: a case-insensitive package id
//! - `PackageIdentity`: an id paired with a concrete version
//! - `IdentityPolicy`: how two identities are considered equivalent
//! - `Dependency`: a reference to another package with a version range
//! - `Package`: an identity plus its ordered dependency list

use crate::version::VersionRange;
use semver::Version;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

/// A case-insensitive package id.
///
/// The original spelling is kept for display. Equality, hashing and ordering
/// use the ASCII-lowercased form, so `Newtonsoft.Json` and `newtonsoft.json`
/// are the same id.
#[derive(Clone)]
pub struct PackageId {
    /// Id as it was written.
    original: Arc<str>,
    /// Lowercased id used for comparisons.
    normalized: Arc<str>,
}

impl PackageId {
    /// Create a package id without validating it.
    ///
    /// Use [`PackageId::parse`] for ids from untrusted input.
    #[must_use]
    pub fn new(id: &str) -> Self {
        let id = id.trim();
        Self {
            normalized: Arc::from(id.to_ascii_lowercase()),
            original: Arc::from(id),
        }
    }

    /// Parse a package id.
    ///
    /// Returns `None` if the id is empty or contains whitespace.
    #[must_use]
    pub fn parse(id: &str) -> Option<Self> {
        let id = id.trim();
        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return None;
        }

        Some(Self::new(id))
    }

    /// Get the id as originally written.
    #[must_use]
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// Get the lowercased id.
    #[must_use]
    #[inline]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Check whether a raw id refers to this package.
    #[must_use]
    pub fn matches(&self, other: &str) -> bool {
        self.normalized.eq_ignore_ascii_case(other.trim())
    }
}

impl fmt::Debug for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PackageId").field(&self.original).finish()
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl PartialEq for PackageId {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for PackageId {}

impl Hash for PackageId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl PartialOrd for PackageId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.normalized.cmp(&other.normalized)
    }
}

impl FromStr for PackageId {
    type Err = PackageIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| PackageIdError(s.to_string()))
    }
}

impl Serialize for PackageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.original)
    }
}

impl<'de> Deserialize<'de> for PackageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid package id: {s}")))
    }
}

/// Error when parsing an invalid package id.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid package id: '{0}'")]
pub struct PackageIdError(pub String);

/// A package id paired with a concrete version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageIdentity {
    /// Package id.
    pub id: PackageId,
    /// Package version.
    pub version: Version,
}

impl PackageIdentity {
    /// Create a new identity.
    #[must_use]
    pub const fn new(id: PackageId, version: Version) -> Self {
        Self { id, version }
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.version)
    }
}

/// How two package identities are considered equivalent.
///
/// Markers and indexes are built with one of these. `ById` treats every
/// version of a package as the same node, `ByIdAndVersion` distinguishes
/// exact package instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IdentityPolicy {
    /// Compare ids only.
    ById,
    /// Compare ids and versions.
    #[default]
    ByIdAndVersion,
}

impl IdentityPolicy {
    /// Build the map key for an identity under this policy.
    #[must_use]
    pub fn key(self, identity: &PackageIdentity) -> IdentityKey {
        IdentityKey {
            id: identity.id.clone(),
            version: match self {
                Self::ById => None,
                Self::ByIdAndVersion => Some(identity.version.clone()),
            },
        }
    }

    /// Check whether two identities are equivalent under this policy.
    #[must_use]
    pub fn equivalent(self, a: &PackageIdentity, b: &PackageIdentity) -> bool {
        match self {
            Self::ById => a.id == b.id,
            Self::ByIdAndVersion => a == b,
        }
    }
}

/// Hashable key produced by an [`IdentityPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    id: PackageId,
    version: Option<Version>,
}

impl IdentityKey {
    /// The package id part of the key.
    #[must_use]
    pub const fn id(&self) -> &PackageId {
        &self.id
    }

    /// The version part of the key, absent under `ById`.
    #[must_use]
    pub const fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }
}

/// A dependency on another package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    /// Id of the required package.
    pub id: PackageId,
    /// Accepted versions.
    pub range: VersionRange,
}

impl Dependency {
    /// Create a new dependency.
    #[must_use]
    pub const fn new(id: PackageId, range: VersionRange) -> Self {
        Self { id, range }
    }

    /// Create a dependency accepting any version.
    #[must_use]
    pub fn any(id: PackageId) -> Self {
        Self::new(id, VersionRange::any())
    }

    /// Check whether a concrete package identity satisfies this dependency.
    #[must_use]
    pub fn is_satisfied_by(&self, identity: &PackageIdentity) -> bool {
        self.id == identity.id && self.range.contains(&identity.version)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.range.is_any() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{} {}", self.id, self.range)
        }
    }
}

/// A package: an identity and its declared dependencies.
///
/// Packages are supplied by repositories and shared as `Arc<Package>`; the
/// resolver never mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    identity: PackageIdentity,
    dependencies: SmallVec<[Dependency; 8]>,
}

impl Package {
    /// Create a package without dependencies.
    #[must_use]
    pub fn new(id: PackageId, version: Version) -> Self {
        Self {
            identity: PackageIdentity::new(id, version),
            dependencies: SmallVec::new(),
        }
    }

    /// Add a dependency, keeping declaration order.
    #[must_use]
    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Replace the dependency list.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: impl IntoIterator<Item = Dependency>) -> Self {
        self.dependencies = dependencies.into_iter().collect();
        self
    }

    /// Package identity.
    #[must_use]
    #[inline]
    pub const fn identity(&self) -> &PackageIdentity {
        &self.identity
    }

    /// Package id.
    #[must_use]
    #[inline]
    pub const fn id(&self) -> &PackageId {
        &self.identity.id
    }

    /// Package version.
    #[must_use]
    #[inline]
    pub const fn version(&self) -> &Version {
        &self.identity.version
    }

    /// Declared dependencies in order.
    #[must_use]
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Find the declared dependency on a given package id.
    #[must_use]
    pub fn dependency_on(&self, id: &PackageId) -> Option<&Dependency> {
        self.dependencies.iter().find(|d| &d.id == id)
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.identity.fmt(f)
    }
}
