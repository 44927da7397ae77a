//! Dependency-walk resolution for depot.
//!
//! Computes the ordered, conflict-checked set of packages to install,
//! uninstall or update for a package, against a local package set and a
//! source of packages.
//!
//! # Architecture
//!
//! - [`walker`]: depth-first walk with cycle detection and overridable hooks
//! - [`marker`]: per-walk visitation state
//! - [`dependents`]: lazily built reverse dependency index
//! - [`install`] / [`uninstall`]: operation-specific walkers
//! - [`resolver`]: entry points composing walkers into results and plans
//!
//! # Example
//!
//! ```rust,ignore
//! use depot_resolver::{InMemoryRepository, PackageResolver};
//!
//! let local = InMemoryRepository::new();
//! let source: InMemoryRepository = packages.into_iter().collect();
//! let order = PackageResolver::default().resolve_for_install(&app, &local, &source)?;
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod dependents;
pub mod install;
pub mod marker;
pub mod plan;
pub mod repository;
pub mod resolver;
pub mod types;
pub mod uninstall;
pub mod walker;

pub use dependents::ReverseDependencyIndex;
pub use install::{InstallWalker, ProjectInstallWalker};
pub use marker::{VisitationMarker, VisitationState};
pub use plan::{PackageOperation, PackagePlan};
pub use repository::{InMemoryRepository, PackageRepository};
pub use resolver::{PackageResolver, ResolverConfig, ResolverStats};
pub use types::{ResolveError, ResolveWarning, Resolved, TracingWarningSink, UninstallScope, WarningSink};
pub use uninstall::UninstallWalker;
pub use walker::{CyclePolicy, DependencyAction, PackageWalker, WalkPolicy, WalkState, walk};

// Re-export commonly used core types
pub use depot_core::{Dependency, IdentityPolicy, Package, PackageId, PackageIdentity, VersionRange};
