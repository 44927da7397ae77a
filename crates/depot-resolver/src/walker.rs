//! Depth-first dependency walk with overridable hooks.
//!
//! Every concrete walker implements [`PackageWalker`] and is driven by the
//! single [`walk`] function. Hooks default to pass-through behavior, so a
//! walker only overrides the points where it differs.

use crate::marker::VisitationMarker;
use crate::types::ResolveError;
use depot_core::{Dependency, IdentityPolicy, Package};
use std::sync::Arc;
use tracing::{debug, trace};

/// What to do when a dependency closes a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclePolicy {
    /// Abort with [`ResolveError::CircularDependency`].
    #[default]
    Raise,
    /// Skip the dependency and keep walking.
    Ignore,
}

/// Walk configuration, fixed when the walker is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WalkPolicy {
    /// Visit only the root package.
    pub ignore_dependencies: bool,
    /// Cycle handling.
    pub cycle_policy: CyclePolicy,
    /// Identity comparison used by the marker.
    pub identity: IdentityPolicy,
}

impl WalkPolicy {
    /// Set `ignore_dependencies`.
    #[must_use]
    pub const fn ignore_dependencies(mut self, ignore: bool) -> Self {
        self.ignore_dependencies = ignore;
        self
    }

    /// Set the cycle policy.
    #[must_use]
    pub const fn cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.cycle_policy = policy;
        self
    }

    /// Set the identity policy.
    #[must_use]
    pub const fn identity(mut self, identity: IdentityPolicy) -> Self {
        self.identity = identity;
        self
    }
}

/// Outcome of a dependency hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyAction {
    /// Carry on with the dependency.
    Continue,
    /// Move to the next dependency.
    Skip,
}

/// Policy and marker shared by every walker.
#[derive(Debug)]
pub struct WalkState {
    policy: WalkPolicy,
    marker: VisitationMarker,
}

impl WalkState {
    /// Create state with a fresh marker.
    #[must_use]
    pub fn new(policy: WalkPolicy) -> Self {
        Self {
            policy,
            marker: VisitationMarker::new(policy.identity),
        }
    }

    /// The walk policy.
    #[must_use]
    #[inline]
    pub const fn policy(&self) -> &WalkPolicy {
        &self.policy
    }

    /// The visitation marker.
    #[must_use]
    #[inline]
    pub const fn marker(&self) -> &VisitationMarker {
        &self.marker
    }

    /// Mutable access to the marker.
    #[inline]
    pub const fn marker_mut(&mut self) -> &mut VisitationMarker {
        &mut self.marker
    }
}

/// A dependency walker.
///
/// Implementors provide state and dependency resolution; every hook has a
/// default that leaves the walk unchanged.
pub trait PackageWalker {
    /// Walk state.
    fn state(&self) -> &WalkState;

    /// Mutable walk state.
    fn state_mut(&mut self) -> &mut WalkState;

    /// Find the package satisfying a dependency.
    fn resolve_dependency(&self, dependency: &Dependency) -> Option<Arc<Package>>;

    /// Called before a package is marked as processing.
    fn on_before_walk(&mut self, _package: &Arc<Package>) -> Result<(), ResolveError> {
        Ok(())
    }

    /// Called before a dependency is resolved.
    fn on_before_resolve_dependency(
        &mut self,
        _package: &Arc<Package>,
        _dependency: &Dependency,
    ) -> DependencyAction {
        DependencyAction::Continue
    }

    /// Called when [`resolve_dependency`](Self::resolve_dependency) finds
    /// nothing. `Ok(Some)` substitutes a package, `Ok(None)` skips the
    /// dependency.
    fn on_dependency_resolve_error(
        &mut self,
        package: &Arc<Package>,
        dependency: &Dependency,
    ) -> Result<Option<Arc<Package>>, ResolveError> {
        Err(ResolveError::UnresolvedDependency {
            package: package.identity().clone(),
            dependency: dependency.clone(),
        })
    }

    /// Called once a dependency has been resolved.
    fn on_after_resolve_dependency(
        &mut self,
        _package: &Arc<Package>,
        _resolved: &Arc<Package>,
    ) -> DependencyAction {
        DependencyAction::Continue
    }

    /// Called after a package and its dependencies are completed.
    fn on_after_walk(&mut self, _package: &Arc<Package>) -> Result<(), ResolveError> {
        Ok(())
    }
}

/// Walk `package` and everything it reaches.
///
/// # Errors
///
/// Returns the first error raised by a hook, or
/// [`ResolveError::CircularDependency`] when a cycle is found under
/// [`CyclePolicy::Raise`]. The walk stops at the first error.
pub fn walk<W: PackageWalker + ?Sized>(
    walker: &mut W,
    package: &Arc<Package>,
) -> Result<(), ResolveError> {
    if walker.state().marker().is_completed(package.identity()) {
        return Ok(());
    }

    walker.on_before_walk(package)?;
    walker.state_mut().marker_mut().mark_processing(package);
    trace!(package = %package.identity(), "walking");

    if !walker.state().policy().ignore_dependencies {
        for dependency in package.dependencies() {
            if walker.on_before_resolve_dependency(package, dependency) == DependencyAction::Skip {
                trace!(package = %package.identity(), dependency = %dependency, "dependency skipped");
                continue;
            }

            let resolved = match walker.resolve_dependency(dependency) {
                Some(resolved) => resolved,
                None => match walker.on_dependency_resolve_error(package, dependency)? {
                    Some(substitute) => substitute,
                    None => {
                        debug!(package = %package.identity(), dependency = %dependency, "unresolved dependency skipped");
                        continue;
                    }
                },
            };

            if walker.on_after_resolve_dependency(package, &resolved) == DependencyAction::Skip {
                trace!(package = %package.identity(), resolved = %resolved.identity(), "resolved dependency skipped");
                continue;
            }

            if walker.state().marker().is_cycle(resolved.identity()) {
                match walker.state().policy().cycle_policy {
                    CyclePolicy::Raise => {
                        let mut chain = walker.state().marker().processing_chain();
                        chain.push(resolved.identity().clone());
                        debug!(package = %resolved.identity(), "circular dependency");
                        return Err(ResolveError::CircularDependency { chain });
                    }
                    CyclePolicy::Ignore => {
                        trace!(package = %resolved.identity(), "cycle ignored");
                        continue;
                    }
                }
            }

            walk(walker, &resolved)?;
        }
    }

    walker.state_mut().marker_mut().mark_completed(package);
    walker.on_after_walk(package)
}
