//! Uninstall-side walker.
//!
//! Produces a safe removal order (dependents before their dependencies).
//! A package that other installed packages still need blocks the uninstall
//! unless forced; dependencies still needed outside the removal set are
//! left in place and reported.

use crate::dependents::ReverseDependencyIndex;
use crate::repository::PackageRepository;
use crate::types::{ResolveError, ResolveWarning, UninstallScope};
use crate::walker::{CyclePolicy, DependencyAction, PackageWalker, WalkPolicy, WalkState};
use ahash::AHashSet;
use depot_core::{Dependency, IdentityPolicy, Package, PackageIdentity, SelectionOptions};
use std::sync::Arc;
use tracing::{debug, trace};

/// Walker computing the packages an uninstall removes.
pub struct UninstallWalker<'a> {
    state: WalkState,
    local: &'a dyn PackageRepository,
    dependents: &'a ReverseDependencyIndex<'a>,
    selection: SelectionOptions,
    scope: UninstallScope,
    force: bool,
    enforce_dependents: bool,
    /// Dependencies left installed, with the packages that still need them.
    skipped: Vec<(PackageIdentity, Vec<PackageIdentity>)>,
    output: Vec<Arc<Package>>,
    warnings: Vec<ResolveWarning>,
}

impl<'a> UninstallWalker<'a> {
    /// Create a walker removing from `local`, whose dependents are `dependents`.
    ///
    /// With `remove_dependencies` the walk cascades into dependencies that
    /// nothing outside the removal set needs.
    #[must_use]
    pub fn new(
        local: &'a dyn PackageRepository,
        dependents: &'a ReverseDependencyIndex<'a>,
        remove_dependencies: bool,
    ) -> Self {
        let policy = WalkPolicy::default()
            .ignore_dependencies(!remove_dependencies)
            .cycle_policy(CyclePolicy::Ignore)
            .identity(IdentityPolicy::ByIdAndVersion);
        Self {
            state: WalkState::new(policy),
            local,
            dependents,
            selection: SelectionOptions::default(),
            scope: UninstallScope::Repository,
            force: false,
            enforce_dependents: true,
            skipped: Vec::new(),
            output: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Set the uninstall scope.
    #[must_use]
    pub fn scope(mut self, scope: UninstallScope) -> Self {
        self.scope = scope;
        self
    }

    /// Remove packages even when installed packages depend on them.
    #[must_use]
    pub const fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Whether dependents outside the removal set block removal. Updates
    /// turn this off because the package is replaced, not removed.
    #[must_use]
    pub const fn enforce_dependents(mut self, enforce: bool) -> Self {
        self.enforce_dependents = enforce;
        self
    }

    /// Set version selection options used to resolve installed dependencies.
    #[must_use]
    pub const fn with_selection(mut self, selection: SelectionOptions) -> Self {
        self.selection = selection;
        self
    }

    /// Consume the walker, returning the removal order and warnings.
    ///
    /// Skipped dependencies are reported only if they were not removed
    /// through another path.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Arc<Package>>, Vec<ResolveWarning>) {
        let output = self.removal_order();
        let Self {
            mut warnings,
            skipped,
            ..
        } = self;

        warnings.extend(
            skipped
                .into_iter()
                .filter(|(package, _)| !output.iter().any(|p| p.identity() == package))
                .map(|(package, dependents)| ResolveWarning::SkippedDependency {
                    package,
                    dependents,
                }),
        );
        (output, warnings)
    }

    /// Walked packages ordered so that each comes after its dependents in
    /// the removal set.
    ///
    /// Reverse post-order alone is not enough: a dependency skipped on its
    /// first visit and removed later through another path finishes after
    /// some of its dependents.
    fn removal_order(&self) -> Vec<Arc<Package>> {
        let members: AHashSet<&PackageIdentity> =
            self.output.iter().map(|p| p.identity()).collect();
        let mut placed = AHashSet::with_capacity(members.len());
        let mut order = Vec::with_capacity(self.output.len());
        for package in self.output.iter().rev() {
            self.place(package, &members, &mut placed, &mut order);
        }
        order
    }

    fn place(
        &self,
        package: &Arc<Package>,
        members: &AHashSet<&PackageIdentity>,
        placed: &mut AHashSet<PackageIdentity>,
        order: &mut Vec<Arc<Package>>,
    ) {
        if !placed.insert(package.identity().clone()) {
            return;
        }
        for dependent in self.dependents.dependents(package.identity()) {
            if members.contains(dependent.identity()) {
                self.place(dependent, members, placed, order);
            }
        }
        order.push(Arc::clone(package));
    }

    /// Dependents of `identity` that are not part of this removal.
    fn outside_dependents(&self, identity: &PackageIdentity) -> Vec<PackageIdentity> {
        self.dependents
            .dependents(identity)
            .iter()
            .filter(|p| !self.state.marker().is_visited(p.identity()))
            .map(|p| p.identity().clone())
            .collect()
    }

    fn record_skipped(&mut self, package: PackageIdentity, dependents: Vec<PackageIdentity>) {
        match self.skipped.iter_mut().find(|(p, _)| *p == package) {
            Some((_, existing)) => {
                for dependent in dependents {
                    if !existing.contains(&dependent) {
                        existing.push(dependent);
                    }
                }
            }
            None => self.skipped.push((package, dependents)),
        }
    }
}

impl PackageWalker for UninstallWalker<'_> {
    fn state(&self) -> &WalkState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut WalkState {
        &mut self.state
    }

    fn resolve_dependency(&self, dependency: &Dependency) -> Option<Arc<Package>> {
        self.local
            .find_package_with(&dependency.id, &dependency.range, &self.selection)
    }

    fn on_before_walk(&mut self, package: &Arc<Package>) -> Result<(), ResolveError> {
        if !self.enforce_dependents {
            return Ok(());
        }

        let dependents = self.outside_dependents(package.identity());
        if dependents.is_empty() {
            return Ok(());
        }

        if self.force {
            debug!(package = %package.identity(), scope = %self.scope, "dependents ignored");
            self.warnings.push(ResolveWarning::DependentsIgnored {
                package: package.identity().clone(),
                scope: self.scope.clone(),
                dependents,
            });
            Ok(())
        } else {
            Err(ResolveError::DependentsExist {
                package: package.identity().clone(),
                scope: self.scope.clone(),
                dependents,
            })
        }
    }

    fn on_dependency_resolve_error(
        &mut self,
        package: &Arc<Package>,
        dependency: &Dependency,
    ) -> Result<Option<Arc<Package>>, ResolveError> {
        trace!(package = %package.identity(), dependency = %dependency, "dependency not installed");
        Ok(None)
    }

    fn on_after_resolve_dependency(
        &mut self,
        package: &Arc<Package>,
        resolved: &Arc<Package>,
    ) -> DependencyAction {
        let dependents = self.outside_dependents(resolved.identity());
        if dependents.is_empty() {
            return DependencyAction::Continue;
        }

        debug!(
            package = %package.identity(),
            dependency = %resolved.identity(),
            "dependency still required, keeping it"
        );
        self.record_skipped(resolved.identity().clone(), dependents);
        DependencyAction::Skip
    }

    fn on_after_walk(&mut self, package: &Arc<Package>) -> Result<(), ResolveError> {
        debug!(package = %package.identity(), scope = %self.scope, "scheduled for removal");
        self.output.push(Arc::clone(package));
        Ok(())
    }
}

impl std::fmt::Debug for UninstallWalker<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UninstallWalker")
            .field("scope", &self.scope)
            .field("force", &self.force)
            .field("enforce_dependents", &self.enforce_dependents)
            .field("output", &self.output.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;
    use crate::walker::walk;
    use assert_matches::assert_matches;
    use depot_test_utils::fixtures::{Fixtures, find, identities, pkg};
    use depot_test_utils::packages;

    fn run(
        graph: &[Arc<Package>],
        root: &Arc<Package>,
        configure: impl FnOnce(UninstallWalker<'_>) -> UninstallWalker<'_>,
        remove_dependencies: bool,
    ) -> Result<(Vec<String>, Vec<ResolveWarning>), ResolveError> {
        let local: InMemoryRepository = graph.iter().cloned().collect();
        let index = ReverseDependencyIndex::new(&local);
        let mut walker = configure(UninstallWalker::new(&local, &index, remove_dependencies));
        walk(&mut walker, root)?;
        let (output, warnings) = walker.into_parts();
        Ok((identities(&output), warnings))
    }

    #[test]
    fn removes_root_only_by_default() {
        let graph = Fixtures::installed_pair();
        let (order, warnings) = run(&graph, &graph[0], |w| w, false).unwrap();
        assert_eq!(order, ["A 1.0.0"]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn cascade_removes_dependents_first() {
        let graph = Fixtures::chain();
        let (order, _) = run(&graph, &graph[0], |w| w, true).unwrap();
        assert_eq!(order, ["A 1.0.0", "B 1.0.0", "C 1.0.0"]);
    }

    #[test]
    fn late_removed_dependency_follows_all_dependents() {
        // D is skipped under B (C still needs it) and removed later via C.
        let graph = Fixtures::diamond();
        let (order, warnings) = run(&graph, &graph[0], |w| w, true).unwrap();
        assert_eq!(order, ["A 1.0.0", "C 1.0.0", "B 1.0.0", "D 1.0.0"]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn blocked_by_dependents() {
        let graph = Fixtures::installed_pair();
        let b = find(&graph, "B", "1.0");
        let err = run(&graph, &b, |w| w, false).unwrap_err();
        assert_matches!(err, ResolveError::DependentsExist { ref dependents, ref scope, .. } => {
            assert_eq!(dependents[0].to_string(), "A 1.0.0");
            assert_eq!(*scope, UninstallScope::Repository);
        });
    }

    #[test]
    fn forced_removal_warns() {
        let graph = Fixtures::installed_pair();
        let b = find(&graph, "B", "1.0");
        let (order, warnings) = run(&graph, &b, |w| w.force(true), false).unwrap();
        assert_eq!(order, ["B 1.0.0"]);
        assert_matches!(&warnings[..], [ResolveWarning::DependentsIgnored { .. }]);
    }

    #[test]
    fn project_scope_in_error() {
        let graph = Fixtures::installed_pair();
        let b = find(&graph, "B", "1.0");
        let err = run(&graph, &b, |w| w.scope(UninstallScope::Project("web".into())), false)
            .unwrap_err();
        assert!(err.to_string().contains("from project 'web'"));
    }

    #[test]
    fn shared_dependency_is_kept() {
        let graph = Fixtures::shared_dependency();
        let (order, warnings) = run(&graph, &graph[0], |w| w, true).unwrap();
        assert_eq!(order, ["A 1.0.0"]);
        assert_matches!(&warnings[..], [ResolveWarning::SkippedDependency { package, dependents }] => {
            assert_eq!(package.to_string(), "C 1.0.0");
            assert_eq!(dependents[0].to_string(), "B 1.0.0");
        });
    }

    #[test]
    fn skipped_then_removed_is_not_reported() {
        // A -> {B, C}, C -> B: B is first skipped (C still needs it) and
        // then removed through C.
        let graph = packages![
            pkg("A", "1.0").depends("B", "1.0").depends("C", "1.0"),
            pkg("C", "1.0").depends("B", "1.0"),
            pkg("B", "1.0"),
        ];
        let (order, warnings) = run(&graph, &graph[0], |w| w, true).unwrap();
        assert_eq!(order, ["A 1.0.0", "C 1.0.0", "B 1.0.0"]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn update_variant_ignores_dependents() {
        let graph = Fixtures::installed_pair();
        let b = find(&graph, "B", "1.0");
        let (order, warnings) = run(&graph, &b, |w| w.enforce_dependents(false), false).unwrap();
        assert_eq!(order, ["B 1.0.0"]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn missing_dependencies_are_skipped() {
        let graph = packages![pkg("A", "1.0").depends("Gone", "1.0")];
        let (order, _) = run(&graph, &graph[0], |w| w, true).unwrap();
        assert_eq!(order, ["A 1.0.0"]);
    }
}
