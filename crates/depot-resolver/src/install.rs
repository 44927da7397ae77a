//! Install-side walkers.
//!
//! [`InstallWalker`] produces the packages to install, leaves first.
//! [`ProjectInstallWalker`] adds a version conflict check against the
//! dependents of packages already installed in the project.

use crate::dependents::ReverseDependencyIndex;
use crate::repository::PackageRepository;
use crate::types::{ResolveError, ResolveWarning};
use crate::walker::{DependencyAction, PackageWalker, WalkPolicy, WalkState};
use ahash::AHashSet;
use depot_core::{Dependency, Package, PackageIdentity, SelectionOptions};
use std::sync::Arc;
use tracing::{debug, trace};

/// Walker computing the packages an install adds.
///
/// Dependencies resolve against the local repository first, then the
/// source. Packages already installed locally are walked but not emitted
/// unless they are excluded.
pub struct InstallWalker<'a> {
    state: WalkState,
    local: &'a dyn PackageRepository,
    source: &'a dyn PackageRepository,
    selection: SelectionOptions,
    verify_shared_dependencies: bool,
    excluded: AHashSet<PackageIdentity>,
    output: Vec<Arc<Package>>,
}

impl<'a> InstallWalker<'a> {
    /// Create a walker over a local and a source repository.
    #[must_use]
    pub fn new(local: &'a dyn PackageRepository, source: &'a dyn PackageRepository) -> Self {
        Self {
            state: WalkState::new(WalkPolicy::default()),
            local,
            source,
            selection: SelectionOptions::default(),
            verify_shared_dependencies: true,
            excluded: AHashSet::new(),
            output: Vec::new(),
        }
    }

    /// Set version selection options.
    #[must_use]
    pub const fn with_selection(mut self, selection: SelectionOptions) -> Self {
        self.selection = selection;
        self
    }

    /// Require a package already scheduled for install to satisfy a later
    /// dependency's range before it is reused for that dependency.
    #[must_use]
    pub const fn verify_shared_dependencies(mut self, verify: bool) -> Self {
        self.verify_shared_dependencies = verify;
        self
    }

    /// Treat these installed packages as gone: they are emitted again when
    /// reached and never count as conflict sources.
    #[must_use]
    pub fn excluding(mut self, packages: impl IntoIterator<Item = PackageIdentity>) -> Self {
        self.excluded.extend(packages);
        self
    }

    /// Check whether an identity is excluded.
    #[must_use]
    pub fn is_excluded(&self, identity: &PackageIdentity) -> bool {
        self.excluded.contains(identity)
    }

    /// The local repository.
    #[must_use]
    pub fn local(&self) -> &'a dyn PackageRepository {
        self.local
    }

    /// Packages emitted so far, leaves first.
    #[must_use]
    pub fn output(&self) -> &[Arc<Package>] {
        &self.output
    }

    /// Consume the walker, returning its output.
    #[must_use]
    pub fn into_output(self) -> Vec<Arc<Package>> {
        self.output
    }

    fn is_installed(&self, identity: &PackageIdentity) -> bool {
        self.local.contains(identity) && !self.excluded.contains(identity)
    }

    /// An already emitted, completed package able to stand in for `dependency`.
    fn scheduled_for(&self, dependency: &Dependency) -> Option<&Arc<Package>> {
        self.output.iter().find(|p| {
            p.id() == &dependency.id
                && self.state.marker().is_completed(p.identity())
                && (!self.verify_shared_dependencies || dependency.range.contains(p.version()))
        })
    }
}

impl PackageWalker for InstallWalker<'_> {
    fn state(&self) -> &WalkState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut WalkState {
        &mut self.state
    }

    fn resolve_dependency(&self, dependency: &Dependency) -> Option<Arc<Package>> {
        self.local
            .find_package_with(&dependency.id, &dependency.range, &self.selection)
            .or_else(|| {
                self.source
                    .find_package_with(&dependency.id, &dependency.range, &self.selection)
            })
    }

    fn on_before_resolve_dependency(
        &mut self,
        package: &Arc<Package>,
        dependency: &Dependency,
    ) -> DependencyAction {
        match self.scheduled_for(dependency) {
            Some(scheduled) => {
                trace!(
                    package = %package.identity(),
                    dependency = %dependency,
                    scheduled = %scheduled.identity(),
                    "dependency already scheduled"
                );
                DependencyAction::Skip
            }
            None => DependencyAction::Continue,
        }
    }

    fn on_after_walk(&mut self, package: &Arc<Package>) -> Result<(), ResolveError> {
        if self.is_installed(package.identity()) {
            trace!(package = %package.identity(), "already installed");
        } else {
            debug!(package = %package.identity(), "scheduled for install");
            self.output.push(Arc::clone(package));
        }
        Ok(())
    }
}

impl std::fmt::Debug for InstallWalker<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallWalker")
            .field("selection", &self.selection)
            .field("verify_shared_dependencies", &self.verify_shared_dependencies)
            .field("excluded", &self.excluded.len())
            .field("output", &self.output.len())
            .finish_non_exhaustive()
    }
}

/// Install walker for a project, refusing to replace installed versions
/// that other installed packages still require.
pub struct ProjectInstallWalker<'a> {
    inner: InstallWalker<'a>,
    dependents: &'a ReverseDependencyIndex<'a>,
    force: bool,
    warnings: Vec<ResolveWarning>,
}

impl<'a> ProjectInstallWalker<'a> {
    /// Wrap an install walker with the project's dependents index.
    #[must_use]
    pub fn new(inner: InstallWalker<'a>, dependents: &'a ReverseDependencyIndex<'a>) -> Self {
        Self {
            inner,
            dependents,
            force: false,
            warnings: Vec::new(),
        }
    }

    /// Downgrade conflicts to warnings.
    #[must_use]
    pub const fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Warnings raised so far.
    #[must_use]
    pub fn warnings(&self) -> &[ResolveWarning] {
        &self.warnings
    }

    /// Consume the walker, returning its output and warnings.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Arc<Package>>, Vec<ResolveWarning>) {
        (self.inner.into_output(), self.warnings)
    }

    /// Fail or warn when `package` would replace an installed version whose
    /// dependents do not accept the new one.
    fn check_conflict(&mut self, package: &Arc<Package>) -> Result<(), ResolveError> {
        let installed = self.inner.local().find_all(package.id());

        for existing in installed
            .iter()
            .filter(|p| p.version() != package.version())
        {
            let dependents: Vec<PackageIdentity> = self
                .dependents
                .dependents(existing.identity())
                .iter()
                .filter(|d| !self.inner.is_excluded(d.identity()))
                .filter(|d| {
                    d.dependency_on(package.id())
                        .is_some_and(|dep| !dep.range.contains(package.version()))
                })
                .map(|d| d.identity().clone())
                .collect();

            if dependents.is_empty() {
                continue;
            }

            let installed = existing.identity().clone();
            let new_version = package.version().clone();
            if self.force {
                debug!(installed = %installed, %new_version, "conflict ignored");
                self.warnings.push(ResolveWarning::ConflictIgnored {
                    installed,
                    new_version,
                    dependents,
                });
            } else {
                return Err(ResolveError::Conflict {
                    installed,
                    new_version,
                    dependents,
                });
            }
        }

        Ok(())
    }
}

impl PackageWalker for ProjectInstallWalker<'_> {
    fn state(&self) -> &WalkState {
        self.inner.state()
    }

    fn state_mut(&mut self) -> &mut WalkState {
        self.inner.state_mut()
    }

    fn resolve_dependency(&self, dependency: &Dependency) -> Option<Arc<Package>> {
        self.inner.resolve_dependency(dependency)
    }

    fn on_before_walk(&mut self, package: &Arc<Package>) -> Result<(), ResolveError> {
        self.check_conflict(package)?;
        self.inner.on_before_walk(package)
    }

    fn on_before_resolve_dependency(
        &mut self,
        package: &Arc<Package>,
        dependency: &Dependency,
    ) -> DependencyAction {
        self.inner.on_before_resolve_dependency(package, dependency)
    }

    fn on_after_walk(&mut self, package: &Arc<Package>) -> Result<(), ResolveError> {
        self.inner.on_after_walk(package)
    }
}

impl std::fmt::Debug for ProjectInstallWalker<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectInstallWalker")
            .field("inner", &self.inner)
            .field("force", &self.force)
            .field("warnings", &self.warnings)
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

    fn repo(packages: &[Arc<Package>]) -> InMemoryRepository {
        packages.iter().cloned().collect()
    }

    #[test]
    fn emits_leaves_first_from_source() {
        let graph = Fixtures::chain();
        let local = InMemoryRepository::new();
        let source = repo(&graph);
        let mut walker = InstallWalker::new(&local, &source);
        walk(&mut walker, &find(&graph, "A", "1.0")).unwrap();
        assert_eq!(identities(walker.output()), ["C 1.0.0", "B 1.0.0", "A 1.0.0"]);
    }

    #[test]
    fn installed_packages_are_not_reemitted() {
        let graph = Fixtures::chain();
        let local = repo(&graph[2..]);
        let source = repo(&graph);
        let mut walker = InstallWalker::new(&local, &source);
        walk(&mut walker, &find(&graph, "A", "1.0")).unwrap();
        assert_eq!(identities(walker.output()), ["B 1.0.0", "A 1.0.0"]);
    }

    #[test]
    fn local_wins_over_source() {
        let local = repo(&packages![pkg("Lib", "1.0")]);
        let source = repo(&packages![pkg("Lib", "1.0"), pkg("Lib", "3.0")]);
        let app = pkg("App", "1.0").depends("Lib", "1.0").build();
        let mut walker = InstallWalker::new(&local, &source);
        walk(&mut walker, &app).unwrap();
        assert_eq!(identities(walker.output()), ["App 1.0.0"]);
    }

    #[test]
    fn excluded_packages_are_emitted() {
        let graph = Fixtures::chain();
        let local = repo(&graph[1..]);
        let source = repo(&graph);
        let mut walker =
            InstallWalker::new(&local, &source).excluding([graph[2].identity().clone()]);
        walk(&mut walker, &find(&graph, "A", "1.0")).unwrap();
        assert_eq!(identities(walker.output()), ["C 1.0.0", "A 1.0.0"]);
    }

    fn shared_graph() -> Vec<Arc<Package>> {
        packages![
            pkg("R", "1.0").depends("X", "[1.0,1.5]").depends("Y", "1.0"),
            pkg("Y", "1.0").depends("X", "[2.0,)"),
            pkg("X", "1.0"),
            pkg("X", "1.5"),
            pkg("X", "2.0"),
        ]
    }

    #[test]
    fn shared_dependency_verified_against_range() {
        let graph = shared_graph();
        let local = InMemoryRepository::new();
        let source = repo(&graph);
        let mut walker = InstallWalker::new(&local, &source);
        walk(&mut walker, &graph[0]).unwrap();
        assert_eq!(
            identities(walker.output()),
            ["X 1.5.0", "X 2.0.0", "Y 1.0.0", "R 1.0.0"]
        );
    }

    #[test]
    fn shared_dependency_reused_when_unverified() {
        let graph = shared_graph();
        let local = InMemoryRepository::new();
        let source = repo(&graph);
        let mut walker = InstallWalker::new(&local, &source).verify_shared_dependencies(false);
        walk(&mut walker, &graph[0]).unwrap();
        assert_eq!(identities(walker.output()), ["X 1.5.0", "Y 1.0.0", "R 1.0.0"]);
    }

    #[test]
    fn cycle_is_fatal() {
        let graph = Fixtures::cycle();
        let local = InMemoryRepository::new();
        let source = repo(&graph);
        let mut walker = InstallWalker::new(&local, &source);
        let err = walk(&mut walker, &graph[0]).unwrap_err();
        assert_matches!(err, ResolveError::CircularDependency { ref chain } if chain.len() == 3);
    }

    fn pinned_project() -> (InMemoryRepository, InMemoryRepository, Arc<Package>) {
        let installed = packages![pkg("A", "1.0").depends("C", "[1.0]"), pkg("C", "1.0")];
        let c2 = pkg("C", "2.0").build();
        (repo(&installed), repo(&[Arc::clone(&c2)]), c2)
    }

    #[test]
    fn project_install_detects_conflict() {
        let (local, source, c2) = pinned_project();
        let index = ReverseDependencyIndex::new(&local);
        let mut walker = ProjectInstallWalker::new(InstallWalker::new(&local, &source), &index);

        let err = walk(&mut walker, &c2).unwrap_err();
        assert_matches!(err, ResolveError::Conflict { ref installed, ref dependents, .. } => {
            assert_eq!(installed.to_string(), "C 1.0.0");
            assert_eq!(dependents[0].to_string(), "A 1.0.0");
        });
    }

    #[test]
    fn forced_project_install_warns() {
        let (local, source, c2) = pinned_project();
        let index = ReverseDependencyIndex::new(&local);
        let mut walker =
            ProjectInstallWalker::new(InstallWalker::new(&local, &source), &index).force(true);

        walk(&mut walker, &c2).unwrap();
        let (output, warnings) = walker.into_parts();
        assert_eq!(identities(&output), ["C 2.0.0"]);
        assert_matches!(&warnings[..], [ResolveWarning::ConflictIgnored { .. }]);
    }

    #[test]
    fn compatible_range_is_not_a_conflict() {
        let local = repo(&packages![pkg("A", "1.0").depends("C", "1.0"), pkg("C", "1.0")]);
        let c2 = pkg("C", "2.0").build();
        let source = repo(&[Arc::clone(&c2)]);
        let index = ReverseDependencyIndex::new(&local);
        let mut walker = ProjectInstallWalker::new(InstallWalker::new(&local, &source), &index);

        walk(&mut walker, &c2).unwrap();
        assert!(walker.warnings().is_empty());
    }

    #[test]
    fn excluded_dependents_do_not_conflict() {
        let (local, source, c2) = pinned_project();
        let index = ReverseDependencyIndex::new(&local);
        let a = local.iter().next().unwrap().identity().clone();
        let inner = InstallWalker::new(&local, &source).excluding([a]);
        let mut walker = ProjectInstallWalker::new(inner, &index);

        walk(&mut walker, &c2).unwrap();
        assert_eq!(identities(&walker.into_parts().0), ["C 2.0.0"]);
    }
    #[test]
    fn excluded_installed_version_still_checked() {
        let (local, source, c2) = pinned_project();
        let index = ReverseDependencyIndex::new(&local);
        let c1 = pkg("C", "1.0").build().identity().clone();
        let inner = InstallWalker::new(&local, &source).excluding([c1]);
        let mut walker = ProjectInstallWalker::new(inner, &index);

        let err = walk(&mut walker, &c2).unwrap_err();
        assert_matches!(err, ResolveError::Conflict { ref installed, .. } => {
            assert_eq!(installed.to_string(), "C 1.0.0");
        });
    }
}
