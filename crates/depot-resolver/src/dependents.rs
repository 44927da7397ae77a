//! Reverse dependency index: which packages depend on a given package.
//!
//! The index is built on first query by walking every package of a
//! repository once, recording an edge `resolved -> package` for each
//! resolved dependency. Cycles and unresolvable dependencies are tolerated.

use crate::repository::PackageRepository;
use crate::types::ResolveError;
use crate::walker::{CyclePolicy, DependencyAction, PackageWalker, WalkPolicy, WalkState, walk};
use ahash::AHashMap;
use depot_core::{Dependency, IdentityPolicy, Package, PackageIdentity, SelectionOptions};
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::{debug, warn};

type DependentsMap = AHashMap<PackageIdentity, Vec<Arc<Package>>>;

/// Lazily built map from a package to the packages depending on it.
pub struct ReverseDependencyIndex<'r> {
    repository: &'r dyn PackageRepository,
    selection: SelectionOptions,
    index: OnceLock<DependentsMap>,
}

impl<'r> ReverseDependencyIndex<'r> {
    /// Create an index over `repository` with default selection.
    #[must_use]
    pub fn new(repository: &'r dyn PackageRepository) -> Self {
        Self::with_selection(repository, SelectionOptions::default())
    }

    /// Create an index resolving dependencies with `selection`.
    #[must_use]
    pub fn with_selection(repository: &'r dyn PackageRepository, selection: SelectionOptions) -> Self {
        Self {
            repository,
            selection,
            index: OnceLock::new(),
        }
    }

    /// Packages that depend on `identity`, in discovery order.
    #[must_use]
    pub fn dependents(&self, identity: &PackageIdentity) -> &[Arc<Package>] {
        self.index()
            .get(identity)
            .map_or(&[], Vec::as_slice)
    }

    /// Check whether anything depends on `identity`.
    #[must_use]
    pub fn has_dependents(&self, identity: &PackageIdentity) -> bool {
        !self.dependents(identity).is_empty()
    }

    /// Check whether the index has been built.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.index.get().is_some()
    }

    /// Number of packages with at least one dependent.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index().len()
    }

    /// Check whether no package has dependents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index().is_empty()
    }

    /// The repository this index covers.
    #[must_use]
    pub fn repository(&self) -> &'r dyn PackageRepository {
        self.repository
    }

    fn index(&self) -> &DependentsMap {
        self.index.get_or_init(|| self.build())
    }

    fn build(&self) -> DependentsMap {
        let start = Instant::now();
        let packages = self.repository.packages();
        let mut walker = IndexWalker {
            state: WalkState::new(
                WalkPolicy::default()
                    .cycle_policy(CyclePolicy::Ignore)
                    .identity(IdentityPolicy::ByIdAndVersion),
            ),
            repository: self.repository,
            selection: self.selection,
            dependents: DependentsMap::new(),
        };

        for package in &packages {
            if let Err(err) = walk(&mut walker, package) {
                warn!(package = %package.identity(), error = %err, "failed to index dependents");
            }
        }

        debug!(
            packages = packages.len(),
            indexed = walker.dependents.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "built reverse dependency index"
        );
        walker.dependents
    }
}

impl fmt::Debug for ReverseDependencyIndex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReverseDependencyIndex")
            .field("selection", &self.selection)
            .field("built", &self.is_built())
            .finish_non_exhaustive()
    }
}

struct IndexWalker<'r> {
    state: WalkState,
    repository: &'r dyn PackageRepository,
    selection: SelectionOptions,
    dependents: DependentsMap,
}

impl PackageWalker for IndexWalker<'_> {
    fn state(&self) -> &WalkState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut WalkState {
        &mut self.state
    }

    fn resolve_dependency(&self, dependency: &Dependency) -> Option<Arc<Package>> {
        self.repository
            .find_package_with(&dependency.id, &dependency.range, &self.selection)
    }

    fn on_dependency_resolve_error(
        &mut self,
        package: &Arc<Package>,
        dependency: &Dependency,
    ) -> Result<Option<Arc<Package>>, ResolveError> {
        debug!(package = %package.identity(), dependency = %dependency, "dependency not in repository, not indexed");
        Ok(None)
    }

    fn on_after_resolve_dependency(
        &mut self,
        package: &Arc<Package>,
        resolved: &Arc<Package>,
    ) -> DependencyAction {
        let entry = self
            .dependents
            .entry(resolved.identity().clone())
            .or_default();
        if !entry.iter().any(|p| p.identity() == package.identity()) {
            entry.push(Arc::clone(package));
        }
        DependencyAction::Continue
    }
}
