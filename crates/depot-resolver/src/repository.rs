//! Package repositories consulted by the walkers.
//!
//! The resolver never performs I/O: everything it knows about packages comes
//! through [`PackageRepository`]. Implementations must be safe to read from
//! several walks at once.

use ahash::AHashMap;
use depot_core::{
    Package, PackageId, PackageIdentity, SelectionOptions, VersionRange, select_best,
};
use smallvec::SmallVec;
use std::sync::Arc;

/// Read-only source of packages.
pub trait PackageRepository: Send + Sync {
    /// Every package with the given id, in any order.
    fn find_all(&self, id: &PackageId) -> Vec<Arc<Package>>;

    /// Every package in the repository.
    fn packages(&self) -> Vec<Arc<Package>>;

    /// Best package for `id` within `range`, preferring the highest version.
    fn find_package(&self, id: &PackageId, range: &VersionRange) -> Option<Arc<Package>> {
        self.find_package_with(id, range, &SelectionOptions::default())
    }

    /// Best package for `id` within `range` under explicit selection options.
    fn find_package_with(
        &self,
        id: &PackageId,
        range: &VersionRange,
        options: &SelectionOptions,
    ) -> Option<Arc<Package>> {
        select_best(&self.find_all(id), id, range, options)
    }

    /// Check whether this exact identity is present.
    fn contains(&self, identity: &PackageIdentity) -> bool {
        self.find_all(&identity.id)
            .iter()
            .any(|p| p.version() == &identity.version)
    }
}

impl<R: PackageRepository + ?Sized> PackageRepository for Arc<R> {
    fn find_all(&self, id: &PackageId) -> Vec<Arc<Package>> {
        (**self).find_all(id)
    }

    fn packages(&self) -> Vec<Arc<Package>> {
        (**self).packages()
    }

    fn contains(&self, identity: &PackageIdentity) -> bool {
        (**self).contains(identity)
    }
}

/// Insertion-ordered in-memory repository.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRepository {
    packages: Vec<Arc<Package>>,
    by_id: AHashMap<PackageId, SmallVec<[usize; 4]>>,
}

impl InMemoryRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a package. Adding the same identity twice keeps the first copy.
    pub fn add(&mut self, package: Arc<Package>) {
        if self.contains(package.identity()) {
            return;
        }
        self.by_id
            .entry(package.id().clone())
            .or_default()
            .push(self.packages.len());
        self.packages.push(package);
    }

    /// Number of packages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Check if the repository is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Iterate over packages in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Package>> {
        self.packages.iter()
    }
}

impl PackageRepository for InMemoryRepository {
    fn find_all(&self, id: &PackageId) -> Vec<Arc<Package>> {
        self.by_id
            .get(id)
            .map(|indices| indices.iter().map(|&i| Arc::clone(&self.packages[i])).collect())
            .unwrap_or_default()
    }

    fn packages(&self) -> Vec<Arc<Package>> {
        self.packages.clone()
    }

    fn contains(&self, identity: &PackageIdentity) -> bool {
        self.by_id.get(&identity.id).is_some_and(|indices| {
            indices
                .iter()
                .any(|&i| self.packages[i].version() == &identity.version)
        })
    }
}

impl FromIterator<Arc<Package>> for InMemoryRepository {
    fn from_iter<I: IntoIterator<Item = Arc<Package>>>(iter: I) -> Self {
        let mut repository = Self::new();
        for package in iter {
            repository.add(package);
        }
        repository
    }
}

impl Extend<Arc<Package>> for InMemoryRepository {
    fn extend<I: IntoIterator<Item = Arc<Package>>>(&mut self, iter: I) {
        for package in iter {
            self.add(package);
        }
    }
}
