//! Resolution entry points.
//!
//! [`PackageResolver`] builds a fresh walker for every request, drives it and
//! turns the output into a package list or a [`PackagePlan`]. It holds no
//! state between requests beyond configuration and counters.
//!
//! # Example
//!
//! ```rust,ignore
//! use depot_resolver::{InMemoryRepository, PackageResolver};
//!
//! let resolver = PackageResolver::default();
//! let order = resolver.resolve_for_install(&package, &local, &source)?;
//! ```

use crate::dependents::ReverseDependencyIndex;
use crate::install::{InstallWalker, ProjectInstallWalker};
use crate::plan::PackagePlan;
use crate::repository::PackageRepository;
use crate::types::{ResolveError, Resolved, UninstallScope};
use crate::uninstall::UninstallWalker;
use crate::walker::walk;
use depot_config::ResolverSettings;
use depot_core::{Package, SelectionOptions};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Resolver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Version selection applied to every dependency.
    pub selection: SelectionOptions,
    /// Check a scheduled package against a later dependency's range before
    /// reusing it.
    pub verify_shared_dependencies: bool,
    /// Default for `force` in the convenience operations; also downgrades
    /// project install conflicts to warnings.
    pub force: bool,
    /// Default for `remove_dependencies` in [`PackageResolver::uninstall`].
    pub remove_dependencies: bool,
    /// Default for `update_dependencies` in [`PackageResolver::update`].
    pub update_dependencies: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::from(&ResolverSettings::default())
    }
}

impl From<&ResolverSettings> for ResolverConfig {
    fn from(settings: &ResolverSettings) -> Self {
        Self {
            selection: settings.selection(),
            verify_shared_dependencies: settings.verify_shared_dependencies,
            force: settings.force,
            remove_dependencies: settings.remove_dependencies,
            update_dependencies: settings.update_dependencies,
        }
    }
}

/// Diagnostic counters. No resolution result reads them.
#[derive(Debug, Default)]
pub struct ResolverStats {
    /// Completed resolutions.
    pub resolutions: AtomicU64,
    /// Resolutions that failed.
    pub failures: AtomicU64,
    /// Packages emitted across all resolutions.
    pub packages_emitted: AtomicU64,
    /// Warnings raised across all resolutions.
    pub warnings: AtomicU64,
    /// Time spent resolving (ms).
    pub resolve_time_ms: AtomicU64,
}

impl ResolverStats {
    fn record<T>(&self, result: &Result<T, ResolveError>, emitted: usize, warnings: usize, start: Instant) {
        match result {
            Ok(_) => {
                self.resolutions.fetch_add(1, Ordering::Relaxed);
                self.packages_emitted.fetch_add(emitted as u64, Ordering::Relaxed);
                self.warnings.fetch_add(warnings as u64, Ordering::Relaxed);
            }
            Err(_) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.resolve_time_ms
            .fetch_add(start.elapsed().as_millis() as u64, Ordering::Relaxed);
    }
}

/// Drives walkers for install, uninstall and update requests.
///
/// Every request builds fresh walkers; the resolver keeps no state between
/// requests apart from its diagnostic [`ResolverStats`].
#[derive(Debug, Default)]
pub struct PackageResolver {
    config: ResolverConfig,
    stats: ResolverStats,
}

impl PackageResolver {
    /// Create a resolver with the given configuration.
    #[must_use]
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            stats: ResolverStats::default(),
        }
    }

    /// Create a resolver from loaded settings.
    #[must_use]
    pub fn from_settings(settings: &ResolverSettings) -> Self {
        Self::new(ResolverConfig::from(settings))
    }

    /// The resolver configuration.
    #[must_use]
    pub const fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Get resolver statistics.
    #[must_use]
    pub fn stats(&self) -> &ResolverStats {
        &self.stats
    }

    fn install_walker<'a>(
        &self,
        local: &'a dyn PackageRepository,
        source: &'a dyn PackageRepository,
    ) -> InstallWalker<'a> {
        InstallWalker::new(local, source)
            .with_selection(self.config.selection)
            .verify_shared_dependencies(self.config.verify_shared_dependencies)
    }

    /// Packages to install for `package`, dependencies first.
    ///
    /// Packages already in `local` are not listed.
    pub fn resolve_for_install(
        &self,
        package: &Arc<Package>,
        local: &dyn PackageRepository,
        source: &dyn PackageRepository,
    ) -> Result<Vec<Arc<Package>>, ResolveError> {
        let start = Instant::now();
        let mut walker = self.install_walker(local, source);
        let result = walk(&mut walker, package).map(|()| walker.into_output());

        let emitted = result.as_ref().map_or(0, Vec::len);
        self.stats.record(&result, emitted, 0, start);
        if result.is_ok() {
            info!(
                package = %package.identity(),
                installs = emitted,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "install resolved"
            );
        }
        result
    }

    /// Packages to install into a project, refusing to replace installed
    /// versions whose dependents reject the new version.
    ///
    /// `dependents` indexes the project's installed packages.
    pub fn resolve_for_project_install(
        &self,
        package: &Arc<Package>,
        local: &dyn PackageRepository,
        source: &dyn PackageRepository,
        dependents: &ReverseDependencyIndex<'_>,
    ) -> Result<Resolved<Vec<Arc<Package>>>, ResolveError> {
        let start = Instant::now();
        let mut walker =
            ProjectInstallWalker::new(self.install_walker(local, source), dependents)
                .force(self.config.force);
        let result = walk(&mut walker, package).map(|()| {
            let (output, warnings) = walker.into_parts();
            Resolved::new(output, warnings)
        });

        self.finish("project install", package, &result, start, |r| (r.value.len(), 0));
        result
    }

    /// Packages to remove for `package`, dependents first.
    ///
    /// With `remove_dependencies` the removal cascades into dependencies no
    /// other installed package needs; the ones kept are reported as warnings.
    pub fn resolve_for_uninstall(
        &self,
        package: &Arc<Package>,
        local: &dyn PackageRepository,
        force: bool,
        remove_dependencies: bool,
    ) -> Result<Resolved<Vec<Arc<Package>>>, ResolveError> {
        let dependents = ReverseDependencyIndex::with_selection(local, self.config.selection);
        self.uninstall_with(
            package,
            local,
            &dependents,
            UninstallScope::Repository,
            force,
            remove_dependencies,
        )
    }

    /// Packages to remove from a project.
    pub fn resolve_for_project_uninstall(
        &self,
        package: &Arc<Package>,
        project: &str,
        local: &dyn PackageRepository,
        dependents: &ReverseDependencyIndex<'_>,
        force: bool,
        remove_dependencies: bool,
    ) -> Result<Resolved<Vec<Arc<Package>>>, ResolveError> {
        self.uninstall_with(
            package,
            local,
            dependents,
            UninstallScope::Project(project.to_string()),
            force,
            remove_dependencies,
        )
    }

    fn uninstall_with(
        &self,
        package: &Arc<Package>,
        local: &dyn PackageRepository,
        dependents: &ReverseDependencyIndex<'_>,
        scope: UninstallScope,
        force: bool,
        remove_dependencies: bool,
    ) -> Result<Resolved<Vec<Arc<Package>>>, ResolveError> {
        let start = Instant::now();
        let mut walker = UninstallWalker::new(local, dependents, remove_dependencies)
            .with_selection(self.config.selection)
            .scope(scope)
            .force(force);
        let result = walk(&mut walker, package).map(|()| {
            let (output, warnings) = walker.into_parts();
            Resolved::new(output, warnings)
        });

        self.finish("uninstall", package, &result, start, |r| (0, r.value.len()));
        result
    }

    /// Plan replacing `old` with `new`.
    ///
    /// The uninstall pass over `old` cascades into its dependencies when
    /// `update_dependencies` is set. The install pass over `new` treats that
    /// removal set as gone. Packages appearing in both passes are left alone.
    pub fn resolve_for_update(
        &self,
        old: &Arc<Package>,
        new: &Arc<Package>,
        local: &dyn PackageRepository,
        source: &dyn PackageRepository,
        update_dependencies: bool,
    ) -> Result<Resolved<PackagePlan>, ResolveError> {
        let start = Instant::now();
        let result = self.plan_update(old, new, local, source, update_dependencies);
        self.finish("update", new, &result, start, |r| {
            (r.value.to_install().len(), r.value.to_uninstall().len())
        });
        result
    }

    fn plan_update(
        &self,
        old: &Arc<Package>,
        new: &Arc<Package>,
        local: &dyn PackageRepository,
        source: &dyn PackageRepository,
        update_dependencies: bool,
    ) -> Result<Resolved<PackagePlan>, ResolveError> {
        let dependents = ReverseDependencyIndex::with_selection(local, self.config.selection);

        let mut uninstall = UninstallWalker::new(local, &dependents, update_dependencies)
            .with_selection(self.config.selection)
            .enforce_dependents(false);
        walk(&mut uninstall, old)?;
        let (to_uninstall, mut warnings) = uninstall.into_parts();
        debug!(old = %old.identity(), removals = to_uninstall.len(), "update uninstall pass done");

        let inner = self
            .install_walker(local, source)
            .excluding(to_uninstall.iter().map(|p| p.identity().clone()));
        let mut install = ProjectInstallWalker::new(inner, &dependents).force(self.config.force);
        walk(&mut install, new)?;
        let (to_install, install_warnings) = install.into_parts();
        warnings.extend(install_warnings);
        debug!(new = %new.identity(), installs = to_install.len(), "update install pass done");

        let mut plan = PackagePlan::new(to_install, to_uninstall).reduce();
        if old.identity() != new.identity() {
            plan = plan.with_replaced(Arc::clone(old));
        }
        Ok(Resolved::new(plan, warnings))
    }

    /// Uninstall using the configured `force` and `remove_dependencies`.
    pub fn uninstall(
        &self,
        package: &Arc<Package>,
        local: &dyn PackageRepository,
    ) -> Result<Resolved<Vec<Arc<Package>>>, ResolveError> {
        self.resolve_for_uninstall(
            package,
            local,
            self.config.force,
            self.config.remove_dependencies,
        )
    }

    /// Update using the configured `update_dependencies`.
    pub fn update(
        &self,
        old: &Arc<Package>,
        new: &Arc<Package>,
        local: &dyn PackageRepository,
        source: &dyn PackageRepository,
    ) -> Result<Resolved<PackagePlan>, ResolveError> {
        self.resolve_for_update(old, new, local, source, self.config.update_dependencies)
    }

    fn finish<T>(
        &self,
        operation: &'static str,
        package: &Arc<Package>,
        result: &Result<Resolved<T>, ResolveError>,
        start: Instant,
        counts: impl FnOnce(&Resolved<T>) -> (usize, usize),
    ) {
        let (installs, uninstalls, warnings) = match result {
            Ok(resolved) => {
                let (installs, uninstalls) = counts(resolved);
                (installs, uninstalls, resolved.warnings.len())
            }
            Err(_) => (0, 0, 0),
        };
        self.stats
            .record(result, installs + uninstalls, warnings, start);

        if result.is_ok() {
            info!(
                operation,
                package = %package.identity(),
                installs,
                uninstalls,
                warnings,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "resolution complete"
            );
        }
    }
}
