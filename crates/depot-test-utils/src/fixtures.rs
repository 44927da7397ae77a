//! Package builders and pre-built dependency graphs.
//!
//! Graphs mirror the situations the resolver has to handle: shared
//! dependencies, diamonds, cycles and version bumps.

use depot_core::{Dependency, Package, PackageId, VersionRange, parse_version};
use std::sync::Arc;

/// Start building a package. Panics on an invalid id or version.
#[must_use]
pub fn pkg(id: &str, version: &str) -> PackageBuilder {
    PackageBuilder {
        package: Package::new(
            PackageId::new(id),
            parse_version(version).unwrap_or_else(|e| panic!("bad fixture version: {e}")),
        ),
    }
}

/// Fluent package builder used by fixtures and tests.
#[derive(Debug, Clone)]
pub struct PackageBuilder {
    package: Package,
}

impl PackageBuilder {
    /// Add a dependency with a range in interval notation.
    #[must_use]
    pub fn depends(mut self, id: &str, range: &str) -> Self {
        let range = VersionRange::parse(range).unwrap_or_else(|e| panic!("bad fixture range: {e}"));
        self.package = self
            .package
            .with_dependency(Dependency::new(PackageId::new(id), range));
        self
    }

    /// Add a dependency accepting any version.
    #[must_use]
    pub fn depends_any(mut self, id: &str) -> Self {
        self.package = self.package.with_dependency(Dependency::any(PackageId::new(id)));
        self
    }

    /// Finish the package.
    #[must_use]
    pub fn build(self) -> Arc<Package> {
        Arc::new(self.package)
    }
}

impl From<PackageBuilder> for Arc<Package> {
    fn from(builder: PackageBuilder) -> Self {
        builder.build()
    }
}

/// Build a `Vec<Arc<Package>>` from package builders.
#[macro_export]
macro_rules! packages {
    ($($builder:expr),* $(,)?) => {
        vec![$($crate::fixtures::PackageBuilder::build($builder)),*]
    };
}

/// Find a package by id and version in a list. Panics when absent.
#[must_use]
pub fn find(packages: &[Arc<Package>], id: &str, version: &str) -> Arc<Package> {
    let id = PackageId::new(id);
    let version = parse_version(version).unwrap_or_else(|e| panic!("bad fixture version: {e}"));
    packages
        .iter()
        .find(|p| p.id() == &id && p.version() == &version)
        .cloned()
        .unwrap_or_else(|| panic!("fixture has no package {id} {version}"))
}

/// Render packages as `"id version"` strings, keeping order.
#[must_use]
pub fn identities(packages: &[Arc<Package>]) -> Vec<String> {
    packages.iter().map(|p| p.identity().to_string()).collect()
}

/// Old and new versions of a root package plus the repositories around them.
#[derive(Debug, Clone)]
pub struct UpdateScenario {
    /// Currently installed root.
    pub old: Arc<Package>,
    /// Replacement root.
    pub new: Arc<Package>,
    /// Installed packages.
    pub local: Vec<Arc<Package>>,
    /// Packages available from the remote source.
    pub source: Vec<Arc<Package>>,
}

/// Collection of pre-built graphs.
#[derive(Debug)]
pub struct Fixtures;

impl Fixtures {
    /// `A -> B -> C`.
    #[must_use]
    pub fn chain() -> Vec<Arc<Package>> {
        packages![
            pkg("A", "1.0").depends("B", "1.0"),
            pkg("B", "1.0").depends("C", "1.0"),
            pkg("C", "1.0"),
        ]
    }

    /// `A -> {B, C}`, `B -> D`, `C -> D`.
    #[must_use]
    pub fn diamond() -> Vec<Arc<Package>> {
        packages![
            pkg("A", "1.0").depends("B", "1.0").depends("C", "1.0"),
            pkg("B", "1.0").depends("D", "1.0"),
            pkg("C", "1.0").depends("D", "1.0"),
            pkg("D", "1.0"),
        ]
    }

    /// `A -> B -> A`.
    #[must_use]
    pub fn cycle() -> Vec<Arc<Package>> {
        packages![
            pkg("A", "1.0").depends("B", "1.0"),
            pkg("B", "1.0").depends("A", "1.0"),
        ]
    }

    /// `A -> B -> C -> A` with an acyclic entry point `Root -> A`.
    #[must_use]
    pub fn long_cycle() -> Vec<Arc<Package>> {
        packages![
            pkg("Root", "1.0").depends("A", "1.0"),
            pkg("A", "1.0").depends("B", "1.0"),
            pkg("B", "1.0").depends("C", "1.0"),
            pkg("C", "1.0").depends("A", "1.0"),
        ]
    }

    /// Four releases of one package: 1.0, 1.5, 2.0 and 2.5.
    #[must_use]
    pub fn releases() -> Vec<Arc<Package>> {
        packages![
            pkg("Acme.Json", "1.0"),
            pkg("Acme.Json", "1.5"),
            pkg("Acme.Json", "2.0"),
            pkg("Acme.Json", "2.5"),
        ]
    }

    /// Installed `A -> C >= 1.0`, `B -> C >= 1.0` and `C 1.0`.
    #[must_use]
    pub fn shared_dependency() -> Vec<Arc<Package>> {
        packages![
            pkg("A", "1.0").depends("C", "1.0"),
            pkg("B", "1.0").depends("C", "1.0"),
            pkg("C", "1.0"),
        ]
    }

    /// Installed `A -> B`.
    #[must_use]
    pub fn installed_pair() -> Vec<Arc<Package>> {
        packages![pkg("A", "1.0").depends("B", "1.0"), pkg("B", "1.0")]
    }

    /// Old `A 1.0 -> {B 1.0, C 1.0}`, new `A 2.0 -> {B 1.0, C 2.0, D 1.0}`.
    #[must_use]
    pub fn update() -> UpdateScenario {
        let local = packages![
            pkg("A", "1.0").depends("B", "[1.0]").depends("C", "[1.0]"),
            pkg("B", "1.0"),
            pkg("C", "1.0"),
        ];
        let source = packages![
            pkg("A", "2.0")
                .depends("B", "[1.0]")
                .depends("C", "[2.0]")
                .depends("D", "[1.0]"),
            pkg("B", "1.0"),
            pkg("C", "1.0"),
            pkg("C", "2.0"),
            pkg("D", "1.0"),
        ];
        UpdateScenario {
            old: find(&local, "A", "1.0"),
            new: find(&source, "A", "2.0"),
            local,
            source,
        }
    }
}
