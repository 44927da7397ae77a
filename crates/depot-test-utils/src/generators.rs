//! Seeded random graph generators for benchmarks and stress tests.

use crate::fixtures::pkg;
use depot_core::Package;
use rand::prelude::*;
use rand::rngs::StdRng;
use std::sync::Arc;

/// Shape of a generated graph.
#[derive(Debug, Clone, Copy)]
pub struct GraphShape {
    /// Number of distinct package ids.
    pub packages: usize,
    /// Releases generated per id.
    pub versions_per_package: usize,
    /// Upper bound on dependencies per release.
    pub max_dependencies: usize,
}

impl Default for GraphShape {
    fn default() -> Self {
        Self {
            packages: 50,
            versions_per_package: 3,
            max_dependencies: 4,
        }
    }
}

/// Name of the `index`th generated package.
#[must_use]
pub fn package_name(index: usize) -> String {
    format!("Pkg{index:04}")
}

/// Generate an acyclic graph: package `i` only depends on packages `j > i`.
///
/// The same seed always yields the same graph. Ranges are open-ended
/// minimums on an existing release, so every dependency resolves.
#[must_use]
pub fn random_acyclic_graph(seed: u64, shape: GraphShape) -> Vec<Arc<Package>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let versions = shape.versions_per_package.max(1);
    let mut packages = Vec::with_capacity(shape.packages * versions);

    for i in 0..shape.packages {
        let name = package_name(i);
        for v in 1..=versions {
            let mut builder = pkg(&name, &format!("{v}.0"));
            let remaining = shape.packages - i - 1;
            let count = rng.gen_range(0..=shape.max_dependencies.min(remaining));
            let mut targets: Vec<usize> = (i + 1..shape.packages).collect();
            targets.shuffle(&mut rng);
            for target in targets.into_iter().take(count) {
                let min = rng.gen_range(1..=versions);
                builder = builder.depends(&package_name(target), &format!("{min}.0"));
            }
            packages.push(builder.build());
        }
    }

    packages
}

/// Generate the root of a graph: the highest release of package 0.
#[must_use]
pub fn graph_root(packages: &[Arc<Package>]) -> Option<Arc<Package>> {
    let name = package_name(0);
    packages
        .iter()
        .filter(|p| p.id().as_str() == name)
        .max_by(|a, b| a.version().cmp(b.version()))
        .cloned()
}
