//! Proptest strategies for depot types.

use crate::fixtures::pkg;
use depot_core::Package;
use proptest::collection::vec;
use proptest::prelude::*;
use std::sync::Arc;

/// Strategy for generating package ids.
pub fn package_id_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9.]{1,20}".prop_map(|s| s.trim_end_matches('.').to_string())
}

/// Strategy for generating `major.minor.patch` versions.
pub fn version_strategy() -> impl Strategy<Value = String> {
    (0u32..20, 0u32..20, 0u32..50).prop_map(|(major, minor, patch)| format!("{major}.{minor}.{patch}"))
}

/// Strategy for generating range strings in interval notation.
pub fn version_range_strategy() -> impl Strategy<Value = String> {
    let ordered = (version_strategy(), version_strategy()).prop_map(|(a, b)| {
        let va = depot_core::parse_version(&a).ok();
        let vb = depot_core::parse_version(&b).ok();
        if va <= vb { (a, b) } else { (b, a) }
    });

    prop_oneof![
        Just("*".to_string()),
        version_strategy(),
        version_strategy().prop_map(|v| format!("[{v}]")),
        version_strategy().prop_map(|v| format!("[{v},)")),
        version_strategy().prop_map(|v| format!("(,{v}]")),
        ordered.prop_map(|(a, b)| format!("[{a},{b}]")),
    ]
}

/// Strategy for acyclic dependency graphs of up to `max_packages` packages.
///
/// Package `Nk` may only depend on `Nj` with `j > k`, so no cycle can form.
/// Every dependency has a release that satisfies it.
pub fn acyclic_graph_strategy(max_packages: usize) -> impl Strategy<Value = Vec<Arc<Package>>> {
    (1..=max_packages.max(1)).prop_flat_map(|n| {
        vec(vec(0..n, 0..4), n).prop_map(move |edges| {
            edges
                .into_iter()
                .enumerate()
                .map(|(i, mut targets)| {
                    targets.retain(|&t| t > i);
                    targets.sort_unstable();
                    targets.dedup();
                    targets
                        .into_iter()
                        .fold(pkg(&format!("N{i}"), "1.0"), |builder, t| {
                            builder.depends(&format!("N{t}"), "1.0")
                        })
                        .build()
                })
                .collect()
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_core::VersionRange;

    proptest! {
        #[test]
        fn generated_ranges_parse(range in version_range_strategy()) {
            prop_assert!(VersionRange::parse(&range).is_ok());
        }

        #[test]
        fn generated_graphs_are_forward_only(graph in acyclic_graph_strategy(12)) {
            for (i, package) in graph.iter().enumerate() {
                for dependency in package.dependencies() {
                    let target: usize = dependency.id.as_str()[1..].parse().unwrap();
                    prop_assert!(target > i);
                }
            }
        }
    }
}
