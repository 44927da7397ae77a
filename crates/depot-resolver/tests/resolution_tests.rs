//! Integration tests for resolution workflows.
//!
//! These tests drive `PackageResolver` end to end over in-memory
//! repositories: install, project install, uninstall, project uninstall and
//! update.

use assert_matches::assert_matches;
use depot_resolver::{
    InMemoryRepository, PackageRepository, PackageResolver, ResolveError, ResolveWarning,
    ResolverConfig, ReverseDependencyIndex, UninstallScope, WarningSink,
};
use depot_test_utils::prelude::*;
use depot_test_utils::proptest_strategies::acyclic_graph_strategy;
use depot_core::{PackageId, VersionRange};
use std::sync::Arc;

fn repo(packages: &[Arc<depot_core::Package>]) -> InMemoryRepository {
    packages.iter().cloned().collect()
}

// ========== Install Workflow Tests ==========

mod install_workflow {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_install_chain_leaves_first() {
        init_tracing();
        let graph = Fixtures::chain();
        let order = PackageResolver::default()
            .resolve_for_install(&graph[0], &InMemoryRepository::new(), &repo(&graph))
            .unwrap();

        assert_identities(&order, &["C 1.0.0", "B 1.0.0", "A 1.0.0"]);
        assert_leaves_first(&order);
    }

    #[test]
    fn test_install_diamond_once_each() {
        let graph = Fixtures::diamond();
        let order = PackageResolver::default()
            .resolve_for_install(&graph[0], &InMemoryRepository::new(), &repo(&graph))
            .unwrap();

        assert_eq!(order.len(), 4);
        assert_no_duplicates(&order);
        assert_leaves_first(&order);
    }

    #[test]
    fn test_fresh_walks_are_repeatable() {
        let graph = random_acyclic_graph(11, GraphShape::default());
        let root = graph_root(&graph).unwrap();
        let source = repo(&graph);
        let local = InMemoryRepository::new();
        let resolver = PackageResolver::default();

        let first = resolver.resolve_for_install(&root, &local, &source).unwrap();
        let second = resolver.resolve_for_install(&root, &local, &source).unwrap();
        assert_eq!(identities(&first), identities(&second));
    }

    #[test]
    fn test_cycle_reports_chain() {
        let graph = Fixtures::cycle();
        let err = PackageResolver::default()
            .resolve_for_install(&graph[0], &InMemoryRepository::new(), &repo(&graph))
            .unwrap_err();

        assert_matches!(err, ResolveError::CircularDependency { ref chain } => {
            let chain: Vec<String> = chain.iter().map(ToString::to_string).collect();
            assert_eq!(chain, ["A 1.0.0", "B 1.0.0", "A 1.0.0"]);
        });
        let core: depot_core::Error = err.into();
        assert_eq!(core.code(), depot_core::ErrorCode::E0202);
    }

    #[test]
    fn test_unresolved_dependency_fails_whole_install() {
        let graph = packages![
            pkg("App", "1.0").depends("Lib", "1.0").depends("Missing", "[2.0,3.0)"),
            pkg("Lib", "1.0"),
        ];
        let err = PackageResolver::default()
            .resolve_for_install(&graph[0], &InMemoryRepository::new(), &repo(&graph))
            .unwrap_err();

        assert_matches!(err, ResolveError::UnresolvedDependency { .. });
        assert!(err.to_string().contains("Missing"));
    }

    #[test]
    fn test_version_selection() {
        let source = repo(&Fixtures::releases());
        let id = PackageId::new("acme.json");
        let pick = |range: &str| {
            source
                .find_package(&id, &VersionRange::parse(range).unwrap())
                .map(|p| p.version().to_string())
        };

        assert_eq!(pick("[1.5,2.0]").as_deref(), Some("2.0.0"));
        assert_eq!(pick("[1.5]").as_deref(), Some("1.5.0"));
        assert_eq!(pick("[3.0,4.0]"), None);
    }
}

// ========== Project Install Workflow Tests ==========

mod project_install_workflow {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_compatible_upgrade_has_no_conflict() {
        let local = repo(&Fixtures::shared_dependency());
        let c2 = pkg("C", "2.0").build();
        let source = repo(&[Arc::clone(&c2)]);
        let index = ReverseDependencyIndex::new(&local);

        let resolved = PackageResolver::default()
            .resolve_for_project_install(&c2, &local, &source, &index)
            .unwrap();
        assert_identities(&resolved.value, &["C 2.0.0"]);
        assert!(!resolved.has_warnings());
    }

    #[test]
    fn test_exact_pin_conflicts() {
        let local = repo(&packages![
            pkg("A", "1.0").depends("C", "1.0"),
            pkg("B", "1.0").depends("C", "[1.0]"),
            pkg("C", "1.0"),
        ]);
        let c2 = pkg("C", "2.0").build();
        let source = repo(&[Arc::clone(&c2)]);
        let index = ReverseDependencyIndex::new(&local);

        let err = PackageResolver::default()
            .resolve_for_project_install(&c2, &local, &source, &index)
            .unwrap_err();
        assert_matches!(err, ResolveError::Conflict { ref dependents, ref new_version, .. } => {
            let names: Vec<String> = dependents.iter().map(ToString::to_string).collect();
            assert_eq!(names, ["B 1.0.0"]);
            assert_eq!(new_version.to_string(), "2.0.0");
        });
    }

    #[test]
    fn test_forced_conflict_is_warning() {
        let local = repo(&packages![pkg("B", "1.0").depends("C", "[1.0]"), pkg("C", "1.0")]);
        let c2 = pkg("C", "2.0").build();
        let source = repo(&[Arc::clone(&c2)]);
        let index = ReverseDependencyIndex::new(&local);
        let resolver = PackageResolver::new(ResolverConfig {
            force: true,
            ..ResolverConfig::default()
        });

        let resolved = resolver
            .resolve_for_project_install(&c2, &local, &source, &index)
            .unwrap();
        assert_matches!(&resolved.warnings[..], [ResolveWarning::ConflictIgnored { .. }]);
    }

    #[test]
    fn test_index_is_reused_across_requests() {
        let local = repo(&Fixtures::shared_dependency());
        let source = repo(&packages![pkg("C", "2.0"), pkg("C", "3.0")]);
        let index = ReverseDependencyIndex::new(&local);
        let resolver = PackageResolver::default();

        for version in ["2.0", "3.0"] {
            let package = find(&source.packages(), "C", version);
            resolver
                .resolve_for_project_install(&package, &local, &source, &index)
                .unwrap();
        }
        assert!(index.is_built());
    }
}

// ========== Uninstall Workflow Tests ==========

mod uninstall_workflow {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_blocked_by_dependent() {
        let graph = Fixtures::installed_pair();
        let b = find(&graph, "B", "1.0");
        let err = PackageResolver::default()
            .resolve_for_uninstall(&b, &repo(&graph), false, false)
            .unwrap_err();

        assert_matches!(err, ResolveError::DependentsExist { ref dependents, .. } => {
            assert_eq!(dependents[0].to_string(), "A 1.0.0");
        });
    }

    #[test]
    fn test_forced_uninstall_warns() {
        let graph = Fixtures::installed_pair();
        let b = find(&graph, "B", "1.0");
        let resolved = PackageResolver::default()
            .resolve_for_uninstall(&b, &repo(&graph), true, false)
            .unwrap();

        assert_identities(&resolved.value, &["B 1.0.0"]);
        assert_matches!(&resolved.warnings[..], [warning] => {
            assert_eq!(warning.kind(), "dependents-ignored");
            assert_eq!(warning.dependents()[0].to_string(), "A 1.0.0");
        });
    }

    #[test]
    fn test_cascade_is_dependents_first() {
        let graph = Fixtures::diamond();
        let resolved = PackageResolver::default()
            .resolve_for_uninstall(&graph[0], &repo(&graph), false, true)
            .unwrap();

        assert_eq!(resolved.value.len(), 4);
        assert_dependents_first(&resolved.value);
        assert!(!resolved.has_warnings());
    }

    #[test]
    fn test_cascade_keeps_shared_dependency() {
        let graph = Fixtures::shared_dependency();
        let resolved = PackageResolver::default()
            .resolve_for_uninstall(&graph[0], &repo(&graph), false, true)
            .unwrap();

        assert_identities(&resolved.value, &["A 1.0.0"]);
        let mut sink: Vec<ResolveWarning> = Vec::new();
        for warning in &resolved.warnings {
            sink.report(warning);
        }
        assert_matches!(&sink[..], [ResolveWarning::SkippedDependency { package, .. }] => {
            assert_eq!(package.to_string(), "C 1.0.0");
        });
    }

    #[test]
    fn test_project_uninstall_names_project() {
        let graph = Fixtures::installed_pair();
        let local = repo(&graph);
        let index = ReverseDependencyIndex::new(&local);
        let b = find(&graph, "B", "1.0");

        let err = PackageResolver::default()
            .resolve_for_project_uninstall(&b, "web", &local, &index, false, false)
            .unwrap_err();
        assert_matches!(err, ResolveError::DependentsExist { ref scope, .. } => {
            assert_eq!(*scope, UninstallScope::Project("web".to_string()));
        });
        assert!(err.to_string().contains("project 'web'"));
    }
}

// ========== Update Workflow Tests ==========

mod update_workflow {
    use super::*;
    use pretty_assertions::assert_eq;

    fn update(update_dependencies: bool) -> depot_resolver::Resolved<depot_resolver::PackagePlan> {
        let scenario = Fixtures::update();
        PackageResolver::default()
            .resolve_for_update(
                &scenario.old,
                &scenario.new,
                &repo(&scenario.local),
                &repo(&scenario.source),
                update_dependencies,
            )
            .unwrap()
    }

    #[test]
    fn test_update_diff() {
        init_tracing();
        let plan = update(true).value;

        assert_identities(plan.to_uninstall(), &["C 1.0.0"]);
        assert_identities(plan.to_install(), &["C 2.0.0", "D 1.0.0", "A 2.0.0"]);
        assert_eq!(plan.replaced().map(|p| p.identity().to_string()).as_deref(), Some("A 1.0.0"));
        assert_leaves_first(plan.to_install());
    }

    #[test]
    fn test_update_without_cascade_keeps_old_dependencies() {
        let plan = update(false).value;

        assert!(plan.to_uninstall().is_empty());
        assert_identities(plan.to_install(), &["C 2.0.0", "D 1.0.0", "A 2.0.0"]);
    }

    #[test]
    fn test_plan_lists_are_disjoint() {
        for cascade in [false, true] {
            let plan = update(cascade).value;
            assert_disjoint(plan.to_install(), plan.to_uninstall());
            assert_no_duplicates(plan.to_install());
        }
    }

    #[test]
    fn test_update_operations_order() {
        let plan = update(true).value;
        let ops: Vec<String> = plan.operations().iter().map(ToString::to_string).collect();
        assert_eq!(
            ops,
            [
                "uninstall A 1.0.0",
                "uninstall C 1.0.0",
                "install C 2.0.0",
                "install D 1.0.0",
                "install A 2.0.0",
            ]
        );
    }

    #[test]
    fn test_update_conflict_with_outside_dependent() {
        // X pins C 1.0, so replacing C during the update is refused.
        let mut scenario = Fixtures::update();
        scenario.local.push(pkg("X", "1.0").depends("C", "[1.0]").build());

        let err = PackageResolver::default()
            .resolve_for_update(
                &scenario.old,
                &scenario.new,
                &repo(&scenario.local),
                &repo(&scenario.source),
                true,
            )
            .unwrap_err();
        assert_matches!(err, ResolveError::Conflict { ref installed, .. } => {
            assert_eq!(installed.to_string(), "C 1.0.0");
        });
    }

    /// X pins the root being replaced.
    fn pinned_root() -> (Arc<depot_core::Package>, Arc<depot_core::Package>, InMemoryRepository, InMemoryRepository) {
        let local = packages![pkg("X", "1.0").depends("A", "[1.0]"), pkg("A", "1.0")];
        let a2 = pkg("A", "2.0").build();
        (find(&local, "A", "1.0"), Arc::clone(&a2), repo(&local), repo(&[a2]))
    }

    #[test]
    fn test_update_conflict_on_pinned_root() {
        let (old, new, local, source) = pinned_root();

        for cascade in [false, true] {
            let err = PackageResolver::default()
                .resolve_for_update(&old, &new, &local, &source, cascade)
                .unwrap_err();
            assert_matches!(err, ResolveError::Conflict { ref installed, ref dependents, ref new_version } => {
                assert_eq!(installed.to_string(), "A 1.0.0");
                assert_eq!(new_version.to_string(), "2.0.0");
                let names: Vec<String> = dependents.iter().map(ToString::to_string).collect();
                assert_eq!(names, ["X 1.0.0"]);
            });
        }
    }

    #[test]
    fn test_forced_update_of_pinned_root_warns() {
        let (old, new, local, source) = pinned_root();
        let resolver = PackageResolver::new(ResolverConfig {
            force: true,
            ..ResolverConfig::default()
        });

        let resolved = resolver
            .resolve_for_update(&old, &new, &local, &source, false)
            .unwrap();
        assert_matches!(&resolved.warnings[..], [ResolveWarning::ConflictIgnored { installed, .. }] => {
            assert_eq!(installed.to_string(), "A 1.0.0");
        });
        assert_identities(resolved.value.to_install(), &["A 2.0.0"]);
        assert_eq!(resolved.value.replaced().map(|p| p.identity().to_string()).as_deref(), Some("A 1.0.0"));
    }
}

// ========== Property Tests ==========

proptest! {
    #[test]
    fn prop_install_is_leaves_first(graph in acyclic_graph_strategy(16)) {
        let source = repo(&graph);
        let order = PackageResolver::default()
            .resolve_for_install(&graph[0], &InMemoryRepository::new(), &source)
            .unwrap();
        prop_assert!(check_leaves_first(&order).is_ok());
        prop_assert!(check_no_duplicates(&order).is_ok());
        prop_assert_eq!(order.last().map(|p| p.identity().clone()), Some(graph[0].identity().clone()));
    }

    #[test]
    fn prop_cascade_uninstall_is_dependents_first(graph in acyclic_graph_strategy(16)) {
        let local = repo(&graph);
        let resolved = PackageResolver::default()
            .resolve_for_uninstall(&graph[0], &local, true, true)
            .unwrap();
        prop_assert!(check_dependents_first(&resolved.value).is_ok());
        prop_assert!(check_no_duplicates(&resolved.value).is_ok());
    }
}
