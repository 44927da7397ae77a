//! Assertion helpers for resolution output.
//!
//! `check_*` functions return an error describing the first violation;
//! `assert_*` wrappers panic with that description.

use anyhow::{Result, bail};
use depot_core::{Package, PackageIdentity};
use std::collections::HashMap;
use std::sync::Arc;

fn positions(order: &[Arc<Package>]) -> HashMap<&PackageIdentity, usize> {
    order
        .iter()
        .enumerate()
        .map(|(i, p)| (p.identity(), i))
        .collect()
}

/// Every dependency edge between two listed packages points backwards.
///
/// For each listed package, any listed package satisfying one of its
/// dependencies must come earlier.
pub fn check_leaves_first(order: &[Arc<Package>]) -> Result<()> {
    let position = positions(order);
    for (i, package) in order.iter().enumerate() {
        for dependency in package.dependencies() {
            for (candidate, &j) in &position {
                if dependency.is_satisfied_by(candidate) && j > i {
                    bail!("{candidate} must come before its dependent {package} (positions {j} > {i})");
                }
            }
        }
    }
    Ok(())
}

/// Every dependency edge between two listed packages points forwards.
pub fn check_dependents_first(order: &[Arc<Package>]) -> Result<()> {
    let position = positions(order);
    for (i, package) in order.iter().enumerate() {
        for dependency in package.dependencies() {
            for (candidate, &j) in &position {
                if dependency.is_satisfied_by(candidate) && j < i {
                    bail!("{candidate} must come after its dependent {package} (positions {j} < {i})");
                }
            }
        }
    }
    Ok(())
}

/// No identity appears twice.
pub fn check_no_duplicates(order: &[Arc<Package>]) -> Result<()> {
    let mut seen = HashMap::new();
    for (i, package) in order.iter().enumerate() {
        if let Some(first) = seen.insert(package.identity(), i) {
            bail!("{} appears at positions {first} and {i}", package.identity());
        }
    }
    Ok(())
}

/// Two lists share no identity.
pub fn check_disjoint(left: &[Arc<Package>], right: &[Arc<Package>]) -> Result<()> {
    let right = positions(right);
    for package in left {
        if right.contains_key(package.identity()) {
            bail!("{} appears in both lists", package.identity());
        }
    }
    Ok(())
}

/// Panic unless dependencies precede dependents.
#[track_caller]
pub fn assert_leaves_first(order: &[Arc<Package>]) {
    if let Err(e) = check_leaves_first(order) {
        panic!("install order violated: {e}");
    }
}

/// Panic unless dependents precede dependencies.
#[track_caller]
pub fn assert_dependents_first(order: &[Arc<Package>]) {
    if let Err(e) = check_dependents_first(order) {
        panic!("removal order violated: {e}");
    }
}

/// Panic if an identity repeats.
#[track_caller]
pub fn assert_no_duplicates(order: &[Arc<Package>]) {
    if let Err(e) = check_no_duplicates(order) {
        panic!("duplicate package: {e}");
    }
}

/// Panic if the lists overlap.
#[track_caller]
pub fn assert_disjoint(left: &[Arc<Package>], right: &[Arc<Package>]) {
    if let Err(e) = check_disjoint(left, right) {
        panic!("lists overlap: {e}");
    }
}

/// Panic unless the list renders to exactly these `"id version"` strings.
#[track_caller]
pub fn assert_identities(order: &[Arc<Package>], expected: &[&str]) {
    let actual = crate::fixtures::identities(order);
    pretty_assertions::assert_eq!(actual, expected);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{Fixtures, find};

    #[test]
    fn leaves_first_accepts_post_order() {
        let chain = Fixtures::chain();
        let order = vec![
            find(&chain, "C", "1.0"),
            find(&chain, "B", "1.0"),
            find(&chain, "A", "1.0"),
        ];
        assert_leaves_first(&order);
        assert!(check_dependents_first(&order).is_err());
    }

    #[test]
    fn leaves_first_rejects_pre_order() {
        let chain = Fixtures::chain();
        assert!(check_leaves_first(&chain).is_err());
        assert_dependents_first(&chain);
    }

    #[test]
    fn duplicates_and_disjointness() {
        let chain = Fixtures::chain();
        let mut doubled = chain.clone();
        doubled.push(find(&chain, "A", "1.0"));
        assert!(check_no_duplicates(&doubled).is_err());
        assert!(check_disjoint(&chain, &doubled).is_err());
        assert_disjoint(&chain, &Fixtures::releases());
    }

    #[test]
    fn identities_match() {
        assert_identities(&Fixtures::installed_pair(), &["A 1.0.0", "B 1.0.0"]);
    }
}
