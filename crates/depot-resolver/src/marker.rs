//! Per-walk visitation tracking.
//!
//! A package is unvisited (absent), `Processing` while it is on the
//! depth-first stack, and `Completed` once its dependencies are done.
//! Revisiting a `Processing` package means the graph has a cycle.

use ahash::AHashMap;
use depot_core::{IdentityKey, IdentityPolicy, Package, PackageIdentity};
use std::sync::Arc;

/// Visitation state of a package within one walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitationState {
    /// On the walk stack.
    Processing,
    /// Fully walked.
    Completed,
}

/// Visitation marker owned by a single walker.
#[derive(Debug)]
pub struct VisitationMarker {
    policy: IdentityPolicy,
    states: AHashMap<IdentityKey, VisitationState>,
    /// Packages in first-visit order.
    visited: Vec<Arc<Package>>,
    /// Packages currently `Processing`, outermost first.
    stack: Vec<Arc<Package>>,
}

impl VisitationMarker {
    /// Create an empty marker comparing identities under `policy`.
    #[must_use]
    pub fn new(policy: IdentityPolicy) -> Self {
        Self {
            policy,
            states: AHashMap::new(),
            visited: Vec::new(),
            stack: Vec::new(),
        }
    }

    /// The identity policy of this marker.
    #[must_use]
    #[inline]
    pub const fn policy(&self) -> IdentityPolicy {
        self.policy
    }

    /// Mark a package as being walked.
    pub fn mark_processing(&mut self, package: &Arc<Package>) {
        let key = self.policy.key(package.identity());
        if self
            .states
            .insert(key, VisitationState::Processing)
            .is_none()
        {
            self.visited.push(Arc::clone(package));
        }
        self.stack.push(Arc::clone(package));
    }

    /// Mark a package as fully walked.
    pub fn mark_completed(&mut self, package: &Arc<Package>) {
        let key = self.policy.key(package.identity());
        if self.states.insert(key, VisitationState::Completed).is_none() {
            self.visited.push(Arc::clone(package));
        }
        if let Some(pos) = self
            .stack
            .iter()
            .rposition(|p| self.policy.equivalent(p.identity(), package.identity()))
        {
            self.stack.remove(pos);
        }
    }

    /// State of an identity, `None` when unvisited.
    #[must_use]
    pub fn state(&self, identity: &PackageIdentity) -> Option<VisitationState> {
        self.states.get(&self.policy.key(identity)).copied()
    }

    /// Check whether an identity has been fully walked.
    #[must_use]
    pub fn is_completed(&self, identity: &PackageIdentity) -> bool {
        self.state(identity) == Some(VisitationState::Completed)
    }

    /// Check whether reaching an identity again would close a cycle.
    #[must_use]
    pub fn is_cycle(&self, identity: &PackageIdentity) -> bool {
        self.state(identity) == Some(VisitationState::Processing)
    }

    /// Check whether an identity was visited at all.
    #[must_use]
    pub fn is_visited(&self, identity: &PackageIdentity) -> bool {
        self.states.contains_key(&self.policy.key(identity))
    }

    /// Every visited package in first-visit order.
    #[must_use]
    pub fn all_visited(&self) -> &[Arc<Package>] {
        &self.visited
    }

    /// Identities currently `Processing`, outermost first.
    #[must_use]
    pub fn processing_chain(&self) -> Vec<PackageIdentity> {
        self.stack.iter().map(|p| p.identity().clone()).collect()
    }

    /// Forget every package.
    pub fn clear(&mut self) {
        self.states.clear();
        self.visited.clear();
        self.stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_test_utils::fixtures::pkg;

    #[test]
    fn unvisited_by_default() {
        let marker = VisitationMarker::new(IdentityPolicy::ByIdAndVersion);
        let a = pkg("A", "1.0").build();
        assert_eq!(marker.state(a.identity()), None);
        assert!(!marker.is_cycle(a.identity()));
        assert!(!marker.is_completed(a.identity()));
    }

    #[test]
    fn processing_then_completed() {
        let mut marker = VisitationMarker::new(IdentityPolicy::ByIdAndVersion);
        let a = pkg("A", "1.0").build();
        let b = pkg("B", "1.0").build();

        marker.mark_processing(&a);
        marker.mark_processing(&b);
        assert!(marker.is_cycle(a.identity()));
        assert_eq!(marker.processing_chain(), vec![a.identity().clone(), b.identity().clone()]);

        marker.mark_completed(&b);
        assert!(marker.is_completed(b.identity()));
        assert_eq!(marker.processing_chain(), vec![a.identity().clone()]);

        marker.mark_completed(&a);
        assert!(marker.processing_chain().is_empty());
        assert_eq!(marker.all_visited().len(), 2);
    }

    #[test]
    fn by_id_treats_versions_as_one() {
        let mut marker = VisitationMarker::new(IdentityPolicy::ById);
        let old = pkg("A", "1.0").build();
        let new = pkg("a", "2.0").build();

        marker.mark_processing(&old);
        marker.mark_completed(&old);
        assert!(marker.is_completed(new.identity()));
        assert!(marker.is_visited(new.identity()));
    }

    #[test]
    fn by_id_and_version_distinguishes() {
        let mut marker = VisitationMarker::new(IdentityPolicy::ByIdAndVersion);
        let old = pkg("A", "1.0").build();
        let new = pkg("A", "2.0").build();

        marker.mark_processing(&old);
        marker.mark_completed(&old);
        assert!(!marker.is_visited(new.identity()));
    }

    #[test]
    fn clear_forgets_everything() {
        let mut marker = VisitationMarker::new(IdentityPolicy::ByIdAndVersion);
        let a = pkg("A", "1.0").build();
        marker.mark_processing(&a);
        marker.clear();
        assert!(!marker.is_visited(a.identity()));
        assert!(marker.all_visited().is_empty());
        assert!(marker.processing_chain().is_empty());
    }
}
