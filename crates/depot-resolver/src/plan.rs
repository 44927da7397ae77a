//! Install/uninstall plans produced by updates.

use depot_core::{Package, PackageIdentity};
use std::fmt;
use std::sync::Arc;

/// A single step of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageOperation {
    /// Install a package.
    Install(Arc<Package>),
    /// Remove a package.
    Uninstall(Arc<Package>),
}

impl PackageOperation {
    /// The package this operation acts on.
    #[must_use]
    pub fn package(&self) -> &Arc<Package> {
        match self {
            Self::Install(p) | Self::Uninstall(p) => p,
        }
    }

    /// Check if this is an install.
    #[must_use]
    pub const fn is_install(&self) -> bool {
        matches!(self, Self::Install(_))
    }
}

impl fmt::Display for PackageOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Install(p) => write!(f, "install {}", p.identity()),
            Self::Uninstall(p) => write!(f, "uninstall {}", p.identity()),
        }
    }
}

/// Packages to install and to uninstall.
///
/// `to_uninstall` is in removal order (dependents first) and `to_install`
/// in install order (dependencies first). An update additionally records the
/// root it replaces; that root is not part of `to_uninstall`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackagePlan {
    to_install: Vec<Arc<Package>>,
    to_uninstall: Vec<Arc<Package>>,
    replaced: Option<Arc<Package>>,
}

impl PackagePlan {
    /// Create a plan from install and uninstall lists.
    #[must_use]
    pub const fn new(to_install: Vec<Arc<Package>>, to_uninstall: Vec<Arc<Package>>) -> Self {
        Self {
            to_install,
            to_uninstall,
            replaced: None,
        }
    }

    /// Record the root package this plan replaces, removing it from
    /// `to_uninstall`.
    #[must_use]
    pub fn with_replaced(mut self, root: Arc<Package>) -> Self {
        self.to_uninstall.retain(|p| p.identity() != root.identity());
        self.replaced = Some(root);
        self
    }

    /// The root package replaced by an update.
    #[must_use]
    pub const fn replaced(&self) -> Option<&Arc<Package>> {
        self.replaced.as_ref()
    }

    /// Packages to install, dependencies first.
    #[must_use]
    pub fn to_install(&self) -> &[Arc<Package>] {
        &self.to_install
    }

    /// Packages to uninstall, dependents first.
    #[must_use]
    pub fn to_uninstall(&self) -> &[Arc<Package>] {
        &self.to_uninstall
    }

    /// Split into `(to_install, to_uninstall)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Arc<Package>>, Vec<Arc<Package>>) {
        (self.to_install, self.to_uninstall)
    }

    /// Check if the plan does nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_install.is_empty() && self.to_uninstall.is_empty() && self.replaced.is_none()
    }

    /// Check whether the plan installs `identity`.
    #[must_use]
    pub fn contains_install(&self, identity: &PackageIdentity) -> bool {
        self.to_install.iter().any(|p| p.identity() == identity)
    }

    /// Check whether the plan removes `identity`.
    #[must_use]
    pub fn contains_uninstall(&self, identity: &PackageIdentity) -> bool {
        self.to_uninstall.iter().any(|p| p.identity() == identity)
    }

    /// Operations in execution order: the replaced root, every uninstall,
    /// then every install.
    #[must_use]
    pub fn operations(&self) -> Vec<PackageOperation> {
        self.replaced
            .iter()
            .chain(&self.to_uninstall)
            .cloned()
            .map(PackageOperation::Uninstall)
            .chain(self.to_install.iter().cloned().map(PackageOperation::Install))
            .collect()
    }

    /// Drop identities present in both lists, and duplicate entries within
    /// one list. A package both removed and reinstalled is left alone.
    #[must_use]
    pub fn reduce(self) -> Self {
        let Self {
            to_install,
            to_uninstall,
            replaced,
        } = self;

        let install = dedup(
            to_install
                .iter()
                .filter(|p| !listed(p, &to_uninstall))
                .cloned(),
        );
        let uninstall = dedup(
            to_uninstall
                .iter()
                .filter(|p| !listed(p, &to_install))
                .cloned(),
        );

        Self {
            to_install: install,
            to_uninstall: uninstall,
            replaced,
        }
    }
}

fn listed(package: &Arc<Package>, list: &[Arc<Package>]) -> bool {
    list.iter().any(|p| p.identity() == package.identity())
}

fn dedup(packages: impl Iterator<Item = Arc<Package>>) -> Vec<Arc<Package>> {
    let mut out: Vec<Arc<Package>> = Vec::new();
    for package in packages {
        if !out.iter().any(|p| p.identity() == package.identity()) {
            out.push(package);
        }
    }
    out
}

impl fmt::Display for PackagePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to install, {} to uninstall",
            self.to_install.len(),
            self.to_uninstall.len()
        )?;
        if let Some(root) = &self.replaced {
            write!(f, ", replacing {}", root.identity())?;
        }
        for operation in self.operations() {
            write!(f, "\n  {operation}")?;
        }
        Ok(())
    }
}
