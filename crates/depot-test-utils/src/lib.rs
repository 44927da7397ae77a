//! Testing utilities for depot.
//!
//! This crate provides package graph builders, ready-made graphs, random
//! generators and order assertions for testing the resolver.
//!
//! # Modules
//!
//! - [`fixtures`]: Package builders and pre-built dependency graphs
//! - [`generators`]: Seeded random graph generators for benchmarks
//! - [`assertions`]: Ordering and membership checks for resolution output
//! - [`proptest_strategies`]: Proptest strategies for versions, ranges and graphs
//!
//! # Example
//!
//! ```rust
//! use depot_test_utils::prelude::*;
//!
//! let graph = packages![
//!     pkg("A", "1.0").depends("B", "[1.0,)"),
//!     pkg("B", "1.0"),
//! ];
//! assert_eq!(graph.len(), 2);
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod assertions;
pub mod fixtures;
pub mod generators;
pub mod proptest_strategies;

use std::sync::Once;

/// Install a test subscriber once per process.
///
/// Honours `RUST_LOG`; defaults to `depot=debug` so walker traces show up in
/// failing test output.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("depot=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Re-export commonly used testing utilities.
pub mod prelude {
    pub use crate::assertions::*;
    pub use crate::fixtures::{Fixtures, PackageBuilder, UpdateScenario, find, identities, pkg};
    pub use crate::generators::*;
    pub use crate::init_tracing;
    pub use crate::packages;

    // Re-export common testing crates
    pub use proptest::prelude::*;
}
