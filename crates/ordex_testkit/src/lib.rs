//! # Ordex Testkit
//!
//! Test utilities for ordex.
//!
//! This crate provides:
//! - Fixtures that build sets and maps in memory or in temporary files
//! - Property-based test generators using proptest
//! - A reference model that computes expected results with std collections
//! - Tracing setup for tests
//!
//! ## Usage
//!
//! ```rust
//! use ordex_testkit::prelude::*;
//!
//! let fixture = TestSet::file(["bar", "baz", "foo"]);
//! let model = SetModel::new(["bar", "baz", "foo"]);
//! model.verify_iter(&fixture);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod model;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::init_tracing;
    pub use crate::model::*;
}

pub use fixtures::*;
pub use generators::*;
pub use model::*;

/// Installs a test-friendly tracing subscriber once per process.
///
/// The filter is read from `RUST_LOG`; output goes through the test harness
/// so it is only shown for failing tests. Later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
