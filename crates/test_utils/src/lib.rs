//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! hospital billing test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data and a fully seeded in-memory store
//! - `builders`: Builder patterns for test data construction

pub mod builders;
pub mod fixtures;

pub use builders::*;
pub use fixtures::*;
