//! Orbit core: domain model, error taxonomy, authorization and validation.
//!
//! This crate holds the role-scoped access rules shared by the gateway and
//! its tests. It carries no transport, storage, or runtime dependencies:
//! everything here is synchronous and side-effect free.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `OrbitError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod authz;
pub mod error;
pub mod model;
pub mod validate;

/// Shared result type.
pub use error::{ClientCode, OrbitError, Result};
