//! Orbit gateway library entry.
//!
//! This crate wires configuration, rate limiting, authentication, stores and
//! the REST handlers into a single axum service. It is intended to be
//! consumed by the binary (`main.rs`) and by integration tests.

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod obs;
pub mod ops;
pub mod policy;
pub mod router;
pub mod store;
