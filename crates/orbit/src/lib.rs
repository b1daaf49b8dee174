//! Top-level facade crate for Orbit.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use orbit_core::*;
}

pub mod gateway {
    pub use orbit_gateway::*;
}
