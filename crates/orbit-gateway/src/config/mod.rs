//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;

use orbit_core::error::{OrbitError, Result};

pub use schema::{AuthSection, BootstrapAdmin, GatewayConfig, ServerSection, StorageSection};

/// Environment variable that overrides `auth.jwt_secret`.
pub const JWT_SECRET_ENV: &str = "ORBIT_JWT_SECRET";

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| OrbitError::Internal(format!("read config failed: {e}")))?;
    let mut cfg = parse(&s)?;
    if let Ok(secret) = std::env::var(JWT_SECRET_ENV) {
        cfg.auth.jwt_secret = secret;
    }
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg = parse(s)?;
    cfg.validate()?;
    Ok(cfg)
}

fn parse(s: &str) -> Result<GatewayConfig> {
    serde_yaml::from_str(s).map_err(|e| OrbitError::validation(format!("invalid yaml: {e}")))
}
