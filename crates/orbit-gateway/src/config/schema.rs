use std::collections::BTreeMap;

use serde::Deserialize;
use orbit_core::error::{OrbitError, Result};

use crate::policy::{EndpointGroup, Rate};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    pub auth: AuthSection,

    /// Endpoint group -> rate string (`"5/m"`). Groups left out use the
    /// default rate; a group set to `"off"` is not limited.
    #[serde(default)]
    pub rate_limits: BTreeMap<String, String>,

    #[serde(default)]
    pub storage: StorageSection,

    #[serde(default)]
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(OrbitError::validation(format!(
                "unsupported config version: {}",
                self.version
            )));
        }

        self.server.validate()?;
        self.auth.validate()?;
        self.compiled_rate_limits()?;

        if let Some(admin) = &self.bootstrap_admin {
            admin.validate()?;
        }
        Ok(())
    }

    /// Resolve the effective rate for every endpoint group.
    pub fn compiled_rate_limits(&self) -> Result<BTreeMap<EndpointGroup, Option<Rate>>> {
        for key in self.rate_limits.keys() {
            key.parse::<EndpointGroup>()?;
        }

        let mut out = BTreeMap::new();
        for group in EndpointGroup::ALL {
            let rate = match self.rate_limits.get(group.as_str()) {
                Some(raw) if raw == "off" => None,
                Some(raw) => Some(raw.parse::<Rate>()?),
                None => Some(Rate::per_minute(DEFAULT_REQUESTS_PER_MINUTE)),
            };
            out.insert(group, rate);
        }
        Ok(out)
    }
}

const DEFAULT_REQUESTS_PER_MINUTE: u32 = 5;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// How often expired rate-limit windows are purged.
    #[serde(default = "default_purge_interval_ms")]
    pub rate_limit_purge_interval_ms: u64,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            rate_limit_purge_interval_ms: default_purge_interval_ms(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if !(1000..=3_600_000).contains(&self.rate_limit_purge_interval_ms) {
            return Err(OrbitError::validation(
                "server.rate_limit_purge_interval_ms must be between 1000 and 3600000",
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(OrbitError::validation(
                "server.max_upload_bytes must be greater than 0",
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8000".into()
}
fn default_purge_interval_ms() -> u64 {
    60_000
}
fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSection {
    pub jwt_secret: String,

    #[serde(default = "default_access_ttl_secs")]
    pub access_ttl_secs: u64,

    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_ttl_secs: u64,
}

impl AuthSection {
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.len() < 16 {
            return Err(OrbitError::validation(
                "auth.jwt_secret must be at least 16 bytes",
            ));
        }
        if self.access_ttl_secs == 0 {
            return Err(OrbitError::validation("auth.access_ttl_secs must be greater than 0"));
        }
        if self.refresh_ttl_secs <= self.access_ttl_secs {
            return Err(OrbitError::validation(
                "auth.refresh_ttl_secs must be greater than access_ttl_secs",
            ));
        }
        Ok(())
    }
}

fn default_access_ttl_secs() -> u64 {
    300
}
fn default_refresh_ttl_secs() -> u64 {
    86_400
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageSection {
    /// Directory for uploaded files. Files are kept in memory when unset.
    #[serde(default)]
    pub documents_dir: Option<String>,
}

/// Admin account seeded at startup so the admin-only endpoints are reachable.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl BootstrapAdmin {
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.email.is_empty() || self.password.is_empty() {
            return Err(OrbitError::validation(
                "bootstrap_admin requires name, email and password",
            ));
        }
        Ok(())
    }
}
