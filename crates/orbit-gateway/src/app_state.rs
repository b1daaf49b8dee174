//! Shared application state for the Orbit gateway.
//!
//! Built once at startup and cloned into every handler. Stores, the rate
//! limiter and the token issuer are injected through [`Backends`] so tests
//! can swap in a manual clock or pre-seeded stores.

use std::sync::Arc;
use std::time::{Duration, Instant};

use orbit_core::authz::{visibility_filter, Action, Decision, DocumentFilter};
use orbit_core::error::Result;
use orbit_core::model::{NewUser, Principal, Role};

use crate::auth::{password, TokenIssuer};
use crate::config::GatewayConfig;
use crate::obs::OrbitMetrics;
use crate::policy::{EndpointGroup, Identity, PolicyDecision, RateLimiter, RequestPolicy};
use crate::store::{
    DocumentStore, FileStore, IdentityStore, InMemoryFileStore, InMemoryStore, LocalDirFileStore,
};

/// Pluggable collaborators behind the request handlers.
pub struct Backends {
    pub identities: Arc<dyn IdentityStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub files: Arc<dyn FileStore>,
    pub limiter: RateLimiter,
}

impl Backends {
    /// In-memory stores; files on disk when `storage.documents_dir` is set.
    pub fn from_config(cfg: &GatewayConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let files: Arc<dyn FileStore> = match &cfg.storage.documents_dir {
            Some(dir) => Arc::new(LocalDirFileStore::new(dir)),
            None => Arc::new(InMemoryFileStore::new()),
        };
        Self {
            identities: store.clone(),
            documents: store,
            files,
            limiter: RateLimiter::in_memory(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    policy: RequestPolicy,
    identities: Arc<dyn IdentityStore>,
    documents: Arc<dyn DocumentStore>,
    files: Arc<dyn FileStore>,
    tokens: TokenIssuer,
    metrics: OrbitMetrics,
    started: Instant,
}

impl AppState {
    /// Build application state with the default backends.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let backends = Backends::from_config(&cfg);
        Self::with_backends(cfg, backends)
    }

    pub fn with_backends(cfg: GatewayConfig, backends: Backends) -> Result<Self> {
        let policy = RequestPolicy::new(cfg.compiled_rate_limits()?, backends.limiter);
        let tokens = TokenIssuer::new(
            cfg.auth.jwt_secret.as_bytes(),
            Duration::from_secs(cfg.auth.access_ttl_secs),
            Duration::from_secs(cfg.auth.refresh_ttl_secs),
        );

        for group in EndpointGroup::ALL {
            match policy.rate(group) {
                Some(rate) => tracing::debug!(%group, %rate, "rate limit configured"),
                None => tracing::debug!(%group, "rate limit disabled"),
            }
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                policy,
                identities: backends.identities,
                documents: backends.documents,
                files: backends.files,
                tokens,
                metrics: OrbitMetrics::default(),
                started: Instant::now(),
            }),
        })
    }

    /// Create the configured bootstrap admin unless that email is taken.
    pub async fn seed_bootstrap_admin(&self) -> Result<()> {
        let Some(admin) = self.cfg().bootstrap_admin.clone() else {
            return Ok(());
        };
        if self.identities().find_by_email(&admin.email).await?.is_some() {
            tracing::info!(email = %admin.email, "bootstrap admin already present");
            return Ok(());
        }

        let password_hash = password::hash_password_blocking(admin.password).await?;
        let user = self
            .identities()
            .create_user(NewUser {
                name: admin.name,
                email: admin.email,
                password_hash,
                role: Role::Admin,
                department: None,
                organization: None,
            })
            .await?;
        tracing::info!(user_id = %user.id, "bootstrap admin created");
        Ok(())
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn policy(&self) -> &RequestPolicy {
        &self.inner.policy
    }

    pub fn identities(&self) -> &dyn IdentityStore {
        self.inner.identities.as_ref()
    }

    pub fn documents(&self) -> &dyn DocumentStore {
        self.inner.documents.as_ref()
    }

    pub fn files(&self) -> &dyn FileStore {
        self.inner.files.as_ref()
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.inner.tokens
    }

    pub fn metrics(&self) -> &OrbitMetrics {
        &self.inner.metrics
    }

    pub fn is_draining(&self) -> bool {
        self.inner.metrics.is_draining()
    }

    pub fn set_draining(&self) {
        self.inner.metrics.set_draining();
    }

    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        vec![("orbit_uptime_seconds", self.inner.started.elapsed().as_secs())]
    }

    /// Count the request against its group quota.
    pub fn throttle(&self, group: EndpointGroup, identity: Identity) -> Result<()> {
        self.metrics().requests.inc(&[("group", group.as_str())]);
        let decision = self.policy().check(group, identity);
        let label = match decision {
            PolicyDecision::Pass => "pass",
            PolicyDecision::Reject { .. } => "reject",
        };
        self.metrics()
            .rate_limit_decisions
            .inc(&[("group", group.as_str()), ("decision", label)]);
        decision.into_result()
    }

    /// Turn an authorization decision into a result, counting denials.
    pub fn enforce(&self, action: Action, decision: Decision) -> Result<()> {
        if let Decision::Deny(reason) = decision {
            tracing::info!(%action, reason, "authorization denied");
            self.metrics().authz_denials.inc(&[("action", action.as_str())]);
        }
        decision.into_result()
    }

    /// Visibility filter for `principal`. A misconfigured principal is logged
    /// and counted as a denial of `action`.
    pub fn document_filter(&self, action: Action, principal: &Principal) -> Result<DocumentFilter> {
        visibility_filter(principal).map_err(|e| {
            tracing::warn!(
                user_id = %principal.id,
                role = %principal.role,
                %action,
                error = %e,
                "principal misconfigured for document access"
            );
            self.metrics().authz_denials.inc(&[("action", action.as_str())]);
            e
        })
    }
}
