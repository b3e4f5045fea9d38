//! Capability grant engine
//!
//! Ties the configuration, the membership resolver and the grant chain
//! together behind the three query interfaces the host uses:
//! [`Authorizer::has_capability`], [`Authorizer::enumerate_granted`] and
//! [`Authorizer::has_role`].
//!
//! # Architecture
//!
//! ```text
//! AuthConfig ──normalize once──▶ PolicyTables
//!                                    │
//! check(capability, request) ──▶ GrantChain ──▶ anonymous → role → trusted network → api bypass
//!                                    │               │
//!                                    │          MembershipResolver
//!                                    ▼
//!                           CapabilityDecision ──▶ [Metrics]
//! ```
//!
//! Tables are normalized lazily on the first query, under a one-time guard,
//! and never change afterwards. Every query after that is lock-free apart
//! from the optional metrics counters.

pub mod decision;
pub mod metrics;

pub use decision::{CapabilityDecision, DecisionReason};
pub use metrics::{EngineMetrics, MetricsCollector};

use crate::config::{AuthConfig, PolicyTables};
use crate::error::Result;
use crate::grant::{GrantChain, GrantContext, GrantSource};
use crate::membership::{MembershipResolver, MembershipSource};
use crate::types::{BuiltinCapability, Capability, RequestContext};

use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::{debug, info};

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Closed capability set walked by enumeration, in display order
    pub known_capabilities: Vec<Capability>,

    /// Enable metrics collection
    pub enable_metrics: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            known_capabilities: BuiltinCapability::names(),
            enable_metrics: true,
        }
    }
}

/// Capability and role decision engine
pub struct Authorizer {
    /// Raw configuration, normalized on first use
    config: AuthConfig,

    /// Normalized tables, written exactly once
    tables: OnceCell<Arc<PolicyTables>>,

    /// Ordered grant sources
    grants: GrantChain,

    /// Ordered membership sources
    membership: MembershipResolver,

    /// Metrics collector
    metrics: Option<Arc<MetricsCollector>>,

    /// Engine configuration
    engine_config: EngineConfig,
}

impl Authorizer {
    /// Engine with the built-in sources and default engine settings
    ///
    /// The configuration is not validated until the first query or an
    /// explicit [`ensure_initialized`](Self::ensure_initialized).
    pub fn new(config: AuthConfig) -> Self {
        AuthorizerBuilder::new(config).build()
    }

    /// Engine whose configuration has already been validated
    pub fn from_config(config: AuthConfig) -> Result<Self> {
        let authorizer = Self::new(config);
        authorizer.ensure_initialized()?;
        Ok(authorizer)
    }

    pub fn builder(config: AuthConfig) -> AuthorizerBuilder {
        AuthorizerBuilder::new(config)
    }

    /// Normalize the configuration if that has not happened yet
    ///
    /// Safe to call before every query: only the first successful call does
    /// any work, and concurrent first calls initialize once.
    pub fn ensure_initialized(&self) -> Result<&PolicyTables> {
        let tables = self.tables.get_or_try_init(|| {
            let tables = self.config.normalize()?;
            info!(
                "Authorization tables initialized: {} roles, {} role assignments, {} anonymous capabilities, {} trusted ranges",
                tables.role_capabilities().len(),
                tables.role_assignment().len(),
                tables.anonymous_capabilities().len(),
                tables.trusted_ranges().len()
            );
            Ok::<_, crate::error::AuthzError>(Arc::new(tables))
        })?;
        Ok(tables.as_ref())
    }

    /// Check a capability and report which source decided it
    pub fn check(&self, capability: &str, request: &RequestContext) -> Result<CapabilityDecision> {
        let tables = self.ensure_initialized()?;
        let ctx = GrantContext {
            request,
            tables,
            membership: &self.membership,
        };

        let verdict = self.grants.evaluate(capability, &ctx);

        if let Some(metrics) = &self.metrics {
            metrics.record_decision(verdict.granted, verdict.source.as_deref());
        }

        let decision = match verdict.source {
            Some(source) if verdict.granted => CapabilityDecision::grant(capability, source),
            _ => CapabilityDecision::deny(capability),
        };

        debug!(
            "Decision: {} '{}' for user={:?} addr={} api={}",
            if decision.granted { "ALLOW" } else { "DENY" },
            capability,
            request.user(),
            request.remote_addr,
            request.api_mode
        );

        Ok(decision)
    }

    /// Whether `capability` is permitted for `request`
    pub fn has_capability(&self, capability: &str, request: &RequestContext) -> Result<bool> {
        Ok(self.check(capability, request)?.granted)
    }

    /// Whether `username` holds `role`, case-insensitively
    pub fn has_role(&self, username: &str, role: &str) -> Result<bool> {
        let tables = self.ensure_initialized()?;
        if let Some(metrics) = &self.metrics {
            metrics.record_role_query();
        }
        Ok(self.membership.has_role(username, role, tables))
    }

    /// Roles from the role table that `username` holds
    pub fn roles_of(&self, username: &str) -> Result<Vec<String>> {
        let tables = self.ensure_initialized()?;
        Ok(self.membership.roles_of(username, tables))
    }

    /// Known capabilities granted to `request`, in declared order
    ///
    /// For display only. Each capability is checked independently, exactly
    /// as a guard would check it.
    pub fn enumerate_granted(&self, request: &RequestContext) -> Result<Vec<Capability>> {
        if let Some(metrics) = &self.metrics {
            metrics.record_enumeration();
        }

        let mut granted = Vec::new();
        for capability in &self.engine_config.known_capabilities {
            if self.has_capability(capability, request)? {
                granted.push(capability.clone());
            }
        }
        Ok(granted)
    }

    /// The closed capability set
    pub fn known_capabilities(&self) -> &[Capability] {
        &self.engine_config.known_capabilities
    }

    /// Grant source names in evaluation order
    pub fn grant_sources(&self) -> Vec<String> {
        self.grants.source_names()
    }

    pub fn membership_sources(&self) -> Vec<String> {
        self.membership.source_names()
    }

    /// Engine metrics, when enabled
    pub fn get_metrics(&self) -> Option<EngineMetrics> {
        self.metrics.as_ref().map(|m| m.get_metrics())
    }

    /// Whether the tables have been normalized yet
    pub fn is_initialized(&self) -> bool {
        self.tables.get().is_some()
    }
}

/// Builder for an [`Authorizer`] with extra sources or settings
pub struct AuthorizerBuilder {
    config: AuthConfig,
    grants: GrantChain,
    membership: MembershipResolver,
    engine_config: EngineConfig,
}

impl AuthorizerBuilder {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            grants: GrantChain::new(),
            membership: MembershipResolver::new(),
            engine_config: EngineConfig::default(),
        }
    }

    pub fn engine_config(mut self, engine_config: EngineConfig) -> Self {
        self.engine_config = engine_config;
        self
    }

    /// Add a grant source to the built-in chain
    pub fn grant_source(mut self, priority: i32, source: impl GrantSource + 'static) -> Self {
        self.grants.register(priority, source);
        self
    }

    /// Replace the grant chain entirely
    pub fn grant_chain(mut self, chain: GrantChain) -> Self {
        self.grants = chain;
        self
    }

    /// Add a membership source after (or before) the configuration table
    pub fn membership_source(mut self, priority: i32, source: impl MembershipSource + 'static) -> Self {
        self.membership.register(priority, source);
        self
    }

    pub fn membership_resolver(mut self, resolver: MembershipResolver) -> Self {
        self.membership = resolver;
        self
    }

    pub fn build(self) -> Authorizer {
        let metrics = if self.engine_config.enable_metrics {
            Some(Arc::new(MetricsCollector::new()))
        } else {
            None
        };

        info!(
            "Authorizer created with grant sources {:?}, membership sources {:?}",
            self.grants.source_names(),
            self.membership.source_names()
        );

        Authorizer {
            config: self.config,
            tables: OnceCell::new(),
            grants: self.grants,
            membership: self.membership,
            metrics,
            engine_config: self.engine_config,
        }
    }
}
