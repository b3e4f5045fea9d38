//! Capability grant sources
//!
//! A capability check runs an ordered chain of [`GrantSource`]s. The chain
//! starts at `false`; every source receives the verdict so far and may raise
//! it to `true`. [`GrantChain::evaluate`] stops at the first `true`, so once a
//! capability is granted no later source can take it back.
//!
//! Built-in sources, in priority order:
//!
//! | priority | source | grants |
//! |---|---|---|
//! | 5  | [`AnonymousGrant`]   | capabilities in the anonymous list |
//! | 10 | [`RoleGrant`]        | capabilities of every role the user holds |
//! | 15 | [`TrustedNetworkGrant`] | everything, for callers inside a trusted range |
//! | 15 | [`ApiBypassGrant`]   | everything, for API calls that name no user |

use crate::config::PolicyTables;
use crate::membership::MembershipResolver;
use crate::types::RequestContext;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

pub const ANONYMOUS_PRIORITY: i32 = 5;
pub const ROLE_PRIORITY: i32 = 10;
pub const TRUSTED_NETWORK_PRIORITY: i32 = 15;
pub const API_BYPASS_PRIORITY: i32 = 15;

/// Everything a grant source may consult for one check
#[derive(Clone, Copy)]
pub struct GrantContext<'a> {
    pub request: &'a RequestContext,
    pub tables: &'a PolicyTables,
    pub membership: &'a MembershipResolver,
}

/// A pluggable capability decision
pub trait GrantSource: Send + Sync {
    /// Name reported in decisions, logs and metrics
    fn name(&self) -> &str;

    /// Decide whether `capability` is granted
    ///
    /// Well-behaved sources return `true` whenever `prior` is `true`.
    fn grant(&self, prior: bool, capability: &str, ctx: &GrantContext<'_>) -> bool;
}

/// Capabilities that need no authentication
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousGrant;

impl GrantSource for AnonymousGrant {
    fn name(&self) -> &str {
        "anonymous"
    }

    fn grant(&self, prior: bool, capability: &str, ctx: &GrantContext<'_>) -> bool {
        prior || ctx.tables.is_anonymous(capability)
    }
}

/// Capabilities carried by the roles of the authenticated user
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleGrant;

impl RoleGrant {
    /// Union of the capabilities of every role `username` holds
    pub fn capabilities_of<'t>(username: &str, ctx: &GrantContext<'t>) -> BTreeSet<&'t str> {
        let mut granted = BTreeSet::new();
        for (role, caps) in ctx.tables.role_capabilities() {
            if ctx.membership.has_role(username, role, ctx.tables) {
                granted.extend(caps.iter().map(String::as_str));
            }
        }
        granted
    }
}

impl GrantSource for RoleGrant {
    fn name(&self) -> &str {
        "role"
    }

    fn grant(&self, prior: bool, capability: &str, ctx: &GrantContext<'_>) -> bool {
        if prior {
            return true;
        }

        let Some(username) = ctx.request.user() else {
            return false;
        };

        Self::capabilities_of(username, ctx).contains(capability)
    }
}

/// Every capability for callers inside a trusted range
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustedNetworkGrant;

impl GrantSource for TrustedNetworkGrant {
    fn name(&self) -> &str {
        "trusted_network"
    }

    fn grant(&self, prior: bool, capability: &str, ctx: &GrantContext<'_>) -> bool {
        if prior {
            return true;
        }

        match ctx.tables.trusted_range_for(&ctx.request.remote_addr) {
            Some(range) => {
                debug!(
                    "Trusted network {} grants '{}' to {}",
                    range, capability, ctx.request.remote_addr
                );
                true
            }
            None => false,
        }
    }
}

/// Every capability for API requests that carry no username
///
/// Such callers are left to the host's own API key or token checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiBypassGrant;

impl GrantSource for ApiBypassGrant {
    fn name(&self) -> &str {
        "api_bypass"
    }

    fn grant(&self, prior: bool, capability: &str, ctx: &GrantContext<'_>) -> bool {
        if prior {
            return true;
        }

        if ctx.request.api_mode && !ctx.request.has_username_param {
            debug!("API request without username granted '{}'", capability);
            return true;
        }

        false
    }
}

#[derive(Clone)]
struct Registered {
    priority: i32,
    source: Arc<dyn GrantSource>,
}

/// Outcome of running the chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainVerdict {
    pub granted: bool,
    /// Source that granted, when `granted`
    pub source: Option<String>,
}

/// Ordered chain of grant sources
#[derive(Clone)]
pub struct GrantChain {
    sources: Vec<Registered>,
}

impl GrantChain {
    /// Chain with the four built-in sources
    pub fn new() -> Self {
        let mut chain = Self::empty();
        chain.register(ANONYMOUS_PRIORITY, AnonymousGrant);
        chain.register(ROLE_PRIORITY, RoleGrant);
        chain.register(TRUSTED_NETWORK_PRIORITY, TrustedNetworkGrant);
        chain.register(API_BYPASS_PRIORITY, ApiBypassGrant);
        chain
    }

    /// Chain with no sources; nothing is ever granted
    pub fn empty() -> Self {
        Self { sources: Vec::new() }
    }

    /// Add a source at `priority` (lower runs first, ties keep registration order)
    pub fn register(&mut self, priority: i32, source: impl GrantSource + 'static) {
        self.register_arc(priority, Arc::new(source));
    }

    pub fn register_arc(&mut self, priority: i32, source: Arc<dyn GrantSource>) {
        self.sources.push(Registered { priority, source });
        self.sources.sort_by_key(|r| r.priority);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Source names in evaluation order
    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|r| r.source.name().to_string()).collect()
    }

    /// Run the chain for `capability`
    pub fn evaluate(&self, capability: &str, ctx: &GrantContext<'_>) -> ChainVerdict {
        for registered in &self.sources {
            let name = registered.source.name();
            if registered.source.grant(false, capability, ctx) {
                debug!("Capability '{}' granted by source '{}'", capability, name);
                return ChainVerdict {
                    granted: true,
                    source: Some(name.to_string()),
                };
            }
            debug!("Source '{}' did not grant '{}'", name, capability);
        }

        ChainVerdict {
            granted: false,
            source: None,
        }
    }
}

impl Default for GrantChain {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GrantChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrantChain")
            .field("sources", &self.source_names())
            .finish()
    }
}
