//! Role membership resolution
//!
//! Membership is decided by an ordered chain of [`MembershipSource`]s. Each
//! source sees the verdict of the sources before it and may only raise it;
//! the resolver stops at the first `true`, so a misbehaving source can never
//! revoke a membership another source granted.
//!
//! The only built-in source is [`ConfiguredMembership`], which reads the
//! role assignment table from [`PolicyTables`].

use crate::config::PolicyTables;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Priority used for sources registered without an explicit one
pub const DEFAULT_PRIORITY: i32 = 10;

/// A pluggable membership decision
pub trait MembershipSource: Send + Sync {
    /// Name used in logs and metrics
    fn name(&self) -> &str;

    /// Decide whether `username` holds `role`
    ///
    /// `prior` is the verdict of earlier sources. It is always `false` when
    /// called through [`MembershipResolver`], which short-circuits on `true`.
    fn has_role(&self, prior: bool, username: &str, role: &str, tables: &PolicyTables) -> bool;
}

/// Membership from the configured role assignment table
///
/// An empty table grants every role to every user, so an unconfigured
/// installation does not lock its operators out.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfiguredMembership;

impl MembershipSource for ConfiguredMembership {
    fn name(&self) -> &str {
        "config"
    }

    fn has_role(&self, prior: bool, username: &str, role: &str, tables: &PolicyTables) -> bool {
        if prior {
            return true;
        }

        if tables.is_unrestricted() {
            return true;
        }

        match tables.role_members(role) {
            Some(members) => members.contains(&username.to_lowercase()),
            None => false,
        }
    }
}

#[derive(Clone)]
struct Registered {
    priority: i32,
    source: Arc<dyn MembershipSource>,
}

/// Ordered chain of membership sources
#[derive(Clone)]
pub struct MembershipResolver {
    sources: Vec<Registered>,
}

impl MembershipResolver {
    /// Resolver with the built-in configuration source
    pub fn new() -> Self {
        let mut resolver = Self::empty();
        resolver.register(DEFAULT_PRIORITY, ConfiguredMembership);
        resolver
    }

    /// Resolver with no sources; every lookup answers `false`
    pub fn empty() -> Self {
        Self { sources: Vec::new() }
    }

    /// Add a source at `priority` (lower runs first)
    ///
    /// Sources with equal priority run in registration order.
    pub fn register(&mut self, priority: i32, source: impl MembershipSource + 'static) {
        self.register_arc(priority, Arc::new(source));
    }

    pub fn register_arc(&mut self, priority: i32, source: Arc<dyn MembershipSource>) {
        self.sources.push(Registered { priority, source });
        self.sources.sort_by_key(|r| r.priority);
    }

    /// Source names in evaluation order
    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|r| r.source.name().to_string()).collect()
    }

    /// Whether `username` holds `role`
    pub fn has_role(&self, username: &str, role: &str, tables: &PolicyTables) -> bool {
        let mut verdict = false;
        for registered in &self.sources {
            verdict = registered.source.has_role(verdict, username, role, tables);
            if verdict {
                debug!(
                    "Role '{}' granted to '{}' by source '{}'",
                    role,
                    username,
                    registered.source.name()
                );
                return true;
            }
        }
        false
    }

    /// Every role in the role table that `username` holds
    pub fn roles_of(&self, username: &str, tables: &PolicyTables) -> Vec<String> {
        tables
            .role_capabilities()
            .keys()
            .filter(|role| self.has_role(username, role, tables))
            .cloned()
            .collect()
    }
}

impl Default for MembershipResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MembershipResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MembershipResolver")
            .field("sources", &self.source_names())
            .finish()
    }
}
