//! Configuration tables and their normalization
//!
//! [`AuthConfig`] is the raw form supplied by the host: every table is
//! optional so that "not configured" can be told apart from "configured as
//! empty". [`AuthConfig::normalize`] fills in defaults, validates the tables
//! and folds identities to lower case, producing the immutable
//! [`PolicyTables`] that grant and membership sources read.

use crate::cidr::TrustedRange;
use crate::error::{AuthzError, Result};
use crate::types::{default_role_capabilities, Capability, RoleName, Username};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use tracing::{debug, warn};

/// Range trusted when none are configured
pub const DEFAULT_TRUSTED_RANGE: &str = "127.0.0.0/8";

/// Raw configuration as supplied by the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Capabilities granted without authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anonymous_capabilities: Option<Vec<Capability>>,

    /// Role -> capabilities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_capabilities: Option<BTreeMap<RoleName, Vec<Capability>>>,

    /// Role -> usernames
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_assignment: Option<BTreeMap<RoleName, Vec<Username>>>,

    /// CIDR ranges whose callers receive every capability
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_ip_ranges: Option<Vec<String>>,
}

impl AuthConfig {
    /// Create an empty configuration (every table unset)
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn with_anonymous_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Capability>,
    {
        self.anonymous_capabilities = Some(capabilities.into_iter().map(Into::into).collect());
        self
    }

    /// Set the capabilities of one role, starting an empty role table if unset
    ///
    /// Once any role is set the built-in role table is no longer used.
    pub fn with_role_capabilities<I, S>(mut self, role: impl Into<RoleName>, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Capability>,
    {
        self.role_capabilities
            .get_or_insert_with(BTreeMap::new)
            .insert(role.into(), capabilities.into_iter().map(Into::into).collect());
        self
    }

    /// Assign usernames to a role
    pub fn with_role_assignment<I, S>(mut self, role: impl Into<RoleName>, usernames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Username>,
    {
        self.role_assignment
            .get_or_insert_with(BTreeMap::new)
            .entry(role.into())
            .or_default()
            .extend(usernames.into_iter().map(Into::into));
        self
    }

    pub fn with_admin_ip_ranges<I, S>(mut self, ranges: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.admin_ip_ranges = Some(ranges.into_iter().map(Into::into).collect());
        self
    }

    /// Apply defaults, validate, and lower-case the role assignment table
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::InvalidCidr`] for an unparseable trusted range and
    /// [`AuthzError::InvalidConfig`] for empty role, capability or user names.
    pub fn normalize(&self) -> Result<PolicyTables> {
        let anonymous = match &self.anonymous_capabilities {
            Some(caps) => {
                validate_names("anonymous capability", caps)?;
                caps.iter().cloned().collect()
            }
            None => HashSet::new(),
        };

        let role_capabilities = match &self.role_capabilities {
            Some(table) => {
                let mut normalized = BTreeMap::new();
                for (role, caps) in table {
                    validate_name("role", role)?;
                    validate_names(&format!("capability of role '{}'", role), caps)?;
                    normalized.insert(role.clone(), caps.iter().cloned().collect());
                }
                normalized
            }
            None => {
                debug!("No role table configured, using built-in roles");
                default_role_capabilities()
            }
        };

        let mut role_assignment: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        if let Some(table) = &self.role_assignment {
            for (role, users) in table {
                validate_name("role", role)?;
                validate_names(&format!("member of role '{}'", role), users)?;
                role_assignment
                    .entry(role.to_lowercase())
                    .or_default()
                    .extend(users.iter().map(|u| u.to_lowercase()));
            }
        }

        let trusted_ranges = match &self.admin_ip_ranges {
            Some(ranges) => ranges
                .iter()
                .map(|r| TrustedRange::parse(r))
                .collect::<Result<Vec<_>>>()?,
            None => vec![TrustedRange::parse(DEFAULT_TRUSTED_RANGE)?],
        };

        if role_assignment.is_empty() {
            warn!("Role assignment table is empty, every user holds every role");
        }

        Ok(PolicyTables {
            anonymous,
            role_capabilities,
            role_assignment,
            trusted_ranges,
        })
    }
}

fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AuthzError::InvalidConfig(format!("{} name cannot be empty", kind)));
    }
    Ok(())
}

fn validate_names(kind: &str, names: &[String]) -> Result<()> {
    names.iter().try_for_each(|name| validate_name(kind, name))
}

/// Normalized, immutable configuration read by the sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyTables {
    anonymous: HashSet<Capability>,
    role_capabilities: BTreeMap<RoleName, BTreeSet<Capability>>,
    role_assignment: BTreeMap<RoleName, BTreeSet<Username>>,
    trusted_ranges: Vec<TrustedRange>,
}

impl PolicyTables {
    /// Whether `capability` is granted without authentication
    pub fn is_anonymous(&self, capability: &str) -> bool {
        self.anonymous.contains(capability)
    }

    pub fn anonymous_capabilities(&self) -> &HashSet<Capability> {
        &self.anonymous
    }

    /// Role -> capability table, roles in sorted order
    pub fn role_capabilities(&self) -> &BTreeMap<RoleName, BTreeSet<Capability>> {
        &self.role_capabilities
    }

    /// Lower-cased role -> lower-cased members
    pub fn role_assignment(&self) -> &BTreeMap<RoleName, BTreeSet<Username>> {
        &self.role_assignment
    }

    /// Members of a role, looked up case-insensitively
    pub fn role_members(&self, role: &str) -> Option<&BTreeSet<Username>> {
        self.role_assignment.get(&role.to_lowercase())
    }

    pub fn trusted_ranges(&self) -> &[TrustedRange] {
        &self.trusted_ranges
    }

    /// Whether `ip` is inside any trusted range, returning the first match
    pub fn trusted_range_for(&self, ip: &str) -> Option<&TrustedRange> {
        self.trusted_ranges.iter().find(|range| range.contains(ip))
    }

    /// No role assignments at all: membership fails open
    pub fn is_unrestricted(&self) -> bool {
        self.role_assignment.is_empty()
    }

    /// Convert back into raw configuration with every table set
    ///
    /// Normalizing the result yields the same tables.
    pub fn to_config(&self) -> AuthConfig {
        let mut anonymous: Vec<_> = self.anonymous.iter().cloned().collect();
        anonymous.sort();

        AuthConfig {
            anonymous_capabilities: Some(anonymous),
            role_capabilities: Some(
                self.role_capabilities
                    .iter()
                    .map(|(role, caps)| (role.clone(), caps.iter().cloned().collect()))
                    .collect(),
            ),
            role_assignment: Some(
                self.role_assignment
                    .iter()
                    .map(|(role, users)| (role.clone(), users.iter().cloned().collect()))
                    .collect(),
            ),
            admin_ip_ranges: Some(self.trusted_ranges.iter().map(|r| r.to_string()).collect()),
        }
    }
}
