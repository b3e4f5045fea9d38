//! Core authorization types

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Capability identifier (e.g. "AddURL")
pub type Capability = String;

/// Role identifier (e.g. "Administrator")
pub type RoleName = String;

/// Username as supplied by the host
pub type Username = String;

/// Capabilities the engine knows about, in enumeration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinCapability {
    /// Only display the admin panel
    ShowAdmin,
    #[serde(rename = "AddURL")]
    AddUrl,
    #[serde(rename = "DeleteURL")]
    DeleteUrl,
    #[serde(rename = "EditURL")]
    EditUrl,
    ManagePlugins,
    #[serde(rename = "API")]
    Api,
    ViewStats,
}

impl BuiltinCapability {
    /// Every built-in capability, in declared order
    pub const ALL: [BuiltinCapability; 7] = [
        Self::ShowAdmin,
        Self::AddUrl,
        Self::DeleteUrl,
        Self::EditUrl,
        Self::ManagePlugins,
        Self::Api,
        Self::ViewStats,
    ];

    /// Wire name of the capability
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShowAdmin => "ShowAdmin",
            Self::AddUrl => "AddURL",
            Self::DeleteUrl => "DeleteURL",
            Self::EditUrl => "EditURL",
            Self::ManagePlugins => "ManagePlugins",
            Self::Api => "API",
            Self::ViewStats => "ViewStats",
        }
    }

    /// Names of every built-in capability, in declared order
    pub fn names() -> Vec<Capability> {
        Self::ALL.iter().map(|c| c.as_str().to_string()).collect()
    }
}

impl fmt::Display for BuiltinCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<BuiltinCapability> for Capability {
    fn from(capability: BuiltinCapability) -> Self {
        capability.as_str().to_string()
    }
}

/// Roles shipped in the default role table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinRole {
    Administrator,
    Editor,
    Contributor,
}

impl BuiltinRole {
    pub const ALL: [BuiltinRole; 3] = [Self::Administrator, Self::Editor, Self::Contributor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Administrator => "Administrator",
            Self::Editor => "Editor",
            Self::Contributor => "Contributor",
        }
    }

    /// Capabilities this role carries in the default table
    pub fn default_capabilities(&self) -> &'static [BuiltinCapability] {
        use BuiltinCapability::*;
        match self {
            Self::Administrator => &BuiltinCapability::ALL,
            Self::Editor => &[ShowAdmin, AddUrl, EditUrl, DeleteUrl, ViewStats],
            Self::Contributor => &[ShowAdmin, AddUrl, ViewStats],
        }
    }
}

impl fmt::Display for BuiltinRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The role table used when the configuration does not supply one
pub fn default_role_capabilities() -> BTreeMap<RoleName, BTreeSet<Capability>> {
    BuiltinRole::ALL
        .iter()
        .map(|role| {
            let caps = role
                .default_capabilities()
                .iter()
                .map(|c| c.as_str().to_string())
                .collect();
            (role.as_str().to_string(), caps)
        })
        .collect()
}

/// Per-request facts supplied by the host application
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RequestContext {
    /// Whether the host authenticated a user for this request
    #[serde(default)]
    pub authenticated: bool,

    /// Authenticated username (meaningful only when `authenticated`)
    #[serde(default)]
    pub username: Option<Username>,

    /// Caller IP address as text
    #[serde(default)]
    pub remote_addr: String,

    /// Machine/API request rather than an interactive one
    #[serde(default)]
    pub api_mode: bool,

    /// The request names a user explicitly (e.g. a `username` parameter)
    #[serde(default)]
    pub has_username_param: bool,
}

impl RequestContext {
    /// Unauthenticated caller from `remote_addr`
    pub fn anonymous(remote_addr: impl Into<String>) -> Self {
        Self {
            remote_addr: remote_addr.into(),
            ..Default::default()
        }
    }

    /// Authenticated caller from `remote_addr`
    pub fn authenticated(username: impl Into<String>, remote_addr: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            username: Some(username.into()),
            remote_addr: remote_addr.into(),
            ..Default::default()
        }
    }

    /// Mark the request as an API call
    pub fn with_api_mode(mut self, has_username_param: bool) -> Self {
        self.api_mode = true;
        self.has_username_param = has_username_param;
        self
    }

    /// Username of an authenticated caller, `None` otherwise
    ///
    /// An authenticated caller without a username is the empty name, the
    /// same caller as `RequestContext::authenticated("", ..)`.
    pub fn user(&self) -> Option<&str> {
        if self.authenticated {
            Some(self.username.as_deref().unwrap_or(""))
        } else {
            None
        }
    }
}
