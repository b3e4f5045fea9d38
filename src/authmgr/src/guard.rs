//! Guards for the host's interception points
//!
//! The host calls these before performing a sensitive action. A denial is
//! returned as [`AuthzError::AccessDenied`] so `?` stops the action; the
//! attached [`Denial`] tells the host how to answer the caller.

use crate::engine::Authorizer;
use crate::error::{AuthzError, Result};
use crate::types::{BuiltinCapability, RequestContext};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Query parameter the host appends when redirecting after a denial
pub const ACCESS_DENIED_QUERY: &str = "access=denied";

/// Notice shown on the admin page after an access-denied redirect
pub const ACCESS_DENIED_NOTICE: &str = "Access Denied";

/// Body of the plain 403 for callers who cannot see the admin interface
pub const FORBIDDEN_MESSAGE: &str = "Require permissions to show admin interface.";

/// How the host should answer a refused request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Denial {
    /// Plain `403 Forbidden`: the caller cannot even see the admin interface
    Forbidden,
    /// `302` back to the admin page with [`ACCESS_DENIED_QUERY`]
    AccessDenied,
    /// JSON failure body for an AJAX action, see [`AjaxDenial`]
    Ajax,
}

impl Denial {
    /// HTTP status the host should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Forbidden | Self::Ajax => 403,
            Self::AccessDenied => 302,
        }
    }

    /// Message for the caller
    pub fn message(&self) -> &'static str {
        match self {
            Self::Forbidden => FORBIDDEN_MESSAGE,
            Self::AccessDenied | Self::Ajax => ACCESS_DENIED_NOTICE,
        }
    }

    pub fn ajax_body(&self) -> Option<AjaxDenial> {
        match self {
            Self::Ajax => Some(AjaxDenial::default()),
            _ => None,
        }
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forbidden => write!(f, "forbidden"),
            Self::AccessDenied => write!(f, "redirect with {}", ACCESS_DENIED_QUERY),
            Self::Ajax => write!(f, "ajax failure"),
        }
    }
}

/// JSON answer to a refused AJAX action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AjaxDenial {
    pub status: String,
    pub code: String,
    pub message: String,
    #[serde(rename = "errorCode")]
    pub error_code: String,
}

impl Default for AjaxDenial {
    fn default() -> Self {
        Self {
            status: "fail".to_string(),
            code: "error:authorization".to_string(),
            message: ACCESS_DENIED_NOTICE.to_string(),
            error_code: "403".to_string(),
        }
    }
}

/// Host entry points that are guarded as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuardedEntry {
    /// Statistics page of a short URL
    StatsPage,
    /// Any API call
    Api,
    /// Any admin page load after successful authentication
    AdminPage,
}

impl GuardedEntry {
    pub fn capability(&self) -> BuiltinCapability {
        match self {
            Self::StatsPage => BuiltinCapability::ViewStats,
            Self::Api => BuiltinCapability::Api,
            Self::AdminPage => BuiltinCapability::ShowAdmin,
        }
    }
}

/// Capability required by an admin action keyword
pub fn capability_for_action(action: &str) -> Option<BuiltinCapability> {
    match action {
        "add" => Some(BuiltinCapability::AddUrl),
        "delete" => Some(BuiltinCapability::DeleteUrl),
        "edit_display" | "edit_save" => Some(BuiltinCapability::EditUrl),
        "activate" | "deactivate" => Some(BuiltinCapability::ManagePlugins),
        _ => None,
    }
}

/// Notice to show for the host's `access` query parameter
pub fn access_notice(access_param: Option<&str>) -> Option<&'static str> {
    match access_param {
        Some("denied") => Some(ACCESS_DENIED_NOTICE),
        _ => None,
    }
}

/// An action requested from the admin interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdminRequest {
    /// Plugin management page (`plugin` parameter present)
    PluginManagement { action: String },
    /// AJAX action such as add, edit or delete
    Ajax { action: String },
}

impl AdminRequest {
    pub fn action(&self) -> &str {
        match self {
            Self::PluginManagement { action } | Self::Ajax { action } => action,
        }
    }
}

impl Authorizer {
    /// Refuse the action unless `capability` is granted
    ///
    /// Callers who also lack `ShowAdmin` get [`Denial::Forbidden`]; everyone
    /// else is sent back to the admin interface with [`Denial::AccessDenied`].
    pub fn require_capability(&self, capability: &str, request: &RequestContext) -> Result<()> {
        if self.has_capability(capability, request)? {
            return Ok(());
        }

        let denial = if self.has_capability(BuiltinCapability::ShowAdmin.as_str(), request)? {
            Denial::AccessDenied
        } else {
            Denial::Forbidden
        };

        Err(self.denied(capability, denial, request))
    }

    /// Guard a whole host entry point
    pub fn guard_entry(&self, entry: GuardedEntry, request: &RequestContext) -> Result<()> {
        self.require_capability(entry.capability().as_str(), request)
    }

    /// Guard an admin action after the admin page itself was allowed
    ///
    /// Plugin management with an unknown action keyword is let through, as
    /// there is nothing to guard. An unknown AJAX keyword is checked as an
    /// unnamed capability that no table grants.
    pub fn authorize_admin_action(&self, admin: &AdminRequest, request: &RequestContext) -> Result<()> {
        let required = capability_for_action(admin.action());

        match admin {
            AdminRequest::PluginManagement { .. } => {
                let Some(capability) = required else {
                    return Ok(());
                };
                if self.has_capability(capability.as_str(), request)? {
                    Ok(())
                } else {
                    Err(self.denied(capability.as_str(), Denial::AccessDenied, request))
                }
            }
            AdminRequest::Ajax { .. } => {
                let capability = required.map(|c| c.as_str()).unwrap_or("");
                if self.has_capability(capability, request)? {
                    Ok(())
                } else {
                    Err(self.denied(capability, Denial::Ajax, request))
                }
            }
        }
    }

    /// Granted capabilities joined with ", " for an authenticated caller
    pub fn capability_summary(&self, request: &RequestContext) -> Result<Option<String>> {
        if request.user().is_none() {
            return Ok(None);
        }
        Ok(Some(self.enumerate_granted(request)?.join(", ")))
    }

    fn denied(&self, capability: &str, denial: Denial, request: &RequestContext) -> AuthzError {
        info!(
            "Denied '{}' to user={:?} addr={} ({})",
            capability,
            request.user(),
            request.remote_addr,
            denial
        );
        AuthzError::AccessDenied {
            capability: capability.to_string(),
            denial,
        }
    }
}
