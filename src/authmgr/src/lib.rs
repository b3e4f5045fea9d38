//! # authmgr
//!
//! Capability and role resolution engine that sits in front of a host
//! application's action dispatch and decides whether a sensitive action may
//! proceed.
//!
//! ## Features
//!
//! - **Ordered grant chain**: anonymous capabilities, role-derived grants,
//!   trusted network ranges and keyless API calls, composed monotonically
//! - **Pluggable sources**: register extra grant or membership sources at
//!   construction time
//! - **Case-insensitive role membership** with a documented fail-open state
//!   for unconfigured installations
//! - **IPv4 CIDR matching** for trusted administrator networks
//! - **One-time lazy normalization** of the configuration tables
//!
//! ## Example
//!
//! ```rust
//! use authmgr::{AuthConfig, Authorizer, RequestContext};
//!
//! # fn main() -> authmgr::Result<()> {
//! let config = AuthConfig::new()
//!     .with_anonymous_capabilities(["ViewStats"])
//!     .with_role_assignment("Editor", ["Alice"]);
//!
//! let authorizer = Authorizer::from_config(config)?;
//!
//! let alice = RequestContext::authenticated("alice", "203.0.113.5");
//! assert!(authorizer.has_capability("EditURL", &alice)?);
//! assert!(!authorizer.has_capability("ManagePlugins", &alice)?);
//!
//! let visitor = RequestContext::anonymous("203.0.113.9");
//! assert_eq!(authorizer.enumerate_granted(&visitor)?, vec!["ViewStats"]);
//! # Ok(())
//! # }
//! ```

pub mod cidr;
pub mod config;
pub mod engine;
pub mod error;
pub mod grant;
pub mod guard;
pub mod membership;
pub mod types;

// Re-export commonly used types
pub use cidr::TrustedRange;
pub use config::{AuthConfig, PolicyTables};
pub use engine::{Authorizer, AuthorizerBuilder, CapabilityDecision, EngineConfig};
pub use error::{AuthzError, Result};
pub use grant::{GrantChain, GrantContext, GrantSource};
pub use guard::{AdminRequest, Denial, GuardedEntry};
pub use membership::{MembershipResolver, MembershipSource};
pub use types::{BuiltinCapability, BuiltinRole, Capability, RequestContext, RoleName, Username};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
