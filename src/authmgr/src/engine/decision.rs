//! Capability decision records

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one capability check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityDecision {
    /// Unique decision ID
    pub id: String,

    /// Capability that was checked
    pub capability: String,

    /// Whether the capability is granted
    pub granted: bool,

    /// Why the decision came out this way
    pub reason: DecisionReason,

    /// Decision timestamp (milliseconds since epoch)
    pub timestamp: i64,
}

impl CapabilityDecision {
    /// A grant made by the named source
    pub fn grant(capability: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(
            capability.into(),
            true,
            DecisionReason::GrantedBy {
                source: source.into(),
            },
        )
    }

    /// A denial: every source ran and none granted
    pub fn deny(capability: impl Into<String>) -> Self {
        Self::new(capability.into(), false, DecisionReason::NoSourceGranted)
    }

    fn new(capability: String, granted: bool, reason: DecisionReason) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            capability,
            granted,
            reason,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Name of the granting source, if any
    pub fn granted_by(&self) -> Option<&str> {
        match &self.reason {
            DecisionReason::GrantedBy { source } => Some(source),
            DecisionReason::NoSourceGranted => None,
        }
    }
}

/// Reason for a capability decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DecisionReason {
    /// A grant source raised the verdict to allow
    GrantedBy { source: String },

    /// The whole chain ran without a grant
    NoSourceGranted,
}
