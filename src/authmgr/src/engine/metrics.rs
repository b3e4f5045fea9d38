//! Decision counters for engine observability

use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Snapshot of engine counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineMetrics {
    /// Total number of capability checks
    pub total_checks: u64,

    /// Checks that were granted
    pub granted: u64,

    /// Checks that were denied
    pub denied: u64,

    /// Grants per source name
    pub grants_by_source: BTreeMap<String, u64>,

    /// Direct role membership queries
    pub role_queries: u64,

    /// Capability enumerations
    pub enumerations: u64,
}

impl EngineMetrics {
    /// Fraction of checks that were granted
    pub fn grant_rate(&self) -> f64 {
        if self.total_checks == 0 {
            0.0
        } else {
            self.granted as f64 / self.total_checks as f64
        }
    }
}

/// Thread-safe metrics collector
#[derive(Debug, Default)]
pub struct MetricsCollector {
    metrics: RwLock<EngineMetrics>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a capability decision and the source that granted it
    pub fn record_decision(&self, granted: bool, source: Option<&str>) {
        let mut metrics = self.metrics.write();
        metrics.total_checks += 1;

        if granted {
            metrics.granted += 1;
            if let Some(source) = source {
                *metrics.grants_by_source.entry(source.to_string()).or_insert(0) += 1;
            }
        } else {
            metrics.denied += 1;
        }
    }

    pub fn record_role_query(&self) {
        self.metrics.write().role_queries += 1;
    }

    pub fn record_enumeration(&self) {
        self.metrics.write().enumerations += 1;
    }

    /// Current counters
    pub fn get_metrics(&self) -> EngineMetrics {
        self.metrics.read().clone()
    }

    pub fn reset(&self) {
        *self.metrics.write() = EngineMetrics::default();
    }
}
