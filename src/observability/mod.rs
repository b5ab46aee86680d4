//! Observability sink
//!
//! A small injected metrics collector modeled as plain atomic counters.
//! The service increments these on the call path; an exporter (or nothing
//! at all) reads them via [`CallMetrics::snapshot`]. Structured logging is
//! handled separately through `tracing`.

use std::sync::atomic::{AtomicU64, Ordering};

/// Per-process call counters with static labels baked into the field names.
#[derive(Debug, Default)]
pub struct CallMetrics {
    /// Total RPCs that reached the service (authorized or not)
    calls: AtomicU64,
    /// Calls rejected by the authorization interceptor
    auth_rejections: AtomicU64,
    /// Matches emitted across all MakeMatches streams
    matches_made: AtomicU64,
    /// Backfill proposals emitted across all BackfillMatches streams
    proposals_made: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub calls: u64,
    pub auth_rejections: u64,
    pub matches_made: u64,
    pub proposals_made: u64,
}

impl CallMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_call(&self, method: &str) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(method, "grpc call");
    }

    pub fn record_auth_rejection(&self) {
        self.auth_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_match(&self) {
        self.matches_made.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_proposal(&self) {
        self.proposals_made.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            calls: self.calls.load(Ordering::Relaxed),
            auth_rejections: self.auth_rejections.load(Ordering::Relaxed),
            matches_made: self.matches_made.load(Ordering::Relaxed),
            proposals_made: self.proposals_made.load(Ordering::Relaxed),
        }
    }
}
