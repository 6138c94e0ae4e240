//! Metrics collection module
//!
//! Tracks query volume, failure kinds and response times.

use crate::error::ErrorKind;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

const RESPONSE_WINDOW: usize = 100;

/// Query metrics collector
pub struct Metrics {
    /// Total query count
    total_queries: AtomicU64,
    /// Queries that returned a response
    successes: AtomicU64,
    /// Failures by kind
    errors: RwLock<HashMap<ErrorKind, u64>>,
    /// Recent response times in ms
    response_times: RwLock<VecDeque<u64>>,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            total_queries: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            errors: RwLock::new(HashMap::new()),
            response_times: RwLock::new(VecDeque::with_capacity(RESPONSE_WINDOW)),
        }
    }

    /// Record a successful query and its latency
    pub fn record_success(&self, time_ms: u64) {
        self.total_queries.fetch_add(1, Ordering::Relaxed);
        self.successes.fetch_add(1, Ordering::Relaxed);

        let mut times = self
            .response_times
            .write()
            .unwrap_or_else(|e| e.into_inner());
        if times.len() >= RESPONSE_WINDOW {
            times.pop_front();
        }
        times.push_back(time_ms);
    }

    /// Record a failed query
    pub fn record_error(&self, kind: ErrorKind) {
        self.total_queries.fetch_add(1, Ordering::Relaxed);
        let mut errors = self.errors.write().unwrap_or_else(|e| e.into_inner());
        *errors.entry(kind).or_insert(0) += 1;
    }

    pub fn total_queries(&self) -> u64 {
        self.total_queries.load(Ordering::Relaxed)
    }

    /// Average over the recent response window
    pub fn avg_response_time(&self) -> Option<u64> {
        let times = self.response_times.read().unwrap_or_else(|e| e.into_inner());
        if times.is_empty() {
            None
        } else {
            Some(times.iter().sum::<u64>() / times.len() as u64)
        }
    }

    /// Percentage of queries that succeeded
    pub fn reliability(&self) -> f64 {
        let total = self.total_queries();
        if total == 0 {
            100.0
        } else {
            (self.successes.load(Ordering::Relaxed) as f64 / total as f64) * 100.0
        }
    }

    pub fn snapshot(&self) -> QueryStats {
        let errors = self.errors.read().unwrap_or_else(|e| e.into_inner());
        QueryStats {
            total_queries: self.total_queries(),
            successes: self.successes.load(Ordering::Relaxed),
            errors: errors.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            avg_response_time_ms: self.avg_response_time(),
            reliability: self.reliability(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of the metrics
#[derive(Debug, Clone, Serialize)]
pub struct QueryStats {
    pub total_queries: u64,
    pub successes: u64,
    pub errors: HashMap<String, u64>,
    pub avg_response_time_ms: Option<u64>,
    pub reliability: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let metrics = Metrics::new();

        metrics.record_success(100);
        metrics.record_success(200);
        metrics.record_error(ErrorKind::Timeout);
        metrics.record_error(ErrorKind::NotInitialized);

        assert_eq!(metrics.total_queries(), 4);
        assert_eq!(metrics.avg_response_time(), Some(150));
        assert_eq!(metrics.reliability(), 50.0);

        let stats = metrics.snapshot();
        assert_eq!(stats.errors.get("timeout"), Some(&1));
        assert_eq!(stats.errors.get("not_initialized"), Some(&1));
    }

    #[test]
    fn test_response_window_is_bounded() {
        let metrics = Metrics::new();
        metrics.record_success(10_000);
        for _ in 0..RESPONSE_WINDOW {
            metrics.record_success(10);
        }
        assert_eq!(metrics.avg_response_time(), Some(10));
    }
}
