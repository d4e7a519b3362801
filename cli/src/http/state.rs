//! Shared HTTP server state

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use agentbox_core::api::TaskService;
use chrono::{DateTime, Local};

/// Application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: TaskService,
    pub stats: Arc<RwLock<ServerStats>>,
}

impl AppState {
    pub fn new(service: TaskService) -> Self {
        Self {
            service,
            stats: Arc::new(RwLock::new(ServerStats::new())),
        }
    }

    /// Stats are best effort; a poisoned lock still yields the counters.
    pub fn stats_mut(&self) -> RwLockWriteGuard<'_, ServerStats> {
        self.stats.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn record_request(&self, endpoint: &str) {
        self.stats_mut().increment_request(endpoint);
    }

    pub fn record_error(&self) {
        self.stats_mut().increment_error();
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let stats = self.stats.read().unwrap_or_else(|e| e.into_inner());
        StatsSnapshot {
            uptime_seconds: stats.uptime_seconds(),
            requests_total: stats.requests_total,
            errors_total: stats.errors_total,
            requests_by_endpoint: stats
                .requests_by_endpoint
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
        }
    }
}

/// Point-in-time copy of the counters, detached from the lock.
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub uptime_seconds: f64,
    pub requests_total: u64,
    pub errors_total: u64,
    pub requests_by_endpoint: BTreeMap<String, u64>,
}

/// Server statistics
pub struct ServerStats {
    pub requests_total: u64,
    pub requests_by_endpoint: HashMap<String, u64>,
    pub errors_total: u64,
    pub start_time: DateTime<Local>,
}

impl ServerStats {
    pub fn new() -> Self {
        Self {
            requests_total: 0,
            requests_by_endpoint: HashMap::new(),
            errors_total: 0,
            start_time: Local::now(),
        }
    }

    pub fn increment_request(&mut self, endpoint: &str) {
        self.requests_total += 1;
        *self
            .requests_by_endpoint
            .entry(endpoint.to_string())
            .or_insert(0) += 1;
    }

    pub fn increment_error(&mut self) {
        self.errors_total += 1;
    }

    pub fn uptime_seconds(&self) -> f64 {
        let now = Local::now();
        (now - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_requests_per_endpoint() {
        let mut stats = ServerStats::new();
        stats.increment_request("/schedule");
        stats.increment_request("/schedule");
        stats.increment_request("/tasks");
        stats.increment_error();

        assert_eq!(stats.requests_total, 3);
        assert_eq!(stats.requests_by_endpoint.get("/schedule"), Some(&2));
        assert_eq!(stats.errors_total, 1);
        assert!(stats.uptime_seconds() < 1.0);
    }
}
