use crate::domain::model::RateLimitEntry;
use crate::domain::ports::Clock;
use chrono::Duration;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
    /// Map size above which expired windows are swept out.
    pub max_entries: usize,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::minutes(15),
            max_entries: 10_000,
        }
    }
}

/// Per-IP fixed window counter. A window resets on the first request after it
/// expires. State is local to this process, so it is advisory only when
/// several instances serve traffic.
pub struct RateLimiter {
    policy: RateLimitPolicy,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, RateLimitEntry>>,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_rate_limited(&self, ip: &str) -> bool {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        if entries.len() >= self.policy.max_entries && !entries.contains_key(ip) {
            let window = self.policy.window;
            let before = entries.len();
            entries.retain(|_, entry| now - entry.window_start <= window);
            tracing::debug!(
                "Swept {} expired rate limit entries",
                before - entries.len()
            );
        }

        if let Some(entry) = entries.get_mut(ip) {
            if now - entry.window_start <= self.policy.window {
                if entry.count >= self.policy.max_requests {
                    return true;
                }
                entry.count += 1;
                return false;
            }
        }

        // 無紀錄或視窗已過期：重新開始計數
        entries.insert(
            ip.to_string(),
            RateLimitEntry {
                count: 1,
                window_start: now,
            },
        );
        false
    }

    pub fn entry(&self, ip: &str) -> Option<RateLimitEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(ip).copied()
    }

    pub fn tracked_clients(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
