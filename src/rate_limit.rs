use std::time::{Duration, Instant};

use dashmap::DashMap;

const MAX_FAILURES: u32 = 5;
const WINDOW: Duration = Duration::from_secs(15 * 60);

/// Per-username login brute force limiter.
pub struct LoginRateLimiter {
    /// lowercased username -> (failed_count, window_start)
    entries: DashMap<String, (u32, Instant)>,
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Whether another attempt is allowed. Returns the seconds left in the
    /// window when blocked. Does not count the attempt itself.
    pub fn check(&self, username: &str) -> Result<(), u64> {
        let Some(entry) = self.entries.get(&username.to_lowercase()) else {
            return Ok(());
        };
        let (count, start) = *entry.value();
        let elapsed = start.elapsed();

        if elapsed > WINDOW || count < MAX_FAILURES {
            return Ok(());
        }
        Err(WINDOW.saturating_sub(elapsed).as_secs())
    }

    pub fn record_failure(&self, username: &str) {
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(username.to_lowercase())
            .or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > WINDOW {
            *count = 1;
            *start = now;
        } else {
            *count += 1;
        }
    }

    pub fn clear(&self, username: &str) {
        self.entries.remove(&username.to_lowercase());
    }

    pub fn cleanup(&self) {
        self.entries.retain(|_, (_, start)| start.elapsed() < WINDOW);
    }
}
