//! Bounded condition polling.

use std::thread;
use std::time::{Duration, Instant};

/// Poll settings for [`wait_until`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Give up after this long.
    pub timeout: Duration,
    /// First sleep between polls.
    pub poll: Duration,
    /// Backoff ceiling for the sleep between polls.
    pub max_poll: Duration,
}

impl WaitConfig {
    pub const fn new(timeout: Duration, poll: Duration, max_poll: Duration) -> Self {
        Self {
            timeout,
            poll,
            max_poll,
        }
    }

    /// Same poll cadence with a different timeout.
    pub const fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(1_000),
            Duration::from_millis(100),
            Duration::from_millis(400),
        )
    }
}

/// Block until `condition` holds or the timeout passes.
///
/// The condition is checked at least once, and once more at the deadline.
/// The sleep between polls doubles up to `max_poll`. Returns whether the
/// condition was observed to hold.
pub fn wait_until<F: FnMut() -> bool>(config: &WaitConfig, mut condition: F) -> bool {
    let deadline = Instant::now() + config.timeout;
    let mut interval = config.poll;
    loop {
        if condition() {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        thread::sleep(interval.min(deadline - now));
        interval = interval.saturating_mul(2).min(config.max_poll.max(config.poll));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast(timeout_ms: u64) -> WaitConfig {
        WaitConfig::new(
            Duration::from_millis(timeout_ms),
            Duration::from_millis(1),
            Duration::from_millis(4),
        )
    }

    #[test]
    fn returns_true_once_condition_holds() {
        let mut polls = 0;
        let ok = wait_until(&fast(1_000), || {
            polls += 1;
            polls >= 3
        });
        assert!(ok);
        assert_eq!(polls, 3);
    }

    #[test]
    fn times_out_within_bound() {
        let started = Instant::now();
        let ok = wait_until(&fast(30), || false);
        assert!(!ok);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(30));
        assert!(elapsed < Duration::from_millis(500));
    }

    #[test]
    fn zero_timeout_checks_once() {
        let mut polls = 0;
        let ok = wait_until(&fast(0), || {
            polls += 1;
            false
        });
        assert!(!ok);
        assert_eq!(polls, 1);
    }
}
