//! Monotonic deadline used for cooldowns.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    deadline: Instant,
}

impl Timer {
    /// A timer that elapses `duration` from now.
    pub fn new(duration: Duration) -> Self {
        Self {
            deadline: Instant::now() + duration,
        }
    }

    /// A timer that has already elapsed.
    pub fn elapsed_now() -> Self {
        Self {
            deadline: Instant::now(),
        }
    }

    pub fn reset(&mut self, duration: Duration) {
        self.deadline = Instant::now() + duration;
    }

    pub fn elapsed(&self) -> bool {
        Instant::now() >= self.deadline
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_timer_is_pending_until_reset_to_zero() {
        let mut timer = Timer::new(Duration::from_secs(60));
        assert!(!timer.elapsed());
        assert!(timer.remaining() > Duration::from_secs(59));

        timer.reset(Duration::ZERO);
        assert!(timer.elapsed());
        assert_eq!(timer.remaining(), Duration::ZERO);
    }

    #[test]
    fn elapsed_now_fires_immediately() {
        assert!(Timer::elapsed_now().elapsed());
    }
}
