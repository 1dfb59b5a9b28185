//! Fixed-cadence main loop

use std::time::{Duration, Instant};

/// Calls a tick function once per `interval` until it returns false
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    interval: Duration,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Run until `tick` returns false. A tick that overruns the interval is
    /// followed immediately by the next one; missed ticks are not replayed.
    pub fn run<F>(&self, mut tick: F) -> u64
    where
        F: FnMut() -> bool,
    {
        let mut ticks = 0u64;
        loop {
            let started = Instant::now();
            ticks += 1;
            if !tick() {
                break;
            }
            std::thread::sleep(self.interval.saturating_sub(started.elapsed()));
        }
        tracing::debug!(ticks, "Scheduler stopped");
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stops_when_tick_returns_false() {
        let mut remaining = 3;
        let ticks = Scheduler::new(Duration::ZERO).run(|| {
            remaining -= 1;
            remaining > 0
        });
        assert_eq!(ticks, 3);
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_waits_between_ticks() {
        let interval = Duration::from_millis(5);
        let start = Instant::now();
        let mut count = 0;
        Scheduler::new(interval).run(|| {
            count += 1;
            count < 4
        });
        // Three sleeps separate four ticks
        assert!(start.elapsed() >= interval * 3);
    }

    #[test]
    fn test_overrun_does_not_sleep() {
        let start = Instant::now();
        let mut first = true;
        Scheduler::new(Duration::from_millis(1)).run(|| {
            if first {
                std::thread::sleep(Duration::from_millis(20));
                first = false;
                return true;
            }
            false
        });
        assert!(start.elapsed() < Duration::from_millis(200));
    }
}
