//! Request pacing for the lookup service.
//!
//! Sequential runs pause a fixed time after every chunk. Concurrent runs share
//! a [`RequestGate`] that spaces request starts, so the aggregate rate stays
//! the same however many requests are in flight.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Delay between chunk requests unless configured otherwise
pub const DEFAULT_SLEEP: Duration = Duration::from_secs(3);

/// Unconditional pause between sequential chunks
#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    delay: Duration,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub async fn pause(&self) {
        if self.delay.is_zero() {
            return;
        }
        debug!(delay_ms = self.delay.as_millis() as u64, "Pausing before next chunk");
        tokio::time::sleep(self.delay).await;
    }
}

/// Shared gate granting at most one request start per interval
#[derive(Debug)]
pub struct RequestGate {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RequestGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Wait for this caller's start slot.
    pub async fn acquire(&self) {
        let wait_until = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(t) if t > now => t,
                _ => now,
            };
            *next = Some(slot + self.interval);
            slot
        };

        tokio::time::sleep_until(wait_until).await;
    }
}
