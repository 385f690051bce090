//! Inter-request pacing.
//!
//! After a unit of work (an item or a whole batch) the controller pauses for a
//! fixed delay, but only when that work reached the network. Cache hits cost
//! nothing, so a fully cached re-run completes without waiting.

use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RateController {
    delay: Duration,
}

impl RateController {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// The pause owed after work that did (`hit_network = true`) or did not touch the network.
    pub fn delay_for(&self, hit_network: bool) -> Duration {
        if hit_network {
            self.delay
        } else {
            Duration::ZERO
        }
    }

    /// Suspend for the pause owed, if any.
    pub async fn pace(&self, hit_network: bool) {
        let d = self.delay_for(hit_network);
        if !d.is_zero() {
            tracing::trace!("pacing for {:?}", d);
            tokio::time::sleep(d).await;
        }
    }
}
