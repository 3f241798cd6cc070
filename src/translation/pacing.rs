/*!
 * Request pacing for the remote completion service.
 *
 * The remote service is rate limited, so document translation runs one call
 * at a time with a fixed delay before each call and an extra pause after
 * every `batch_size` successful units.
 */

use std::time::Duration;

/// Pacing parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    /// Delay before every translation call
    pub delay_per_call: Duration,
    /// Successful units between extra pauses (0 disables them)
    pub batch_size: usize,
    /// Extra pause after each completed batch
    pub batch_delay: Duration,
}

impl PacingPolicy {
    pub fn new(delay_per_call: Duration, batch_size: usize, batch_delay: Duration) -> Self {
        Self {
            delay_per_call,
            batch_size,
            batch_delay,
        }
    }

    /// No delays at all; the caller is paced only by call latency
    pub fn unthrottled() -> Self {
        Self::new(Duration::ZERO, 0, Duration::ZERO)
    }
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), 10, Duration::from_secs(1))
    }
}

/// Counters describing the delays a `Pacer` applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacingStats {
    /// Per-call delays applied
    pub call_delays: usize,
    /// Extra batch pauses applied
    pub batch_pauses: usize,
    /// Total time spent sleeping
    pub total_delay: Duration,
}

/// Stateful limiter driven by the orchestration loop
#[derive(Debug)]
pub struct Pacer {
    policy: PacingPolicy,
    successes: usize,
    stats: PacingStats,
}

impl Pacer {
    pub fn new(policy: PacingPolicy) -> Self {
        Self {
            policy,
            successes: 0,
            stats: PacingStats::default(),
        }
    }

    /// Wait before issuing the next call
    pub async fn before_call(&mut self) {
        self.stats.call_delays += 1;
        self.pause(self.policy.delay_per_call).await;
    }

    /// Record a successfully processed unit, pausing after each full batch
    pub async fn after_success(&mut self) {
        self.successes += 1;
        if self.policy.batch_size > 0 && self.successes % self.policy.batch_size == 0 {
            self.stats.batch_pauses += 1;
            self.pause(self.policy.batch_delay).await;
        }
    }

    pub fn stats(&self) -> PacingStats {
        self.stats
    }

    async fn pause(&mut self, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        self.stats.total_delay += delay;
        tokio::time::sleep(delay).await;
    }
}
