//! Clock contract for timers and heartbeats.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

/// Time source for an agent's lease watchdog and heartbeat schedule.
///
/// Agents never call `tokio::time` directly; they go through this trait so
/// tests can run against tokio's paused clock and a future deployment could
/// substitute a virtual one.
///
/// Deadlines are plain [`Instant`]s held by the agent itself: re-arming a
/// watchdog means overwriting the stored instant, which implicitly cancels
/// the previous deadline. There is no separate timer handle to leak.
#[async_trait]
pub trait Clock: Send + Sync + 'static {
    /// Returns the current instant.
    fn now(&self) -> Instant;

    /// Suspends the caller for the given duration.
    async fn sleep(&self, duration: Duration);

    /// Suspends the caller until the given deadline.
    async fn sleep_until(&self, deadline: Instant);
}
