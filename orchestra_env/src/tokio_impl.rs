//! Production clock implementation backed by Tokio.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::Clock;

/// Clock backed by `tokio::time`.
///
/// Under `#[tokio::test(start_paused = true)]` this clock is fully
/// deterministic: sleeps auto-advance the paused runtime clock.
#[derive(Debug, Default)]
pub struct TokioClock;

impl TokioClock {
    /// Creates a new TokioClock.
    pub fn new() -> Self {
        Self
    }

    /// Creates an Arc-wrapped clock for sharing across tasks.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn sleep_until(&self, deadline: Instant) {
        tokio::time::sleep_until(deadline).await;
    }
}
