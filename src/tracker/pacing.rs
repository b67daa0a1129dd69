//! Pacing policy applied between two announcements of the same tick

use async_trait::async_trait;
use std::time::Duration;

/// Decides how long to wait after a successful publish
#[async_trait]
pub trait PublishPacer: Send + Sync {
    async fn pause(&self);
}

/// Sleeps for a fixed delay after every publish
#[derive(Debug, Clone)]
pub struct FixedDelayPacer {
    delay: Duration,
}

impl FixedDelayPacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[async_trait]
impl PublishPacer for FixedDelayPacer {
    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// Never waits
#[derive(Debug, Clone, Default)]
pub struct NoDelayPacer;

#[async_trait]
impl PublishPacer for NoDelayPacer {
    async fn pause(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_fixed_delay_pacer_waits() {
        let pacer = FixedDelayPacer::new(Duration::from_millis(20));
        let start = Instant::now();
        pacer.pause().await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_zero_delay_returns_immediately() {
        let pacer = FixedDelayPacer::new(Duration::ZERO);
        let start = Instant::now();
        pacer.pause().await;
        NoDelayPacer.pause().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
