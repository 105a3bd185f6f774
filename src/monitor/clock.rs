use async_trait::async_trait;
use std::time::Duration;

/// Seam between the countdown and wall-clock time. Production sleeps on
/// the tokio timer; tests inject a manually-advanced clock so tick
/// behavior is deterministic.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
