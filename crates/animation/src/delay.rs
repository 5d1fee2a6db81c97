use std::time::Duration;

use async_trait::async_trait;

/// Suspends the calling task between animation steps.
///
/// A zero delay must still yield to the scheduler rather than complete in
/// place. Dropping the returned future releases any timer it registered.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn delay(&self, millis: u64);
}

/// Delay backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn delay(&self, millis: u64) {
        if millis == 0 {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }
}
