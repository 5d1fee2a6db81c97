use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    domain::{BarColor, BarId, ObserverId},
    protocol::BossEvent,
};
use thiserror::Error;

mod bar;
mod observer;
mod players;

pub use bar::BossBar;
pub use observer::ChannelObserver;
pub use players::PlayerBossBars;

/// A subscriber (usually a connected client) that receives boss bar packets.
pub trait Observer: Send + Sync {
    fn id(&self) -> ObserverId;
    fn is_connected(&self) -> bool;
    fn send(&self, event: BossEvent) -> Result<(), ObserverError>;
}

pub type ObserverHandle = Arc<dyn Observer>;

#[derive(Debug, Error)]
pub enum ObserverError {
    #[error("observer {0} is disconnected")]
    Disconnected(ObserverId),
    #[error("observer {observer_id} rejected packet: {reason}")]
    Rejected {
        observer_id: ObserverId,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("boss bar {0} is closed")]
    Closed(BarId),
}

/// Mutation contract an animation drives.
///
/// `detach_observers` and `attach_observers` notify each observer on its own;
/// a failing observer is skipped and never fails the batch.
#[async_trait]
pub trait Target: Send + Sync {
    fn identity(&self) -> BarId;

    /// Values outside `0..=100` are clamped.
    async fn set_percentage(&self, value: i64) -> Result<(), TargetError>;

    async fn set_color(&self, color: BarColor) -> Result<(), TargetError>;

    /// Snapshot of the current observers, not a live view.
    fn observers(&self) -> Vec<ObserverHandle>;

    async fn detach_observers(&self, observers: &[ObserverHandle]) -> Result<(), TargetError>;

    async fn attach_observers(&self, observers: &[ObserverHandle]) -> Result<(), TargetError>;
}
