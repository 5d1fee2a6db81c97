use std::sync::Arc;

use shared::{domain::ObserverId, protocol::BossEvent};
use tokio::sync::mpsc;

use crate::{Observer, ObserverError, ObserverHandle};

/// Observer that forwards packets into an unbounded channel. It reports itself
/// disconnected once the receiving half is dropped.
pub struct ChannelObserver {
    id: ObserverId,
    tx: mpsc::UnboundedSender<BossEvent>,
}

impl ChannelObserver {
    pub fn new(id: ObserverId) -> (Self, mpsc::UnboundedReceiver<BossEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { id, tx }, rx)
    }

    pub fn handle(id: ObserverId) -> (ObserverHandle, mpsc::UnboundedReceiver<BossEvent>) {
        let (observer, rx) = Self::new(id);
        (Arc::new(observer), rx)
    }
}

impl Observer for ChannelObserver {
    fn id(&self) -> ObserverId {
        self.id
    }

    fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }

    fn send(&self, event: BossEvent) -> Result<(), ObserverError> {
        self.tx
            .send(event)
            .map_err(|_| ObserverError::Disconnected(self.id))
    }
}
