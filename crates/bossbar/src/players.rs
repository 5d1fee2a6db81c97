use std::{collections::HashMap, sync::Arc};

use shared::domain::ObserverId;

use crate::BossBar;

/// One bar per observer, for cases where every player sees their own bar.
#[derive(Default)]
pub struct PlayerBossBars {
    bars: HashMap<ObserverId, Arc<BossBar>>,
}

impl PlayerBossBars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bar previously assigned to `observer_id`, if any.
    pub fn insert(&mut self, observer_id: ObserverId, bar: Arc<BossBar>) -> Option<Arc<BossBar>> {
        self.bars.insert(observer_id, bar)
    }

    pub fn remove(&mut self, observer_id: ObserverId) -> Option<Arc<BossBar>> {
        self.bars.remove(&observer_id)
    }

    pub fn get(&self, observer_id: ObserverId) -> Option<&Arc<BossBar>> {
        self.bars.get(&observer_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ObserverId, &Arc<BossBar>)> {
        self.bars.iter()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}
