use serde::{Deserialize, Serialize};

use crate::domain::{BarColor, BarId};

/// Boss bar packets delivered to observers. `health_percent` is a fraction in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum BossEvent {
    Show {
        bar_id: BarId,
        title: String,
        health_percent: f32,
        darken_screen: bool,
        color: BarColor,
    },
    Hide {
        bar_id: BarId,
    },
    Title {
        bar_id: BarId,
        title: String,
    },
    HealthPercent {
        bar_id: BarId,
        health_percent: f32,
    },
}

impl BossEvent {
    pub fn bar_id(&self) -> BarId {
        match self {
            BossEvent::Show { bar_id, .. }
            | BossEvent::Hide { bar_id }
            | BossEvent::Title { bar_id, .. }
            | BossEvent::HealthPercent { bar_id, .. } => *bar_id,
        }
    }
}
