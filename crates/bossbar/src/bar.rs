use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use async_trait::async_trait;
use shared::{
    domain::{BarColor, BarId, ObserverId},
    protocol::BossEvent,
};
use tracing::{debug, warn};

use crate::{ObserverHandle, Target, TargetError};

static NEXT_BAR_ID: AtomicU64 = AtomicU64::new(0);

const MAX_PERCENTAGE: f32 = 100.0;

struct BarState {
    title: String,
    sub_title: String,
    percentage: f32,
    color: BarColor,
    /// Kept in the order observers were added.
    observers: Vec<ObserverHandle>,
    closed: bool,
}

/// A boss bar shown to a set of observers.
///
/// Creating a bar sends nothing; packets only go out once observers are added.
/// Every mutation is broadcast to the registered observers, one observer at a
/// time, yielding to the runtime between sends.
pub struct BossBar {
    id: BarId,
    darken_screen: bool,
    state: Mutex<BarState>,
}

impl BossBar {
    pub fn new(darken_screen: bool) -> Self {
        Self {
            id: BarId(NEXT_BAR_ID.fetch_add(1, Ordering::Relaxed)),
            darken_screen,
            state: Mutex::new(BarState {
                title: String::new(),
                sub_title: String::new(),
                percentage: MAX_PERCENTAGE,
                color: BarColor::default(),
                observers: Vec::new(),
                closed: false,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, BarState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> BarId {
        self.id
    }

    pub fn is_darken_screen(&self) -> bool {
        self.darken_screen
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    pub fn title(&self) -> String {
        self.state().title.clone()
    }

    pub fn sub_title(&self) -> String {
        self.state().sub_title.clone()
    }

    /// Title followed by a blank line and the subtitle, when there is one.
    pub fn full_title(&self) -> String {
        Self::compose_title(&self.state())
    }

    fn compose_title(state: &BarState) -> String {
        if state.sub_title.is_empty() {
            state.title.clone()
        } else {
            format!("{}\n\n{}", state.title, state.sub_title)
        }
    }

    /// Current fill in `0.0..=100.0`.
    pub fn percentage(&self) -> f32 {
        self.state().percentage
    }

    /// Current fill as sent on the wire, in `0.0..=1.0`.
    pub fn health_fraction(&self) -> f32 {
        self.state().percentage / MAX_PERCENTAGE
    }

    pub fn color(&self) -> BarColor {
        self.state().color
    }

    pub fn observer_count(&self) -> usize {
        self.state().observers.len()
    }

    pub fn has_observer(&self, observer_id: ObserverId) -> bool {
        Self::position(&self.state(), observer_id).is_some()
    }

    pub async fn set_title(&self, title: impl Into<String>) -> Result<(), TargetError> {
        let (observers, event) = {
            let mut state = self.open_state()?;
            state.title = title.into();
            (Self::registered(&state), self.title_event(&state))
        };
        self.broadcast(&observers, event).await;
        Ok(())
    }

    pub async fn set_sub_title(&self, sub_title: impl Into<String>) -> Result<(), TargetError> {
        let (observers, event) = {
            let mut state = self.open_state()?;
            state.sub_title = sub_title.into();
            (Self::registered(&state), self.title_event(&state))
        };
        self.broadcast(&observers, event).await;
        Ok(())
    }

    pub async fn add_observer(&self, observer: ObserverHandle) -> Result<(), TargetError> {
        let event = {
            let mut state = self.open_state()?;
            if Self::position(&state, observer.id()).is_some() {
                return Ok(());
            }
            state.observers.push(Arc::clone(&observer));
            self.show_event(&state)
        };
        self.broadcast(std::slice::from_ref(&observer), event).await;
        Ok(())
    }

    pub async fn add_observers(&self, observers: &[ObserverHandle]) -> Result<(), TargetError> {
        for observer in observers {
            self.add_observer(Arc::clone(observer)).await?;
        }
        Ok(())
    }

    /// Unregisters the observer and hides the bar from it. Unknown observers are ignored.
    pub async fn remove_observer(&self, observer_id: ObserverId) {
        let removed = {
            let mut state = self.state();
            Self::position(&state, observer_id).map(|index| state.observers.remove(index))
        };
        let Some(observer) = removed else {
            debug!(
                bar_id = self.id.0,
                observer_id = observer_id.0,
                "bossbar: removed observer that was not added"
            );
            return;
        };
        self.broadcast(&[observer], self.hide_event()).await;
    }

    pub async fn remove_observers(&self, observer_ids: &[ObserverId]) {
        for observer_id in observer_ids {
            self.remove_observer(*observer_id).await;
        }
    }

    pub async fn remove_all_observers(&self) {
        let observers = Self::registered(&self.state());
        for observer in observers {
            self.remove_observer(observer.id()).await;
        }
    }

    /// Hides the bar without unregistering the observers.
    pub async fn hide_from(&self, observers: &[ObserverHandle]) {
        self.broadcast(observers, self.hide_event()).await;
    }

    pub async fn hide_from_all(&self) {
        let observers = Self::registered(&self.state());
        self.hide_from(&observers).await;
    }

    /// Shows the bar with its current state without registering the observers.
    pub async fn show_to(&self, observers: &[ObserverHandle]) {
        let event = self.show_event(&self.state());
        self.broadcast(observers, event).await;
    }

    pub async fn show_to_all(&self) {
        let observers = Self::registered(&self.state());
        self.show_to(&observers).await;
    }

    /// Hides the bar from everyone and rejects any further mutation.
    pub async fn close(&self) {
        let observers = {
            let mut state = self.state();
            if state.closed {
                return;
            }
            state.closed = true;
            std::mem::take(&mut state.observers)
        };
        debug!(
            bar_id = self.id.0,
            observers = observers.len(),
            "bossbar: closing"
        );
        self.broadcast(&observers, self.hide_event()).await;
    }

    fn open_state(&self) -> Result<MutexGuard<'_, BarState>, TargetError> {
        let state = self.state();
        if state.closed {
            return Err(TargetError::Closed(self.id));
        }
        Ok(state)
    }

    fn registered(state: &BarState) -> Vec<ObserverHandle> {
        state.observers.clone()
    }

    fn position(state: &BarState, observer_id: ObserverId) -> Option<usize> {
        state
            .observers
            .iter()
            .position(|observer| observer.id() == observer_id)
    }

    fn show_event(&self, state: &BarState) -> BossEvent {
        BossEvent::Show {
            bar_id: self.id,
            title: Self::compose_title(state),
            health_percent: state.percentage / MAX_PERCENTAGE,
            darken_screen: self.darken_screen,
            color: state.color,
        }
    }

    fn hide_event(&self) -> BossEvent {
        BossEvent::Hide { bar_id: self.id }
    }

    fn title_event(&self, state: &BarState) -> BossEvent {
        BossEvent::Title {
            bar_id: self.id,
            title: Self::compose_title(state),
        }
    }

    async fn broadcast(&self, observers: &[ObserverHandle], event: BossEvent) {
        for observer in observers {
            if !observer.is_connected() {
                continue;
            }
            if let Err(error) = observer.send(event.clone()) {
                warn!(
                    bar_id = self.id.0,
                    observer_id = observer.id().0,
                    %error,
                    "bossbar: packet dispatch failed, skipping observer"
                );
            }
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl Target for BossBar {
    fn identity(&self) -> BarId {
        self.id
    }

    async fn set_percentage(&self, value: i64) -> Result<(), TargetError> {
        let (observers, event) = {
            let mut state = self.open_state()?;
            state.percentage = value.clamp(0, 100) as f32;
            (
                Self::registered(&state),
                BossEvent::HealthPercent {
                    bar_id: self.id,
                    health_percent: state.percentage / MAX_PERCENTAGE,
                },
            )
        };
        self.broadcast(&observers, event).await;
        Ok(())
    }

    async fn set_color(&self, color: BarColor) -> Result<(), TargetError> {
        let (observers, event) = {
            let mut state = self.open_state()?;
            state.color = color;
            (Self::registered(&state), self.show_event(&state))
        };
        self.broadcast(&observers, event).await;
        Ok(())
    }

    fn observers(&self) -> Vec<ObserverHandle> {
        Self::registered(&self.state())
    }

    async fn detach_observers(&self, observers: &[ObserverHandle]) -> Result<(), TargetError> {
        drop(self.open_state()?);
        for observer in observers {
            self.remove_observer(observer.id()).await;
        }
        Ok(())
    }

    async fn attach_observers(&self, observers: &[ObserverHandle]) -> Result<(), TargetError> {
        drop(self.open_state()?);
        self.add_observers(observers).await
    }
}

impl fmt::Display for BossBar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        write!(
            f,
            "BossBar id={} observers={} title={:?} sub_title={:?} percentage={} color={}",
            self.id,
            state.observers.len(),
            state.title,
            state.sub_title,
            state.percentage,
            state.color
        )
    }
}

#[cfg(test)]
#[path = "tests/bar_tests.rs"]
mod tests;
