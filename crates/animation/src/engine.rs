use std::{
    future::Future,
    sync::{Arc, Mutex, PoisonError},
};

use bossbar::{Target, TargetError};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use shared::domain::{BarColor, BarId};
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, warn};

use crate::{
    delay::{Delay, TokioDelay},
    registry::AnimationRegistry,
};

/// How an animation call ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationOutcome {
    /// Every step ran.
    Completed,
    /// The target was already animating; nothing was touched.
    Skipped,
}

impl AnimationOutcome {
    pub fn started(self) -> bool {
        matches!(self, AnimationOutcome::Completed)
    }
}

#[derive(Debug, Error)]
pub enum AnimationError {
    #[error("invalid animation parameter: {0}")]
    InvalidParameter(String),
    #[error("target {bar_id} rejected mutation: {source}")]
    Mutation {
        bar_id: BarId,
        #[source]
        source: TargetError,
    },
    #[error("step callback for target {bar_id} failed: {source}")]
    Callback {
        bar_id: BarId,
        #[source]
        source: anyhow::Error,
    },
    #[error("animation task did not finish: {0}")]
    Join(#[from] JoinError),
}

/// Value handed to the step callback of [`Animator::run`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepValue {
    Percentage(i64),
    Color(BarColor),
}

/// An animation routine with its parameters, for callers that pick the routine at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Animation {
    Ascend { current: i64, max: i64, step: i64 },
    Descend { current: i64, min: i64, step: i64 },
    Pulse { current: i64, max: i64, step: i64 },
    CycleColor { colors: Vec<BarColor> },
    CycleColorRandom { colors: Vec<BarColor> },
}

impl Animation {
    pub fn name(&self) -> &'static str {
        match self {
            Animation::Ascend { .. } => "ascend",
            Animation::Descend { .. } => "descend",
            Animation::Pulse { .. } => "pulse",
            Animation::CycleColor { .. } => "cycle_color",
            Animation::CycleColorRandom { .. } => "cycle_color_random",
        }
    }
}

/// Handle to an animation running as its own tokio task.
///
/// Aborting the task or dropping the runtime releases the target's claim.
pub struct AnimationTask {
    handle: JoinHandle<Result<AnimationOutcome, AnimationError>>,
}

impl AnimationTask {
    pub async fn join(self) -> Result<AnimationOutcome, AnimationError> {
        self.handle.await?
    }

    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Drives targets through step sequences, one animation per target identity.
///
/// Every routine first validates its parameters, then claims the target in the
/// registry. If the target is already animating the call returns
/// `Ok(AnimationOutcome::Skipped)` without touching it; callers that do not
/// care can ignore the outcome. Once claimed, each step mutates the target,
/// calls `on_step`, then waits `speed_ms` milliseconds. A failing mutation or
/// callback aborts the remaining steps and is returned to the caller; the
/// claim is released on every path. Returning an error from `on_step` is the
/// way to stop an animation early.
#[derive(Clone)]
pub struct Animator {
    registry: AnimationRegistry,
    delay: Arc<dyn Delay>,
    rng: Arc<Mutex<StdRng>>,
}

impl Default for Animator {
    fn default() -> Self {
        Self::new()
    }
}

impl Animator {
    pub fn new() -> Self {
        Self {
            registry: AnimationRegistry::new(),
            delay: Arc::new(TokioDelay),
            rng: Arc::new(Mutex::new(StdRng::from_entropy())),
        }
    }

    pub fn with_registry(mut self, registry: AnimationRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_delay(mut self, delay: impl Delay + 'static) -> Self {
        self.delay = Arc::new(delay);
        self
    }

    /// Seeds the source used by [`Animator::cycle_color_random`].
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Arc::new(Mutex::new(StdRng::seed_from_u64(seed)));
        self
    }

    pub fn registry(&self) -> &AnimationRegistry {
        &self.registry
    }

    pub fn is_animating<T: Target + ?Sized>(&self, target: &T) -> bool {
        self.registry.is_animating(target.identity())
    }

    /// Sets the percentage to `current`, `current + step`, ... up to and including `max`.
    pub async fn ascend<T, F>(
        &self,
        target: &T,
        current: i64,
        max: i64,
        step: i64,
        mut on_step: F,
        speed_ms: u64,
    ) -> Result<AnimationOutcome, AnimationError>
    where
        T: Target + ?Sized,
        F: FnMut(i64, &T) -> anyhow::Result<()> + Send,
    {
        validate_step(step)?;
        self.guarded(
            target,
            "ascend",
            self.ramp_up(target, current, max, step, &mut on_step, speed_ms),
        )
        .await
    }

    /// Sets the percentage to `current`, `current - step`, ... down to and including `min`.
    pub async fn descend<T, F>(
        &self,
        target: &T,
        current: i64,
        min: i64,
        step: i64,
        mut on_step: F,
        speed_ms: u64,
    ) -> Result<AnimationOutcome, AnimationError>
    where
        T: Target + ?Sized,
        F: FnMut(i64, &T) -> anyhow::Result<()> + Send,
    {
        validate_step(step)?;
        self.guarded(
            target,
            "descend",
            self.ramp_down(target, current, min, step, &mut on_step, speed_ms),
        )
        .await
    }

    /// Ascends from `current` to `max`, then descends from `max` back to `current`,
    /// holding a single claim on the target for both phases.
    pub async fn pulse<T, F>(
        &self,
        target: &T,
        current: i64,
        max: i64,
        step: i64,
        mut on_step: F,
        speed_ms: u64,
    ) -> Result<AnimationOutcome, AnimationError>
    where
        T: Target + ?Sized,
        F: FnMut(i64, &T) -> anyhow::Result<()> + Send,
    {
        validate_step(step)?;
        let phases = async {
            let rising = self
                .ramp_up(target, current, max, step, &mut on_step, speed_ms)
                .await?;
            let falling = self
                .ramp_down(target, max, current, step, &mut on_step, speed_ms)
                .await?;
            Ok::<_, AnimationError>(rising + falling)
        };
        self.guarded(target, "pulse", phases).await
    }

    /// Applies each color in order.
    ///
    /// The bar protocol has no in-place color change, so every step hides the
    /// bar from its observers and shows it again with the new color. Clients
    /// see a short flicker.
    pub async fn cycle_color<T, F>(
        &self,
        target: &T,
        colors: &[BarColor],
        mut on_step: F,
        speed_ms: u64,
    ) -> Result<AnimationOutcome, AnimationError>
    where
        T: Target + ?Sized,
        F: FnMut(BarColor, &T) -> anyhow::Result<()> + Send,
    {
        let steps = async {
            for &color in colors {
                self.color_step(target, color, color, &mut on_step, speed_ms)
                    .await?;
            }
            Ok::<_, AnimationError>(colors.len())
        };
        self.guarded(target, "cycle_color", steps).await
    }

    /// Runs one step per entry of `colors`, applying a color drawn at random
    /// from `colors` each time. `on_step` still receives the entry for the
    /// current step, which is generally not the color that was applied.
    pub async fn cycle_color_random<T, F>(
        &self,
        target: &T,
        colors: &[BarColor],
        mut on_step: F,
        speed_ms: u64,
    ) -> Result<AnimationOutcome, AnimationError>
    where
        T: Target + ?Sized,
        F: FnMut(BarColor, &T) -> anyhow::Result<()> + Send,
    {
        let steps = async {
            for &color in colors {
                let applied = self.pick_color(colors).unwrap_or(color);
                self.color_step(target, color, applied, &mut on_step, speed_ms)
                    .await?;
            }
            Ok::<_, AnimationError>(colors.len())
        };
        self.guarded(target, "cycle_color_random", steps).await
    }

    /// Runs `animation` with a single callback type for both percentage and color steps.
    pub async fn run<T, F>(
        &self,
        target: &T,
        animation: &Animation,
        speed_ms: u64,
        mut on_step: F,
    ) -> Result<AnimationOutcome, AnimationError>
    where
        T: Target + ?Sized,
        F: FnMut(StepValue, &T) -> anyhow::Result<()> + Send,
    {
        match animation {
            Animation::Ascend { current, max, step } => {
                self.ascend(
                    target,
                    *current,
                    *max,
                    *step,
                    |value, target| on_step(StepValue::Percentage(value), target),
                    speed_ms,
                )
                .await
            }
            Animation::Descend { current, min, step } => {
                self.descend(
                    target,
                    *current,
                    *min,
                    *step,
                    |value, target| on_step(StepValue::Percentage(value), target),
                    speed_ms,
                )
                .await
            }
            Animation::Pulse { current, max, step } => {
                self.pulse(
                    target,
                    *current,
                    *max,
                    *step,
                    |value, target| on_step(StepValue::Percentage(value), target),
                    speed_ms,
                )
                .await
            }
            Animation::CycleColor { colors } => {
                self.cycle_color(
                    target,
                    colors,
                    |color, target| on_step(StepValue::Color(color), target),
                    speed_ms,
                )
                .await
            }
            Animation::CycleColorRandom { colors } => {
                self.cycle_color_random(
                    target,
                    colors,
                    |color, target| on_step(StepValue::Color(color), target),
                    speed_ms,
                )
                .await
            }
        }
    }

    /// Runs `animation` on its own tokio task.
    pub fn spawn<T, F>(
        &self,
        target: Arc<T>,
        animation: Animation,
        speed_ms: u64,
        on_step: F,
    ) -> AnimationTask
    where
        T: Target + ?Sized + 'static,
        F: FnMut(StepValue, &T) -> anyhow::Result<()> + Send + 'static,
    {
        let animator = self.clone();
        let handle = tokio::spawn(async move {
            animator
                .run(target.as_ref(), &animation, speed_ms, on_step)
                .await
        });
        AnimationTask { handle }
    }

    async fn guarded<T, S>(
        &self,
        target: &T,
        kind: &'static str,
        steps: S,
    ) -> Result<AnimationOutcome, AnimationError>
    where
        T: Target + ?Sized,
        S: Future<Output = Result<usize, AnimationError>>,
    {
        let bar_id = target.identity();
        let Some(_guard) = self.registry.try_acquire(bar_id) else {
            debug!(
                bar_id = bar_id.0,
                kind, "animation: target already animating, skipping"
            );
            return Ok(AnimationOutcome::Skipped);
        };

        debug!(bar_id = bar_id.0, kind, "animation: started");
        match steps.await {
            Ok(count) => {
                debug!(bar_id = bar_id.0, kind, steps = count, "animation: finished");
                Ok(AnimationOutcome::Completed)
            }
            Err(error) => {
                warn!(bar_id = bar_id.0, kind, %error, "animation: aborted");
                Err(error)
            }
        }
    }

    async fn ramp_up<T, F>(
        &self,
        target: &T,
        from: i64,
        to: i64,
        step: i64,
        on_step: &mut F,
        speed_ms: u64,
    ) -> Result<usize, AnimationError>
    where
        T: Target + ?Sized,
        F: FnMut(i64, &T) -> anyhow::Result<()> + Send,
    {
        let mut count = 0;
        let mut value = from;
        while value <= to {
            self.percentage_step(target, value, on_step, speed_ms)
                .await?;
            count += 1;
            let Some(next) = value.checked_add(step) else {
                break;
            };
            value = next;
        }
        Ok(count)
    }

    async fn ramp_down<T, F>(
        &self,
        target: &T,
        from: i64,
        to: i64,
        step: i64,
        on_step: &mut F,
        speed_ms: u64,
    ) -> Result<usize, AnimationError>
    where
        T: Target + ?Sized,
        F: FnMut(i64, &T) -> anyhow::Result<()> + Send,
    {
        let mut count = 0;
        let mut value = from;
        while value >= to {
            self.percentage_step(target, value, on_step, speed_ms)
                .await?;
            count += 1;
            let Some(next) = value.checked_sub(step) else {
                break;
            };
            value = next;
        }
        Ok(count)
    }

    async fn percentage_step<T, F>(
        &self,
        target: &T,
        value: i64,
        on_step: &mut F,
        speed_ms: u64,
    ) -> Result<(), AnimationError>
    where
        T: Target + ?Sized,
        F: FnMut(i64, &T) -> anyhow::Result<()> + Send,
    {
        let bar_id = target.identity();
        target
            .set_percentage(value)
            .await
            .map_err(|source| AnimationError::Mutation { bar_id, source })?;
        on_step(value, target).map_err(|source| AnimationError::Callback { bar_id, source })?;
        self.delay.delay(speed_ms).await;
        Ok(())
    }

    async fn color_step<T, F>(
        &self,
        target: &T,
        reported: BarColor,
        applied: BarColor,
        on_step: &mut F,
        speed_ms: u64,
    ) -> Result<(), AnimationError>
    where
        T: Target + ?Sized,
        F: FnMut(BarColor, &T) -> anyhow::Result<()> + Send,
    {
        let bar_id = target.identity();
        let mutation = |source: TargetError| AnimationError::Mutation { bar_id, source };

        let observers = target.observers();
        target.detach_observers(&observers).await.map_err(mutation)?;
        target.set_color(applied).await.map_err(mutation)?;
        target.attach_observers(&observers).await.map_err(mutation)?;
        on_step(reported, target).map_err(|source| AnimationError::Callback { bar_id, source })?;
        self.delay.delay(speed_ms).await;
        Ok(())
    }

    fn pick_color(&self, colors: &[BarColor]) -> Option<BarColor> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        colors.choose(&mut *rng).copied()
    }
}

fn validate_step(step: i64) -> Result<(), AnimationError> {
    if step <= 0 {
        return Err(AnimationError::InvalidParameter(format!(
            "step must be positive, got {step}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod tests;
