//! Time-stepped boss bar animations with at most one animation per bar.

pub mod delay;
pub mod engine;
pub mod registry;

pub use delay::{Delay, TokioDelay};
pub use engine::{Animation, AnimationError, AnimationOutcome, AnimationTask, Animator, StepValue};
pub use registry::{AnimationGuard, AnimationRegistry};
