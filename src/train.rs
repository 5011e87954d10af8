//! The trace engine.
//!
//! [`Trainer::run`] performs a fixed number of full-batch gradient descent steps
//! and records one immutable snapshot per step. The model-specific arithmetic
//! lives behind the [`Model`] trait; the engine owns the ordering:
//!
//! 1. validate the dataset, initial parameters and schedule once,
//! 2. for each step, let the model build the snapshot from the *current*
//!    parameters (the snapshot also carries the proposed next parameters),
//! 3. append the snapshot, then commit the next parameters.
//!
//! There is no early stopping and no divergence check: `NaN`/`Inf` produced
//! mid-run is written into the snapshots as-is so it can be visualized.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::data::{Dataset, Point};
use crate::{Error, Result};

/// How often the engine logs progress at `debug` level.
const LOG_EVERY: usize = 20;

/// Result of tracing one step.
#[derive(Debug, Clone)]
pub struct StepOutcome<S, P> {
    /// The frozen record for this step, built from the pre-update parameters.
    pub snapshot: S,
    /// Parameters after applying `old - lr·grad`.
    pub next: P,
    /// Averaged loss at the pre-update parameters.
    pub loss: f64,
    /// L2 norm of the averaged gradient.
    pub grad_norm: f64,
}

/// A model whose gradient descent step can be traced.
///
/// Implementors are stateless: parameters are passed in and returned, never
/// stored, so one model value can serve any number of runs.
pub trait Model {
    type Point: Point;
    type Params: Clone + std::fmt::Debug;
    type Snapshot;

    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Check that `params` fit `data` and are finite.
    fn validate_params(&self, data: &Dataset<Self::Point>, params: &Self::Params) -> Result<()>;

    /// Compute the full step record at `params` and the post-update parameters.
    fn trace_step(
        &self,
        step: usize,
        data: &Dataset<Self::Point>,
        params: &Self::Params,
        lr: f64,
    ) -> StepOutcome<Self::Snapshot, Self::Params>;
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
/// Learning rate and step count shared by every model.
pub struct Schedule {
    pub lr: f64,
    pub steps: usize,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            lr: 1e-2,
            steps: 100,
        }
    }
}

impl Schedule {
    pub fn new(lr: f64, steps: usize) -> Result<Self> {
        let s = Self { lr, steps };
        s.validate()?;
        Ok(s)
    }

    /// The learning rate must be finite; zero and negative rates are allowed.
    pub fn validate(&self) -> Result<()> {
        if !self.lr.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be finite, got {}",
                self.lr
            )));
        }
        Ok(())
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Debug, Clone, PartialEq)]
/// Ordered step snapshots of one completed run. Serializes as a JSON array.
pub struct TrainingRun<S> {
    snapshots: Vec<S>,
}

impl<S> TrainingRun<S> {
    pub fn from_snapshots(snapshots: Vec<S>) -> Self {
        Self { snapshots }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    #[inline]
    pub fn snapshots(&self) -> &[S] {
        &self.snapshots
    }

    #[inline]
    pub fn get(&self, step: usize) -> Option<&S> {
        self.snapshots.get(step)
    }

    #[inline]
    pub fn last(&self) -> Option<&S> {
        self.snapshots.last()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, S> {
        self.snapshots.iter()
    }

    pub fn into_snapshots(self) -> Vec<S> {
        self.snapshots
    }
}

impl<'a, S> IntoIterator for &'a TrainingRun<S> {
    type Item = &'a S;
    type IntoIter = std::slice::Iter<'a, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshots.iter()
    }
}

impl<S> IntoIterator for TrainingRun<S> {
    type Item = S;
    type IntoIter = std::vec::IntoIter<S>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshots.into_iter()
    }
}

/// Drives a [`Model`] through a fixed schedule.
///
/// A trainer holds configuration only. Each call to [`Trainer::run`] starts from
/// its own copy of the initial parameters and keeps no state afterwards, so
/// concurrent callers should each use their own run without sharing anything.
#[derive(Debug, Clone)]
pub struct Trainer<M> {
    model: M,
    schedule: Schedule,
}

impl<M: Model> Trainer<M> {
    pub fn new(model: M, schedule: Schedule) -> Result<Self> {
        schedule.validate()?;
        Ok(Self { model, schedule })
    }

    #[inline]
    pub fn model(&self) -> &M {
        &self.model
    }

    #[inline]
    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// Run `schedule.steps` steps from `init` and return every snapshot.
    pub fn run(
        &self,
        data: &Dataset<M::Point>,
        init: &M::Params,
    ) -> Result<TrainingRun<M::Snapshot>> {
        self.model.validate_params(data, init)?;

        let Schedule { lr, steps } = self.schedule;
        let span = tracing::info_span!("trace", model = self.model.name());
        let _enter = span.enter();
        tracing::info!(points = data.len(), lr, steps, "starting run");

        let mut params = init.clone();
        let mut snapshots = Vec::with_capacity(steps);
        let mut diverged = false;

        for step in 0..steps {
            let StepOutcome {
                snapshot,
                next,
                loss,
                grad_norm,
            } = self.model.trace_step(step, data, &params, lr);

            if !diverged && !loss.is_finite() {
                diverged = true;
                tracing::warn!(step, loss, "loss is no longer finite; recording as-is");
            }
            if step % LOG_EVERY == 0 {
                tracing::debug!(step, loss, grad_norm, params = ?params, "step");
            }

            snapshots.push(snapshot);
            params = next;
        }

        tracing::info!(final_params = ?params, "run complete");
        Ok(TrainingRun { snapshots })
    }
}
