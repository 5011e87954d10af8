//! One-parameter model: `y_pred = w·x`.
//!
//! The simplest trace. Each step records the per-point prediction, loss and
//! gradient contribution `2(y_pred - y_true)·x`, their averages, and the update
//! `w_new = w - lr·grad_w`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::chain::{self, ChainAccumulator};
use crate::data::{DataPoint, Dataset};
use crate::loss;
use crate::train::{Model, Schedule, StepOutcome, Trainer, TrainingRun};
use crate::{Activation, Error, Result};

/// `y_pred = w·x`.
#[inline]
pub fn forward(w: f64, x: f64) -> f64 {
    w * x
}

/// `(y_pred - y_true)^2`.
#[inline]
pub fn point_loss(y_pred: f64, y_true: f64) -> f64 {
    loss::squared_error(y_pred, y_true)
}

/// `dL/dw = 2(w·x - y_true)·x`.
#[inline]
pub fn grad_w(w: f64, x: f64, y_true: f64) -> f64 {
    chain::decompose(&[w], 0.0, &[x], y_true, Activation::Identity).dl_dparam(x)
}

/// Dataset-mean loss at `w`.
pub fn average_loss(data: &Dataset<DataPoint>, w: f64) -> f64 {
    let mut mean = loss::Mean::default();
    for p in data {
        mean.push(point_loss(forward(w, p.x), p.y_true));
    }
    mean.get()
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
/// Hyperparameters for a scalar run.
pub struct TrainingConfig {
    pub w_init: f64,
    pub lr: f64,
    pub steps: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            w_init: 0.0,
            lr: 0.01,
            steps: 100,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.w_init.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "w_init must be finite, got {}",
                self.w_init
            )));
        }
        self.schedule().validate()
    }

    pub fn schedule(&self) -> Schedule {
        Schedule {
            lr: self.lr,
            steps: self.steps,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSnapshot {
    pub x: f64,
    pub y_true: f64,
    pub y_pred: f64,
    pub point_loss: f64,
    /// `2(y_pred - y_true)·x`
    pub point_grad: f64,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
/// The literal arithmetic of `w_new = w_old + delta_w`, `delta_w = -lr·grad_w`.
pub struct UpdateDetails {
    pub w_old: f64,
    pub lr: f64,
    pub grad_w: f64,
    pub delta_w: f64,
    pub w_new: f64,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub step: usize,
    /// Parameter that produced this step's loss and gradient.
    pub w: f64,
    pub grad_w: f64,
    pub loss: f64,
    pub point_details: Vec<PointSnapshot>,
    pub update_components: UpdateDetails,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarModel;

impl Model for ScalarModel {
    type Point = DataPoint;
    type Params = f64;
    type Snapshot = Snapshot;

    fn name(&self) -> &'static str {
        "scalar"
    }

    fn validate_params(&self, _data: &Dataset<DataPoint>, w: &f64) -> Result<()> {
        if !w.is_finite() {
            return Err(Error::InvalidConfig(format!("w_init must be finite, got {w}")));
        }
        Ok(())
    }

    fn trace_step(
        &self,
        step: usize,
        data: &Dataset<DataPoint>,
        &w: &f64,
        lr: f64,
    ) -> StepOutcome<Snapshot, f64> {
        let mut acc = ChainAccumulator::new(1);
        let mut point_details = Vec::with_capacity(data.len());

        for p in data {
            let c = chain::decompose(&[w], 0.0, &[p.x], p.y_true, Activation::Identity);
            acc.push(&c, &[p.x]);
            point_details.push(PointSnapshot {
                x: p.x,
                y_true: p.y_true,
                y_pred: c.a,
                point_loss: c.loss,
                point_grad: c.dl_dparam(p.x),
            });
        }

        let avg = acc.finish();
        let grad = avg.dl_dw[0];
        let delta_w = -lr * grad;
        let w_new = w + delta_w;

        StepOutcome {
            snapshot: Snapshot {
                step,
                w,
                grad_w: grad,
                loss: avg.loss,
                point_details,
                update_components: UpdateDetails {
                    w_old: w,
                    lr,
                    grad_w: grad,
                    delta_w,
                    w_new,
                },
            },
            next: w_new,
            loss: avg.loss,
            grad_norm: grad.abs(),
        }
    }
}

/// Run a scalar trace described by `cfg`.
pub fn train(data: &Dataset<DataPoint>, cfg: &TrainingConfig) -> Result<TrainingRun<Snapshot>> {
    cfg.validate()?;
    Trainer::new(ScalarModel, cfg.schedule())?.run(data, &cfg.w_init)
}

/// Ten points close to `y = 2x`.
pub fn default_points() -> Vec<DataPoint> {
    [
        (1.0, 2.1),
        (2.0, 3.9),
        (3.0, 6.2),
        (4.0, 7.8),
        (5.0, 10.1),
        (6.0, 11.9),
        (7.0, 14.2),
        (8.0, 15.8),
        (9.0, 18.1),
        (10.0, 19.9),
    ]
    .into_iter()
    .map(|(x, y)| DataPoint::new(x, y))
    .collect()
}

/// [`default_points`] as a validated dataset.
pub fn default_dataset() -> Result<Dataset<DataPoint>> {
    Dataset::new(default_points())
}
