//! Two-parameter linear model: `y_pred = w1·x1 + w2·x2`.
//!
//! Besides the averaged gradient, each step records its magnitude and its
//! direction `atan2(grad_w2, grad_w1)` so the trajectory can be drawn over
//! the loss contours produced by [`crate::surface`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::chain::{self, ChainAccumulator};
use crate::data::{DataPoint2D, Dataset};
use crate::loss;
use crate::train::{Model, Schedule, StepOutcome, Trainer, TrainingRun};
use crate::{Activation, Error, Result};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LinearParams {
    pub w1: f64,
    pub w2: f64,
}

impl LinearParams {
    pub fn new(w1: f64, w2: f64) -> Self {
        Self { w1, w2 }
    }

    #[inline]
    fn as_array(self) -> [f64; 2] {
        [self.w1, self.w2]
    }
}

/// `y_pred = w1·x1 + w2·x2`.
#[inline]
pub fn forward(w1: f64, w2: f64, x1: f64, x2: f64) -> f64 {
    w1 * x1 + w2 * x2
}

/// `(y_pred - y_true)^2`.
#[inline]
pub fn point_loss(y_pred: f64, y_true: f64) -> f64 {
    loss::squared_error(y_pred, y_true)
}

/// `(dL/dw1, dL/dw2) = 2(y_pred - y_true)·(x1, x2)` for one point.
#[inline]
pub fn gradient(params: LinearParams, point: &DataPoint2D) -> (f64, f64) {
    let c = chain::decompose(
        &params.as_array(),
        0.0,
        &[point.x1, point.x2],
        point.y_true,
        Activation::Identity,
    );
    (c.dl_dparam(point.x1), c.dl_dparam(point.x2))
}

/// `||∇L|| = sqrt(grad_w1² + grad_w2²)`.
#[inline]
pub fn gradient_magnitude(grad_w1: f64, grad_w2: f64) -> f64 {
    grad_w1.hypot(grad_w2)
}

/// Angle of the gradient vector in radians, in `[-π, π]`.
#[inline]
pub fn gradient_direction(grad_w1: f64, grad_w2: f64) -> f64 {
    grad_w2.atan2(grad_w1)
}

/// Dataset-mean loss at `(w1, w2)`.
pub fn average_loss(data: &Dataset<DataPoint2D>, w1: f64, w2: f64) -> f64 {
    let mut mean = loss::Mean::default();
    for p in data {
        mean.push(point_loss(forward(w1, w2, p.x1, p.x2), p.y_true));
    }
    mean.get()
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
/// Hyperparameters for a two-parameter run.
pub struct TrainingConfig2D {
    pub w1_init: f64,
    pub w2_init: f64,
    pub lr: f64,
    pub steps: usize,
}

impl Default for TrainingConfig2D {
    fn default() -> Self {
        Self {
            w1_init: 0.0,
            w2_init: 0.0,
            lr: 0.01,
            steps: 100,
        }
    }
}

impl TrainingConfig2D {
    pub fn validate(&self) -> Result<()> {
        check_params(self.init())?;
        self.schedule().validate()
    }

    pub fn init(&self) -> LinearParams {
        LinearParams::new(self.w1_init, self.w2_init)
    }

    pub fn schedule(&self) -> Schedule {
        Schedule {
            lr: self.lr,
            steps: self.steps,
        }
    }
}

fn check_params(p: LinearParams) -> Result<()> {
    if !(p.w1.is_finite() && p.w2.is_finite()) {
        return Err(Error::InvalidConfig(format!(
            "initial weights must be finite, got w1={} w2={}",
            p.w1, p.w2
        )));
    }
    Ok(())
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSnapshot2D {
    pub x1: f64,
    pub x2: f64,
    pub y_true: f64,
    pub y_pred: f64,
    pub point_loss: f64,
    pub grad_w1: f64,
    pub grad_w2: f64,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateDetails2D {
    pub w1_old: f64,
    pub w2_old: f64,
    pub lr: f64,
    pub grad_w1: f64,
    pub grad_w2: f64,
    pub delta_w1: f64,
    pub delta_w2: f64,
    pub w1_new: f64,
    pub w2_new: f64,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSnapshot {
    pub step: usize,
    pub w1: f64,
    pub w2: f64,
    pub grad_w1: f64,
    pub grad_w2: f64,
    pub loss: f64,
    pub gradient_magnitude: f64,
    pub gradient_direction: f64,
    pub point_details: Vec<PointSnapshot2D>,
    pub update_components: UpdateDetails2D,
}

impl LinearSnapshot {
    pub fn params(&self) -> LinearParams {
        LinearParams::new(self.w1, self.w2)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LinearModel;

impl Model for LinearModel {
    type Point = DataPoint2D;
    type Params = LinearParams;
    type Snapshot = LinearSnapshot;

    fn name(&self) -> &'static str {
        "linear"
    }

    fn validate_params(&self, _data: &Dataset<DataPoint2D>, params: &LinearParams) -> Result<()> {
        check_params(*params)
    }

    fn trace_step(
        &self,
        step: usize,
        data: &Dataset<DataPoint2D>,
        params: &LinearParams,
        lr: f64,
    ) -> StepOutcome<LinearSnapshot, LinearParams> {
        let LinearParams { w1, w2 } = *params;
        let weights = params.as_array();
        let mut acc = ChainAccumulator::new(2);
        let mut point_details = Vec::with_capacity(data.len());

        for p in data {
            let x = [p.x1, p.x2];
            let c = chain::decompose(&weights, 0.0, &x, p.y_true, Activation::Identity);
            acc.push(&c, &x);
            point_details.push(PointSnapshot2D {
                x1: p.x1,
                x2: p.x2,
                y_true: p.y_true,
                y_pred: c.a,
                point_loss: c.loss,
                grad_w1: c.dl_dparam(p.x1),
                grad_w2: c.dl_dparam(p.x2),
            });
        }

        let avg = acc.finish();
        let (grad_w1, grad_w2) = (avg.dl_dw[0], avg.dl_dw[1]);
        let magnitude = gradient_magnitude(grad_w1, grad_w2);

        let delta_w1 = -lr * grad_w1;
        let delta_w2 = -lr * grad_w2;
        let next = LinearParams::new(w1 + delta_w1, w2 + delta_w2);

        StepOutcome {
            snapshot: LinearSnapshot {
                step,
                w1,
                w2,
                grad_w1,
                grad_w2,
                loss: avg.loss,
                gradient_magnitude: magnitude,
                gradient_direction: gradient_direction(grad_w1, grad_w2),
                point_details,
                update_components: UpdateDetails2D {
                    w1_old: w1,
                    w2_old: w2,
                    lr,
                    grad_w1,
                    grad_w2,
                    delta_w1,
                    delta_w2,
                    w1_new: next.w1,
                    w2_new: next.w2,
                },
            },
            next,
            loss: avg.loss,
            grad_norm: magnitude,
        }
    }
}

/// Run a two-parameter trace described by `cfg`.
pub fn train(
    data: &Dataset<DataPoint2D>,
    cfg: &TrainingConfig2D,
) -> Result<TrainingRun<LinearSnapshot>> {
    cfg.validate()?;
    Trainer::new(LinearModel, cfg.schedule())?.run(data, &cfg.init())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane() -> Dataset<DataPoint2D> {
        // y = 2·x1 + 1.5·x2 exactly.
        let pts = [(1.0, 0.0), (0.0, 1.0), (1.0, 1.0), (2.0, 0.5), (0.5, 2.0)]
            .into_iter()
            .map(|(x1, x2)| DataPoint2D::new(x1, x2, 2.0 * x1 + 1.5 * x2))
            .collect();
        Dataset::new(pts).unwrap()
    }

    #[test]
    fn point_gradient_matches_closed_form() {
        let p = DataPoint2D::new(1.5, -0.5, 2.0);
        let params = LinearParams::new(0.3, 0.7);
        let err = forward(0.3, 0.7, 1.5, -0.5) - 2.0;
        let (g1, g2) = gradient(params, &p);
        assert!((g1 - 2.0 * err * 1.5).abs() < 1e-12);
        assert!((g2 - 2.0 * err * -0.5).abs() < 1e-12);
    }

    #[test]
    fn magnitude_and_direction() {
        assert!((gradient_magnitude(3.0, 4.0) - 5.0).abs() < 1e-12);
        assert!((gradient_direction(0.0, 1.0) - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!((gradient_direction(-1.0, 0.0) - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn step_records_averages_and_update() {
        let data = plane();
        let cfg = TrainingConfig2D {
            steps: 2,
            lr: 0.05,
            ..Default::default()
        };
        let run = train(&data, &cfg).unwrap();
        let s0 = &run.snapshots()[0];

        let n = data.len() as f64;
        let g1: f64 = s0.point_details.iter().map(|p| p.grad_w1).sum::<f64>() / n;
        let g2: f64 = s0.point_details.iter().map(|p| p.grad_w2).sum::<f64>() / n;
        assert!((s0.grad_w1 - g1).abs() < 1e-12);
        assert!((s0.grad_w2 - g2).abs() < 1e-12);
        assert!((s0.loss - average_loss(&data, 0.0, 0.0)).abs() < 1e-12);
        assert_eq!(s0.update_components.delta_w1, -0.05 * s0.grad_w1);
        assert_eq!(run.snapshots()[1].params().w1, s0.update_components.w1_new);
    }

    #[test]
    fn converges_to_generating_weights() {
        let cfg = TrainingConfig2D {
            steps: 2000,
            lr: 0.1,
            ..Default::default()
        };
        let run = train(&plane(), &cfg).unwrap();
        let u = run.last().unwrap().update_components;
        assert!((u.w1_new - 2.0).abs() < 1e-3);
        assert!((u.w2_new - 1.5).abs() < 1e-3);
    }
}
