//! Loss surface sampling for the two-parameter model.
//!
//! The grid is independent of any training run: it reads only the dataset and
//! the coordinate ranges, so it can be computed before, during or after a
//! trace and overlaid with the trajectory.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::data::{DataPoint2D, Dataset};
use crate::linear;
use crate::{Error, Result};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
/// Coordinate ranges and per-axis sample count.
pub struct LossGridConfig {
    pub w1_min: f64,
    pub w1_max: f64,
    pub w2_min: f64,
    pub w2_max: f64,
    pub resolution: usize,
}

impl Default for LossGridConfig {
    fn default() -> Self {
        Self {
            w1_min: -1.0,
            w1_max: 4.0,
            w2_min: -1.0,
            w2_max: 4.0,
            resolution: 50,
        }
    }
}

impl LossGridConfig {
    pub fn new(w1_range: (f64, f64), w2_range: (f64, f64), resolution: usize) -> Result<Self> {
        let cfg = Self {
            w1_min: w1_range.0,
            w1_max: w1_range.1,
            w2_min: w2_range.0,
            w2_max: w2_range.1,
            resolution,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Ranges must be finite with `max > min` and a finite width; resolution
    /// must be at least 2.
    pub fn validate(&self) -> Result<()> {
        if self.resolution < 2 {
            return Err(Error::InvalidConfig(format!(
                "resolution must be >= 2, got {}",
                self.resolution
            )));
        }
        for (axis, lo, hi) in [
            ("w1", self.w1_min, self.w1_max),
            ("w2", self.w2_min, self.w2_max),
        ] {
            if !(lo.is_finite() && hi.is_finite()) {
                return Err(Error::InvalidConfig(format!(
                    "{axis} range must be finite, got [{lo}, {hi}]"
                )));
            }
            if hi <= lo {
                return Err(Error::InvalidConfig(format!(
                    "{axis}_max must be greater than {axis}_min, got [{lo}, {hi}]"
                )));
            }
            if !(hi - lo).is_finite() {
                return Err(Error::InvalidConfig(format!(
                    "{axis} range width overflows, got [{lo}, {hi}]"
                )));
            }
        }
        Ok(())
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossGridPoint {
    pub w1: f64,
    pub w2: f64,
    pub loss: f64,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
/// `resolution × resolution` samples of the average loss.
///
/// `points` is ordered with `w1` as the outer axis: index `i * resolution + j`
/// holds `(w1_min + i·Δw1, w2_min + j·Δw2)`.
pub struct LossGrid {
    pub w1_min: f64,
    pub w1_max: f64,
    pub w2_min: f64,
    pub w2_max: f64,
    pub resolution: usize,
    pub points: Vec<LossGridPoint>,
}

impl LossGrid {
    /// Sample at row `i` (w1 axis) and column `j` (w2 axis).
    pub fn get(&self, i: usize, j: usize) -> Option<&LossGridPoint> {
        if i >= self.resolution || j >= self.resolution {
            return None;
        }
        self.points.get(i * self.resolution + j)
    }

    /// The sample with the lowest loss. NaN losses are never chosen.
    pub fn min_point(&self) -> Option<&LossGridPoint> {
        self.points
            .iter()
            .filter(|p| !p.loss.is_nan())
            .min_by(|a, b| a.loss.total_cmp(&b.loss))
    }
}

/// Evaluate the dataset-mean loss on every grid coordinate.
///
/// Cost is `O(resolution² · data.len())`.
pub fn compute_loss_grid(data: &Dataset<DataPoint2D>, cfg: &LossGridConfig) -> Result<LossGrid> {
    cfg.validate()?;

    let n = cfg.resolution;
    let w1_step = (cfg.w1_max - cfg.w1_min) / (n - 1) as f64;
    let w2_step = (cfg.w2_max - cfg.w2_min) / (n - 1) as f64;

    let mut points = Vec::with_capacity(n * n);
    for i in 0..n {
        let w1 = cfg.w1_min + i as f64 * w1_step;
        for j in 0..n {
            let w2 = cfg.w2_min + j as f64 * w2_step;
            points.push(LossGridPoint {
                w1,
                w2,
                loss: linear::average_loss(data, w1, w2),
            });
        }
    }

    tracing::debug!(resolution = n, points = data.len(), "computed loss grid");

    Ok(LossGrid {
        w1_min: cfg.w1_min,
        w1_max: cfg.w1_max,
        w2_min: cfg.w2_min,
        w2_max: cfg.w2_max,
        resolution: n,
        points,
    })
}
