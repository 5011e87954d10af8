//! Seeded synthetic datasets.
//!
//! All randomness in the crate lives here. Every generator takes an explicit
//! seed and uses `StdRng`, so the same config always yields the same points and
//! therefore the same trace.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::data::{DataPoint, DataPoint2D, Dataset, NeuronPoint};
use crate::{Error, Result};

fn check_count(num_points: usize) -> Result<()> {
    if num_points == 0 {
        return Err(Error::InvalidConfig("num_points must be > 0".to_owned()));
    }
    Ok(())
}

fn check_range(name: &str, lo: f64, hi: f64) -> Result<()> {
    if !(lo.is_finite() && hi.is_finite()) {
        return Err(Error::InvalidConfig(format!(
            "{name} range must be finite, got [{lo}, {hi}]"
        )));
    }
    if hi <= lo {
        return Err(Error::InvalidConfig(format!(
            "{name}_max must be greater than {name}_min, got [{lo}, {hi}]"
        )));
    }
    // `gen_range` needs a finite span.
    if !(hi - lo).is_finite() {
        return Err(Error::InvalidConfig(format!(
            "{name} range width overflows, got [{lo}, {hi}]"
        )));
    }
    Ok(())
}

fn check_noise(name: &str, noise: f64) -> Result<()> {
    if !(noise.is_finite() && noise >= 0.0) {
        return Err(Error::InvalidConfig(format!(
            "{name} must be finite and >= 0, got {noise}"
        )));
    }
    Ok(())
}

fn check_finite(name: &str, v: f64) -> Result<()> {
    if !v.is_finite() {
        return Err(Error::InvalidConfig(format!("{name} must be finite, got {v}")));
    }
    Ok(())
}

/// Uniform noise in `[-level, level]`.
#[inline]
fn uniform_noise<R: Rng + ?Sized>(rng: &mut R, level: f64) -> f64 {
    (rng.r#gen::<f64>() * 2.0 - 1.0) * level
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
/// Evenly spaced `x` on `[x_min, x_max]`, `y = true_slope·x + U(-noise, noise)`.
pub struct DataGenConfig {
    pub num_points: usize,
    pub x_min: f64,
    pub x_max: f64,
    pub true_slope: f64,
    pub noise_level: f64,
    pub seed: u64,
}

impl Default for DataGenConfig {
    fn default() -> Self {
        Self {
            num_points: 10,
            x_min: 1.0,
            x_max: 10.0,
            true_slope: 2.0,
            noise_level: 0.1,
            seed: 42,
        }
    }
}

impl DataGenConfig {
    pub fn validate(&self) -> Result<()> {
        check_count(self.num_points)?;
        check_range("x", self.x_min, self.x_max)?;
        check_finite("true_slope", self.true_slope)?;
        check_noise("noise_level", self.noise_level)
    }

    pub fn generate(&self) -> Result<Dataset<DataPoint>> {
        self.validate()?;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let span = self.x_max - self.x_min;
        // A single point sits at x_min.
        let denom = (self.num_points.max(2) - 1) as f64;
        let points = (0..self.num_points)
            .map(|i| {
                let x = self.x_min + span * i as f64 / denom;
                let y = self.true_slope * x + uniform_noise(&mut rng, self.noise_level);
                DataPoint::new(x, y)
            })
            .collect();
        Dataset::new(points)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
/// Uniform `(x1, x2)` in a box, `y = true_w1·x1 + true_w2·x2 + U(-noise, noise)`.
pub struct DataGenConfig2D {
    pub num_points: usize,
    pub x1_min: f64,
    pub x1_max: f64,
    pub x2_min: f64,
    pub x2_max: f64,
    pub true_w1: f64,
    pub true_w2: f64,
    pub noise_level: f64,
    pub seed: u64,
}

impl Default for DataGenConfig2D {
    fn default() -> Self {
        Self {
            num_points: 20,
            x1_min: 0.0,
            x1_max: 5.0,
            x2_min: 0.0,
            x2_max: 5.0,
            true_w1: 2.0,
            true_w2: 1.5,
            noise_level: 0.5,
            seed: 42,
        }
    }
}

impl DataGenConfig2D {
    pub fn validate(&self) -> Result<()> {
        check_count(self.num_points)?;
        check_range("x1", self.x1_min, self.x1_max)?;
        check_range("x2", self.x2_min, self.x2_max)?;
        check_finite("true_w1", self.true_w1)?;
        check_finite("true_w2", self.true_w2)?;
        check_noise("noise_level", self.noise_level)
    }

    pub fn generate(&self) -> Result<Dataset<DataPoint2D>> {
        self.validate()?;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let points = (0..self.num_points)
            .map(|_| {
                let x1 = rng.gen_range(self.x1_min..self.x1_max);
                let x2 = rng.gen_range(self.x2_min..self.x2_max);
                let y = self.true_w1 * x1
                    + self.true_w2 * x2
                    + uniform_noise(&mut rng, self.noise_level);
                DataPoint2D::new(x1, x2, y)
            })
            .collect();
        Dataset::new(points)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
/// Uniform inputs per feature with Gaussian target noise.
///
/// `x_range[j]` is the `(min, max)` of feature `j`; its length sets the feature
/// count and must match `w_true`.
pub struct NeuronDataConfig {
    pub num_points: usize,
    pub w_true: Vec<f64>,
    pub b_true: f64,
    pub noise_std: f64,
    pub x_range: Vec<(f64, f64)>,
    pub seed: u64,
}

impl Default for NeuronDataConfig {
    fn default() -> Self {
        Self {
            num_points: 20,
            w_true: vec![0.5, -0.3],
            b_true: 0.1,
            noise_std: 0.05,
            x_range: vec![(0.0, 1.0), (0.0, 1.0)],
            seed: 42,
        }
    }
}

impl NeuronDataConfig {
    pub fn validate(&self) -> Result<()> {
        check_count(self.num_points)?;
        if self.x_range.is_empty() {
            return Err(Error::InvalidConfig(
                "x_range must name at least one feature".to_owned(),
            ));
        }
        if self.w_true.len() != self.x_range.len() {
            return Err(Error::InvalidConfig(format!(
                "w_true has {} entries, x_range has {}",
                self.w_true.len(),
                self.x_range.len()
            )));
        }
        for (j, &(lo, hi)) in self.x_range.iter().enumerate() {
            check_range(&format!("x{}", j + 1), lo, hi)?;
        }
        for &w in &self.w_true {
            check_finite("w_true", w)?;
        }
        check_finite("b_true", self.b_true)?;
        check_noise("noise_std", self.noise_std)
    }

    /// Targets from the linear rule `y = w_true·x + b_true + N(0, noise_std)`.
    pub fn generate(&self) -> Result<Dataset<NeuronPoint>> {
        let w = self.w_true.clone();
        let b = self.b_true;
        self.generate_with(move |x| x.iter().zip(&w).map(|(xi, wi)| xi * wi).sum::<f64>() + b)
    }

    /// Targets from an arbitrary `target(x)` plus Gaussian noise.
    ///
    /// `w_true`/`b_true` are ignored except for the length check.
    pub fn generate_with<F>(&self, target: F) -> Result<Dataset<NeuronPoint>>
    where
        F: Fn(&[f64]) -> f64,
    {
        self.validate()?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let noise = Normal::new(0.0, self.noise_std)
            .map_err(|e| Error::InvalidConfig(format!("invalid noise_std: {e}")))?;

        let points = (0..self.num_points)
            .map(|_| {
                let x: Vec<f64> = self
                    .x_range
                    .iter()
                    .map(|&(lo, hi)| rng.gen_range(lo..hi))
                    .collect();
                let y = target(&x) + noise.sample(&mut rng);
                NeuronPoint::new(x, y)
            })
            .collect();
        Dataset::new(points)
    }
}
