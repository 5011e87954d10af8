//! Chain-rule decomposition of the squared-error gradient.
//!
//! For a model `z = w·x + b`, `a = act(z)`, `L = (a - y)^2` the gradient of any
//! parameter `p` factors as
//!
//! ```text
//! dL/dp = dL/da · da/dz · dz/dp
//!       = 2(a - y) · act'(z) · (x_j for w_j, 1 for b)
//! ```
//!
//! [`decompose`] is the only place gradients are computed in this crate. The
//! scalar and linear models call it with [`Activation::Identity`] and no bias,
//! where `da/dz == 1` and the gradient collapses to `2(y_pred - y)·x_j`. The
//! per-step averages in [`ChainAccumulator`] are therefore the model gradient,
//! not a parallel re-derivation of it.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Activation;
use crate::loss::{squared_error, squared_error_grad};

/// Forward values and chain-rule factors for one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointChain {
    /// Pre-activation `w·x + b`.
    pub z: f64,
    /// Post-activation `act(z)`.
    pub a: f64,
    /// `(a - y)^2`.
    pub loss: f64,
    /// `2(a - y)`.
    pub dl_da: f64,
    /// `act'(z)`.
    pub da_dz: f64,
    /// `dl_da · da_dz`.
    pub dl_dz: f64,
}

impl PointChain {
    /// `dL/dp` for a parameter whose local derivative is `dz_dparam`.
    ///
    /// Evaluated left to right as `dl_da · da_dz · dz_dparam`.
    #[inline]
    pub fn dl_dparam(&self, dz_dparam: f64) -> f64 {
        self.dl_dz * dz_dparam
    }
}

/// Forward pass `z = Σ w_j x_j + bias`, `a = act(z)`.
#[inline]
pub fn forward(weights: &[f64], bias: f64, x: &[f64], activation: Activation) -> (f64, f64) {
    debug_assert_eq!(weights.len(), x.len());

    let mut z = 0.0;
    for (&w, &xi) in weights.iter().zip(x) {
        z += w * xi;
    }
    z += bias;
    (z, activation.forward(z))
}

/// Run the forward pass for one point and expose every chain-rule factor.
#[inline]
pub fn decompose(
    weights: &[f64],
    bias: f64,
    x: &[f64],
    y_true: f64,
    activation: Activation,
) -> PointChain {
    let (z, a) = forward(weights, bias, x, activation);
    let dl_da = squared_error_grad(a, y_true);
    let da_dz = activation.derivative(z);
    PointChain {
        z,
        a,
        loss: squared_error(a, y_true),
        dl_da,
        da_dz,
        dl_dz: dl_da * da_dz,
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
/// One parameter's averaged chain-rule factors for a step.
pub struct ChainRuleComponent {
    /// `"w1"`, `"w2"`, ..., or `"b"`.
    pub param_name: String,
    #[cfg_attr(feature = "serde", serde(rename = "dL_da"))]
    pub dl_da: f64,
    pub da_dz: f64,
    pub dz_dparam: f64,
    /// Mean of the per-point products; equals the averaged gradient.
    #[cfg_attr(feature = "serde", serde(rename = "dL_dparam"))]
    pub dl_dparam: f64,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
/// Chain-rule components for every weight followed by the bias.
pub struct ChainRuleBreakdown {
    pub components: Vec<ChainRuleComponent>,
}

/// Dataset-mean of every per-point quantity for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainAverages {
    pub z: f64,
    pub a: f64,
    pub loss: f64,
    pub dl_da: f64,
    pub da_dz: f64,
    pub dl_dz: f64,
    /// Mean input per feature, i.e. mean `dz/dw_j`.
    pub dz_dw: Vec<f64>,
    /// Mean gradient per weight.
    pub dl_dw: Vec<f64>,
    /// Mean gradient for the bias.
    pub dl_db: f64,
}

impl ChainAverages {
    /// Per-parameter breakdown, weights named `w1..wF` then `b`.
    ///
    /// The factor columns are each a dataset mean. `dL_dparam` is the mean of
    /// the per-point products, which is the true gradient; it differs from the
    /// product of the mean factors whenever the factors vary across points.
    pub fn breakdown(&self) -> ChainRuleBreakdown {
        let mut components = Vec::with_capacity(self.dl_dw.len() + 1);
        for (j, (&dz, &dl)) in self.dz_dw.iter().zip(&self.dl_dw).enumerate() {
            components.push(ChainRuleComponent {
                param_name: format!("w{}", j + 1),
                dl_da: self.dl_da,
                da_dz: self.da_dz,
                dz_dparam: dz,
                dl_dparam: dl,
            });
        }
        components.push(ChainRuleComponent {
            param_name: "b".to_owned(),
            dl_da: self.dl_da,
            da_dz: self.da_dz,
            dz_dparam: 1.0,
            dl_dparam: self.dl_db,
        });
        ChainRuleBreakdown { components }
    }
}

/// Sums per-point chain terms in dataset order and divides once at the end.
#[derive(Debug, Clone)]
pub struct ChainAccumulator {
    count: usize,
    z: f64,
    a: f64,
    loss: f64,
    dl_da: f64,
    da_dz: f64,
    dl_dz: f64,
    dz_dw: Vec<f64>,
    dl_dw: Vec<f64>,
    dl_db: f64,
}

impl ChainAccumulator {
    pub fn new(num_features: usize) -> Self {
        Self {
            count: 0,
            z: 0.0,
            a: 0.0,
            loss: 0.0,
            dl_da: 0.0,
            da_dz: 0.0,
            dl_dz: 0.0,
            dz_dw: vec![0.0; num_features],
            dl_dw: vec![0.0; num_features],
            dl_db: 0.0,
        }
    }

    /// Add one point's terms. `x` must have `num_features` entries.
    pub fn push(&mut self, chain: &PointChain, x: &[f64]) {
        debug_assert_eq!(x.len(), self.dl_dw.len());

        self.count += 1;
        self.z += chain.z;
        self.a += chain.a;
        self.loss += chain.loss;
        self.dl_da += chain.dl_da;
        self.da_dz += chain.da_dz;
        self.dl_dz += chain.dl_dz;
        for j in 0..x.len() {
            self.dz_dw[j] += x[j];
            self.dl_dw[j] += chain.dl_dparam(x[j]);
        }
        self.dl_db += chain.dl_dparam(1.0);
    }

    /// Divide every sum by the number of points pushed.
    pub fn finish(self) -> ChainAverages {
        let n = self.count as f64;
        ChainAverages {
            z: self.z / n,
            a: self.a / n,
            loss: self.loss / n,
            dl_da: self.dl_da / n,
            da_dz: self.da_dz / n,
            dl_dz: self.dl_dz / n,
            dz_dw: self.dz_dw.into_iter().map(|v| v / n).collect(),
            dl_dw: self.dl_dw.into_iter().map(|v| v / n).collect(),
            dl_db: self.dl_db / n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_chain_reduces_to_linear_gradient() {
        // y_pred = 0.5 * 2 = 1, y = 3: dL/dw = 2 * (1 - 3) * 2 = -8.
        let c = decompose(&[0.5], 0.0, &[2.0], 3.0, Activation::Identity);
        assert_eq!(c.a, c.z);
        assert_eq!(c.da_dz, 1.0);
        assert_eq!(c.loss, 4.0);
        assert_eq!(c.dl_dparam(2.0), -8.0);
    }

    #[test]
    fn factors_multiply_to_parameter_gradient() {
        let w = [0.7, -1.2];
        let x = [0.4, 0.9];
        for act in Activation::ALL {
            let c = decompose(&w, 0.3, &x, 0.25, act);
            for &dz in x.iter().chain(std::iter::once(&1.0)) {
                assert_eq!(c.dl_da * c.da_dz * dz, c.dl_dparam(dz));
            }
        }
    }

    #[test]
    fn gradient_matches_finite_difference() {
        let w = [0.7, -1.2];
        let b = 0.3;
        let x = [0.4, 0.9];
        let y = 0.25;
        let h = 1e-6;
        for act in [Activation::Sigmoid, Activation::Tanh, Activation::Identity] {
            let c = decompose(&w, b, &x, y, act);
            for j in 0..w.len() {
                let mut wp = w;
                let mut wm = w;
                wp[j] += h;
                wm[j] -= h;
                let lp = decompose(&wp, b, &x, y, act).loss;
                let lm = decompose(&wm, b, &x, y, act).loss;
                let numeric = (lp - lm) / (2.0 * h);
                assert!((numeric - c.dl_dparam(x[j])).abs() < 1e-6);
            }
            let lp = decompose(&w, b + h, &x, y, act).loss;
            let lm = decompose(&w, b - h, &x, y, act).loss;
            assert!(((lp - lm) / (2.0 * h) - c.dl_dparam(1.0)).abs() < 1e-6);
        }
    }

    #[test]
    fn accumulator_averages_with_float_division() {
        let mut acc = ChainAccumulator::new(1);
        for (x, y) in [(1.0, 2.1), (2.0, 3.9)] {
            let c = decompose(&[0.0], 0.0, &[x], y, Activation::Identity);
            acc.push(&c, &[x]);
        }
        let avg = acc.finish();
        assert!((avg.loss - 9.81).abs() < 1e-9);
        assert!((avg.dl_dw[0] - (-9.9)).abs() < 1e-9);
        assert!((avg.dz_dw[0] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn breakdown_names_weights_then_bias() {
        let mut acc = ChainAccumulator::new(3);
        let x = [1.0, 2.0, 3.0];
        let c = decompose(&[0.1, 0.2, 0.3], 0.0, &x, 1.0, Activation::Sigmoid);
        acc.push(&c, &x);
        let names: Vec<_> = acc
            .finish()
            .breakdown()
            .components
            .into_iter()
            .map(|c| c.param_name)
            .collect();
        assert_eq!(names, ["w1", "w2", "w3", "b"]);
    }
}
