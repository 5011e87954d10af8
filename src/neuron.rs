//! Single neuron: `z = w·x + b`, `a = act(z)`, `L = (a - y)^2`.
//!
//! This is the richest trace. Every point records its full chain-rule
//! breakdown and whether the activation is saturated there; every step adds
//! the dataset-mean pre/post activation, the averaged chain-rule factors per
//! parameter, and a step-level saturation flag taken from the mean `act'(z)`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::activation::is_saturated;
use crate::chain::{self, ChainAccumulator, ChainAverages, ChainRuleBreakdown};
use crate::data::{Dataset, NeuronPoint};
use crate::loss;
use crate::train::{Model, Schedule, StepOutcome, Trainer, TrainingRun};
use crate::{Activation, Error, Result};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
/// Trainable values: one weight per feature and a bias.
pub struct NeuronParams {
    pub w: Vec<f64>,
    pub b: f64,
}

impl NeuronParams {
    pub fn new(w: Vec<f64>, b: f64) -> Self {
        Self { w, b }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NeuronGrads {
    pub grad_w: Vec<f64>,
    pub grad_b: f64,
}

impl NeuronGrads {
    /// `||∇L||` over all weights and the bias.
    pub fn magnitude(&self) -> f64 {
        l2_norm(&self.grad_w, self.grad_b)
    }
}

fn l2_norm(v: &[f64], extra: f64) -> f64 {
    let sum_sq: f64 = v.iter().map(|g| g * g).sum();
    (sum_sq + extra * extra).sqrt()
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
/// Forward and backward pass for one point.
pub struct PointSnapshotNeuron {
    pub index: usize,
    pub x: Vec<f64>,
    pub y_true: f64,
    pub z: f64,
    pub a: f64,
    pub loss: f64,
    #[cfg_attr(feature = "serde", serde(rename = "dL_da"))]
    pub dl_da: f64,
    pub da_dz: f64,
    #[cfg_attr(feature = "serde", serde(rename = "dL_dz"))]
    pub dl_dz: f64,
    pub dz_dw: Vec<f64>,
    #[cfg_attr(feature = "serde", serde(rename = "dL_dw"))]
    pub dl_dw: Vec<f64>,
    #[cfg_attr(feature = "serde", serde(rename = "dL_db"))]
    pub dl_db: f64,
    pub in_saturation: bool,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateDetailsNeuron {
    pub params_old: NeuronParams,
    pub learning_rate: f64,
    pub grads: NeuronGrads,
    pub gradient_magnitude: f64,
    /// `-lr·grad_w`
    pub update_w: Vec<f64>,
    /// `-lr·grad_b`
    pub update_b: f64,
    /// L2 norm of `(update_w, update_b)`.
    pub step_size: f64,
    pub params_new: NeuronParams,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct NeuronSnapshot {
    pub step: usize,
    /// Parameters that produced this step's loss and gradients.
    pub params: NeuronParams,
    pub grads: NeuronGrads,
    /// Mean pre-activation.
    pub z: f64,
    /// Mean post-activation.
    pub a: f64,
    #[cfg_attr(feature = "serde", serde(rename = "dL_dz"))]
    pub dl_dz: f64,
    #[cfg_attr(feature = "serde", serde(rename = "dL_da"))]
    pub dl_da: f64,
    /// Mean `act'(z)`.
    pub local_derivative: f64,
    pub activation: Activation,
    pub in_saturation_zone: bool,
    pub loss: f64,
    pub point_details: Vec<PointSnapshotNeuron>,
    pub update_components: UpdateDetailsNeuron,
    pub chain_rule_breakdown: ChainRuleBreakdown,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
/// Hyperparameters for a neuron run; initial parameters are passed separately.
pub struct TrainingConfig {
    pub learning_rate: f64,
    pub num_steps: usize,
    pub activation: Activation,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            num_steps: 100,
            activation: Activation::Sigmoid,
        }
    }
}

impl TrainingConfig {
    pub fn schedule(&self) -> Schedule {
        Schedule {
            lr: self.learning_rate,
            steps: self.num_steps,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.schedule().validate()
    }
}

/// Initial or current parameters must have one weight per feature and be finite.
fn check_params(data: &Dataset<NeuronPoint>, params: &NeuronParams) -> Result<()> {
    if params.w.len() != data.num_features() {
        return Err(Error::InvalidConfig(format!(
            "weights have {} entries, dataset has {} features",
            params.w.len(),
            data.num_features()
        )));
    }
    if params.w.iter().any(|v| !v.is_finite()) || !params.b.is_finite() {
        return Err(Error::InvalidConfig("weights and bias must be finite".to_owned()));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A neuron with a fixed activation. Parameters live with the caller.
pub struct Neuron {
    activation: Activation,
}

impl Neuron {
    pub fn new(activation: Activation) -> Self {
        Self { activation }
    }

    #[inline]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// `(z, a)` for one input vector.
    pub fn forward(&self, params: &NeuronParams, x: &[f64]) -> Result<(f64, f64)> {
        if params.w.len() != x.len() {
            return Err(Error::InvalidData(format!(
                "input has {} features, weights have {} entries",
                x.len(),
                params.w.len()
            )));
        }
        Ok(chain::forward(&params.w, params.b, x, self.activation))
    }

    /// Dataset-mean loss at `params`.
    pub fn average_loss(&self, data: &Dataset<NeuronPoint>, params: &NeuronParams) -> Result<f64> {
        check_params(data, params)?;
        let mut mean = loss::Mean::default();
        for p in data {
            let (_, a) = chain::forward(&params.w, params.b, &p.x, self.activation);
            mean.push(loss::squared_error(a, p.y));
        }
        Ok(mean.get())
    }

    /// Per-point breakdowns and their dataset averages at `params`.
    pub fn decompose(
        &self,
        data: &Dataset<NeuronPoint>,
        params: &NeuronParams,
    ) -> Result<(Vec<PointSnapshotNeuron>, ChainAverages)> {
        check_params(data, params)?;
        Ok(self.decompose_checked(data, params))
    }

    /// Averaged gradients at `params`.
    pub fn gradients(
        &self,
        data: &Dataset<NeuronPoint>,
        params: &NeuronParams,
    ) -> Result<NeuronGrads> {
        let (_, avg) = self.decompose(data, params)?;
        Ok(NeuronGrads {
            grad_w: avg.dl_dw,
            grad_b: avg.dl_db,
        })
    }

    // Caller guarantees `params.w.len() == data.num_features()`.
    fn decompose_checked(
        &self,
        data: &Dataset<NeuronPoint>,
        params: &NeuronParams,
    ) -> (Vec<PointSnapshotNeuron>, ChainAverages) {
        let mut acc = ChainAccumulator::new(params.w.len());
        let mut points = Vec::with_capacity(data.len());

        for (index, p) in data.iter().enumerate() {
            let c = chain::decompose(&params.w, params.b, &p.x, p.y, self.activation);
            acc.push(&c, &p.x);
            points.push(PointSnapshotNeuron {
                index,
                x: p.x.clone(),
                y_true: p.y,
                z: c.z,
                a: c.a,
                loss: c.loss,
                dl_da: c.dl_da,
                da_dz: c.da_dz,
                dl_dz: c.dl_dz,
                dz_dw: p.x.clone(),
                dl_dw: p.x.iter().map(|&xj| c.dl_dparam(xj)).collect(),
                dl_db: c.dl_dparam(1.0),
                in_saturation: is_saturated(c.da_dz),
            });
        }

        (points, acc.finish())
    }
}

impl Model for Neuron {
    type Point = NeuronPoint;
    type Params = NeuronParams;
    type Snapshot = NeuronSnapshot;

    fn name(&self) -> &'static str {
        "neuron"
    }

    fn validate_params(&self, data: &Dataset<NeuronPoint>, params: &NeuronParams) -> Result<()> {
        check_params(data, params)
    }

    fn trace_step(
        &self,
        step: usize,
        data: &Dataset<NeuronPoint>,
        params: &NeuronParams,
        lr: f64,
    ) -> StepOutcome<NeuronSnapshot, NeuronParams> {
        let (point_details, avg) = self.decompose_checked(data, params);
        let chain_rule_breakdown = avg.breakdown();

        let grads = NeuronGrads {
            grad_w: avg.dl_dw.clone(),
            grad_b: avg.dl_db,
        };
        let gradient_magnitude = grads.magnitude();

        let update_w: Vec<f64> = grads.grad_w.iter().map(|g| -lr * g).collect();
        let update_b = -lr * grads.grad_b;
        let next = NeuronParams {
            w: params.w.iter().zip(&update_w).map(|(w, u)| w + u).collect(),
            b: params.b + update_b,
        };

        let snapshot = NeuronSnapshot {
            step,
            params: params.clone(),
            grads: grads.clone(),
            z: avg.z,
            a: avg.a,
            dl_dz: avg.dl_dz,
            dl_da: avg.dl_da,
            local_derivative: avg.da_dz,
            activation: self.activation,
            in_saturation_zone: is_saturated(avg.da_dz),
            loss: avg.loss,
            point_details,
            update_components: UpdateDetailsNeuron {
                params_old: params.clone(),
                learning_rate: lr,
                grads,
                gradient_magnitude,
                step_size: l2_norm(&update_w, update_b),
                update_w,
                update_b,
                params_new: next.clone(),
            },
            chain_rule_breakdown,
        };

        StepOutcome {
            snapshot,
            next,
            loss: avg.loss,
            grad_norm: gradient_magnitude,
        }
    }
}

/// Run a neuron trace from `init` using `cfg`.
pub fn train(
    data: &Dataset<NeuronPoint>,
    init: &NeuronParams,
    cfg: &TrainingConfig,
) -> Result<TrainingRun<NeuronSnapshot>> {
    cfg.validate()?;
    Trainer::new(Neuron::new(cfg.activation), cfg.schedule())?.run(data, init)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_data() -> Dataset<NeuronPoint> {
        let pts = [(0.0, 0.0, 0.1), (1.0, 0.0, 0.6), (0.0, 1.0, 0.4), (1.0, 1.0, 0.9)]
            .into_iter()
            .map(|(x1, x2, y)| NeuronPoint::new(vec![x1, x2], y))
            .collect();
        Dataset::new(pts).unwrap()
    }

    #[test]
    fn large_weights_saturate_sigmoid() {
        let data = grid_data();
        let params = NeuronParams::new(vec![5.0, 5.0], 2.0);
        let (points, _) = Neuron::new(Activation::Sigmoid).decompose(&data, &params).unwrap();
        // z = 12 at (1, 1): a ≈ 1, da/dz ≈ 6e-6.
        let p = &points[3];
        assert!(p.z > 10.0);
        assert!(p.a > 0.9999);
        assert!(p.in_saturation);
        // z = 2 at the origin is outside the saturation zone.
        assert!(!points[0].in_saturation);
    }

    #[test]
    fn per_point_factors_multiply_to_gradients() {
        let data = grid_data();
        let params = NeuronParams::new(vec![0.3, -0.4], 0.1);
        for act in Activation::ALL {
            let (points, _) = Neuron::new(act).decompose(&data, &params).unwrap();
            for p in &points {
                assert_eq!(p.dl_dz, p.dl_da * p.da_dz);
                for j in 0..p.x.len() {
                    assert_eq!(p.dl_da * p.da_dz * p.dz_dw[j], p.dl_dw[j]);
                }
                assert_eq!(p.dl_da * p.da_dz * 1.0, p.dl_db);
            }
        }
    }

    #[test]
    fn breakdown_dl_dparam_is_the_gradient() {
        let data = grid_data();
        let params = NeuronParams::new(vec![0.3, -0.4], 0.1);
        let neuron = Neuron::new(Activation::Tanh);
        let grads = neuron.gradients(&data, &params).unwrap();
        let (_, avg) = neuron.decompose(&data, &params).unwrap();
        let comps = avg.breakdown().components;
        assert_eq!(comps.len(), 3);
        assert_eq!(comps[0].dl_dparam, grads.grad_w[0]);
        assert_eq!(comps[1].dl_dparam, grads.grad_w[1]);
        assert_eq!(comps[2].dl_dparam, grads.grad_b);
        assert_eq!(comps[2].dz_dparam, 1.0);
    }

    #[test]
    fn update_arithmetic_is_recorded() {
        let data = grid_data();
        let init = NeuronParams::new(vec![0.2, 0.2], 0.0);
        let cfg = TrainingConfig {
            learning_rate: 0.5,
            num_steps: 3,
            activation: Activation::Sigmoid,
        };
        let run = train(&data, &init, &cfg).unwrap();
        assert_eq!(run.snapshots()[0].params, init);

        for s in &run {
            let u = &s.update_components;
            assert_eq!(u.params_old, s.params);
            for j in 0..2 {
                assert_eq!(u.update_w[j], -0.5 * s.grads.grad_w[j]);
                assert_eq!(u.params_new.w[j], s.params.w[j] + u.update_w[j]);
            }
            assert_eq!(u.params_new.b, s.params.b + u.update_b);
            assert!((u.step_size - 0.5 * u.gradient_magnitude).abs() < 1e-12);
        }
    }

    #[test]
    fn dead_relu_does_not_move() {
        let data = grid_data();
        let init = NeuronParams::new(vec![-1.0, -1.0], -1.0);
        let cfg = TrainingConfig {
            learning_rate: 0.5,
            num_steps: 5,
            activation: Activation::ReLU,
        };
        let run = train(&data, &init, &cfg).unwrap();
        for s in &run {
            assert!(s.in_saturation_zone);
            assert_eq!(s.params, init);
            assert_eq!(s.grads.magnitude(), 0.0);
        }
    }

    #[test]
    fn sigmoid_learns_the_grid() {
        let data = grid_data();
        let init = NeuronParams::new(vec![0.0, 0.0], 0.0);
        let cfg = TrainingConfig {
            learning_rate: 1.0,
            num_steps: 500,
            activation: Activation::Sigmoid,
        };
        let run = train(&data, &init, &cfg).unwrap();
        let first = run.snapshots()[0].loss;
        let last = run.last().unwrap().loss;
        assert!(last < first * 0.1, "loss {first} -> {last}");
    }

    #[test]
    fn rejects_mismatched_weight_count() {
        let data = grid_data();
        let init = NeuronParams::new(vec![0.0], 0.0);
        let err = train(&data, &init, &TrainingConfig::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn gradient_magnitude_covers_weights_and_bias() {
        let grads = NeuronGrads {
            grad_w: vec![3.0, 0.0],
            grad_b: 4.0,
        };
        assert_eq!(grads.magnitude(), 5.0);

        let init = NeuronParams::new(vec![0.3, -0.4], 0.1);
        let run = train(&grid_data(), &init, &TrainingConfig::default()).unwrap();
        for s in &run {
            assert_eq!(s.update_components.gradient_magnitude, s.grads.magnitude());
        }
    }

    #[test]
    fn helpers_reject_too_few_weights() {
        let data = grid_data();
        let short = NeuronParams::new(vec![0.1], 0.0);
        let neuron = Neuron::new(Activation::Sigmoid);
        assert!(matches!(neuron.gradients(&data, &short), Err(Error::InvalidConfig(_))));
        assert!(neuron.decompose(&data, &short).is_err());
        assert!(neuron.average_loss(&data, &short).is_err());
        assert!(neuron.forward(&short, &[0.5, 0.5]).is_err());
    }

    #[test]
    fn helpers_reject_too_many_weights() {
        let data = grid_data();
        let long = NeuronParams::new(vec![0.1, 0.2, 0.3], 0.0);
        let neuron = Neuron::new(Activation::Sigmoid);
        assert!(matches!(neuron.gradients(&data, &long), Err(Error::InvalidConfig(_))));
        assert!(neuron.decompose(&data, &long).is_err());
        assert!(neuron.average_loss(&data, &long).is_err());
        assert!(matches!(
            neuron.forward(&long, &[0.5, 0.5]),
            Err(Error::InvalidData(_))
        ));

        let nan = NeuronParams::new(vec![0.1, f64::NAN], 0.0);
        assert!(neuron.gradients(&data, &nan).is_err());
    }

    #[test]
    fn helpers_agree_with_the_trace() {
        let data = grid_data();
        let params = NeuronParams::new(vec![0.3, -0.4], 0.1);
        let neuron = Neuron::new(Activation::Tanh);
        let cfg = TrainingConfig {
            learning_rate: 0.1,
            num_steps: 1,
            activation: Activation::Tanh,
        };
        let run = train(&data, &params, &cfg).unwrap();
        let s = &run.snapshots()[0];
        assert_eq!(neuron.gradients(&data, &params).unwrap(), s.grads);
        assert!((neuron.average_loss(&data, &params).unwrap() - s.loss).abs() < 1e-12);
        let (z, _) = neuron.forward(&params, &data.points()[0].x).unwrap();
        assert_eq!(z, s.point_details[0].z);
    }
}
