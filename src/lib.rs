//! Instrumented gradient descent for teaching.
//!
//! `gd-trace` runs tiny regression models step by step and records, at every
//! step, the full arithmetic behind the parameter update: per-point
//! predictions and losses, every chain-rule factor, the averaged gradient and
//! the literal `new = old - lr·grad` update. A visualization layer can replay
//! the resulting [`TrainingRun`] to show *why* each parameter moved.
//!
//! # Models
//!
//! - [`scalar`]: one weight, `y = w·x`.
//! - [`linear`]: two weights, `y = w1·x1 + w2·x2`, plus gradient magnitude and
//!   direction, and a [`surface`] sampler for loss contours.
//! - [`neuron`]: `a = act(w·x + b)` with a selectable [`Activation`], per-point
//!   chain-rule breakdowns and saturation flags.
//!
//! # Snapshot ordering
//!
//! A step snapshot always holds the parameters that *produced* its loss and
//! gradient. The post-update values appear only in its `update_components`,
//! and equal the parameters of the next snapshot.
//!
//! # Errors vs divergence
//!
//! Datasets and configs are validated once, before the first step, and
//! rejected with [`Error`]. Once stepping starts nothing is checked: a learning
//! rate that blows up produces `NaN`/`Inf` in the snapshots rather than an
//! error, so divergence can be shown.
//!
//! # Determinism
//!
//! Training is single-threaded and uses no randomness. Identical inputs give
//! bit-identical traces. Random datasets come only from [`generate`], which
//! always takes a seed.
//!
//! # Quick start
//!
//! ```rust
//! use gd_trace::data::{DataPoint, Dataset};
//! use gd_trace::scalar;
//!
//! # fn main() -> gd_trace::Result<()> {
//! let data = Dataset::new(vec![DataPoint::new(1.0, 2.1), DataPoint::new(2.0, 3.9)])?;
//! let run = scalar::train(
//!     &data,
//!     &scalar::TrainingConfig {
//!         w_init: 0.0,
//!         lr: 0.01,
//!         steps: 1,
//!     },
//! )?;
//!
//! let step = &run.snapshots()[0];
//! assert!((step.grad_w - -9.9).abs() < 1e-9);
//! assert!((step.update_components.w_new - 0.099).abs() < 1e-12);
//! # Ok(())
//! # }
//! ```
//!
//! # Neuron trace
//!
//! ```rust
//! use gd_trace::data::{Dataset, NeuronPoint};
//! use gd_trace::neuron::{self, NeuronParams};
//! use gd_trace::Activation;
//!
//! # fn main() -> gd_trace::Result<()> {
//! let data = Dataset::new(vec![
//!     NeuronPoint::new(vec![0.2, 0.9], 1.0),
//!     NeuronPoint::new(vec![0.7, 0.1], 0.0),
//! ])?;
//! let cfg = neuron::TrainingConfig {
//!     learning_rate: 0.5,
//!     num_steps: 10,
//!     activation: "tanh".parse::<Activation>()?,
//! };
//! let run = neuron::train(&data, &NeuronParams::new(vec![0.1, -0.1], 0.0), &cfg)?;
//! for step in &run {
//!     let b = &step.chain_rule_breakdown.components[2];
//!     assert_eq!(b.param_name, "b");
//!     assert_eq!(b.dl_dparam, step.grads.grad_b);
//! }
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod chain;
pub mod data;
pub mod error;
pub mod generate;
pub mod linear;
pub mod loss;
pub mod neuron;
pub mod scalar;
pub mod surface;
pub mod train;

#[cfg(feature = "serde")]
pub mod serde_trace;

pub use activation::{Activation, is_saturated};
pub use data::{DataPoint, DataPoint2D, Dataset, NeuronPoint};
pub use error::{Error, Result};
pub use linear::{LinearModel, LinearParams, LinearSnapshot};
pub use neuron::{Neuron, NeuronParams, NeuronSnapshot};
pub use scalar::ScalarModel;
pub use surface::{LossGrid, LossGridConfig, compute_loss_grid};
pub use train::{Model, Schedule, StepOutcome, Trainer, TrainingRun};
