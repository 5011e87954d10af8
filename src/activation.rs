//! Activation functions.
//!
//! The neuron computes a pre-activation value `z = w·x + b` and then applies an
//! activation: `a = activation(z)`. The scalar and linear models use
//! [`Activation::Identity`] implicitly, so `a == z` and `da/dz == 1`.
//!
//! Unlike a batched network, every quantity here is recorded for display, so
//! derivatives are taken with respect to `z` directly rather than recovered
//! from cached outputs.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Derivatives with magnitude below this are treated as gradient-starved.
pub const SATURATION_THRESHOLD: f64 = 0.01;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
/// Element-wise activation function.
pub enum Activation {
    Identity,
    #[default]
    Sigmoid,
    ReLU,
    Tanh,
}

impl Activation {
    /// All supported activations, in display order.
    pub const ALL: [Activation; 4] = [
        Activation::Identity,
        Activation::Sigmoid,
        Activation::ReLU,
        Activation::Tanh,
    ];

    /// Lowercase name used on the wire (`"sigmoid"`, `"relu"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Activation::Identity => "identity",
            Activation::Sigmoid => "sigmoid",
            Activation::ReLU => "relu",
            Activation::Tanh => "tanh",
        }
    }

    /// Parse a name, falling back to sigmoid for anything unrecognized.
    ///
    /// This reproduces the behavior of older case files, where a typo in the
    /// activation name silently selected sigmoid. Prefer [`str::parse`], which
    /// rejects unknown names.
    pub fn parse_lenient(name: &str) -> Self {
        match name.parse() {
            Ok(act) => act,
            Err(_) => {
                tracing::warn!(name, "unknown activation name, falling back to sigmoid");
                Activation::Sigmoid
            }
        }
    }

    /// `a = activation(z)`.
    #[inline]
    pub fn forward(self, z: f64) -> f64 {
        match self {
            Activation::Identity => z,
            Activation::Sigmoid => sigmoid(z),
            Activation::ReLU => z.max(0.0),
            Activation::Tanh => z.tanh(),
        }
    }

    /// `da/dz` evaluated at `z`.
    ///
    /// ReLU is not differentiable at 0; its derivative there is taken to be 0.
    #[inline]
    pub fn derivative(self, z: f64) -> f64 {
        match self {
            Activation::Identity => 1.0,
            Activation::Sigmoid => {
                let a = sigmoid(z);
                a * (1.0 - a)
            }
            Activation::ReLU => {
                if z > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Tanh => {
                let t = z.tanh();
                1.0 - t * t
            }
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Activation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "identity" | "linear" => Ok(Activation::Identity),
            "sigmoid" => Ok(Activation::Sigmoid),
            "relu" => Ok(Activation::ReLU),
            "tanh" => Ok(Activation::Tanh),
            other => Err(Error::InvalidConfig(format!(
                "unknown activation {other:?}; expected one of identity, sigmoid, relu, tanh"
            ))),
        }
    }
}

/// True when `|derivative| < 0.01`: the activation passes back almost no gradient.
#[inline]
pub fn is_saturated(derivative: f64) -> bool {
    derivative.abs() < SATURATION_THRESHOLD
}

#[inline]
fn sigmoid(z: f64) -> f64 {
    // Numerically stable sigmoid.
    if z >= 0.0 {
        let e = (-z).exp();
        1.0 / (1.0 + e)
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
