//! Training examples and the validated dataset that holds them.
//!
//! A [`Dataset`] is checked once, when it is built: it must be non-empty, every
//! value must be finite, and every point must carry the same number of input
//! features. Trainers borrow the points and never copy or mutate them.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A single supervised training example.
pub trait Point: Clone + std::fmt::Debug {
    /// Number of input features carried by this point.
    fn num_features(&self) -> usize;

    /// Reject non-finite values, naming the offending field.
    ///
    /// `index` is the point's position in the dataset, used in the message.
    fn check_finite(&self, index: usize) -> Result<()>;
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
/// Example for the one-parameter model `y = w·x`.
pub struct DataPoint {
    pub x: f64,
    pub y_true: f64,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
/// Example for the two-parameter model `y = w1·x1 + w2·x2`.
pub struct DataPoint2D {
    pub x1: f64,
    pub x2: f64,
    pub y_true: f64,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
/// Example for the single neuron: `F` input features and a scalar target.
pub struct NeuronPoint {
    pub x: Vec<f64>,
    pub y: f64,
}

impl DataPoint {
    pub fn new(x: f64, y_true: f64) -> Self {
        Self { x, y_true }
    }
}

impl DataPoint2D {
    pub fn new(x1: f64, x2: f64, y_true: f64) -> Self {
        Self { x1, x2, y_true }
    }
}

impl NeuronPoint {
    pub fn new(x: Vec<f64>, y: f64) -> Self {
        Self { x, y }
    }
}

fn finite(index: usize, field: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidData(format!(
            "point {index} has invalid {field} value: {value}"
        )))
    }
}

impl Point for DataPoint {
    fn num_features(&self) -> usize {
        1
    }

    fn check_finite(&self, index: usize) -> Result<()> {
        finite(index, "x", self.x)?;
        finite(index, "y_true", self.y_true)
    }
}

impl Point for DataPoint2D {
    fn num_features(&self) -> usize {
        2
    }

    fn check_finite(&self, index: usize) -> Result<()> {
        finite(index, "x1", self.x1)?;
        finite(index, "x2", self.x2)?;
        finite(index, "y_true", self.y_true)
    }
}

impl Point for NeuronPoint {
    fn num_features(&self) -> usize {
        self.x.len()
    }

    fn check_finite(&self, index: usize) -> Result<()> {
        for (j, &v) in self.x.iter().enumerate() {
            finite(index, &format!("x[{j}]"), v)?;
        }
        finite(index, "y", self.y)
    }
}

/// A validated, non-empty collection of training points.
///
/// Iteration order is the construction order; snapshots preserve it.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset<P> {
    points: Vec<P>,
    num_features: usize,
}

impl<P: Point> Dataset<P> {
    /// Validate and wrap `points`.
    pub fn new(points: Vec<P>) -> Result<Self> {
        let num_features = match points.first() {
            Some(p) => p.num_features(),
            None => return Err(Error::InvalidData("dataset is empty".to_owned())),
        };
        if num_features == 0 {
            return Err(Error::InvalidData(
                "points must have at least one feature".to_owned(),
            ));
        }

        for (i, p) in points.iter().enumerate() {
            if p.num_features() != num_features {
                return Err(Error::InvalidData(format!(
                    "point {i} has {} features, expected {num_features}",
                    p.num_features()
                )));
            }
            p.check_finite(i)?;
        }

        Ok(Self {
            points,
            num_features,
        })
    }

    #[inline]
    /// Returns the number of points (always > 0).
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    /// Returns the shared per-point feature count.
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    #[inline]
    pub fn points(&self) -> &[P] {
        &self.points
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, P> {
        self.points.iter()
    }

    /// Consume the dataset and return its points.
    pub fn into_points(self) -> Vec<P> {
        self.points
    }
}

impl<P: Point> TryFrom<Vec<P>> for Dataset<P> {
    type Error = Error;

    fn try_from(points: Vec<P>) -> Result<Self> {
        Self::new(points)
    }
}

impl<'a, P> IntoIterator for &'a Dataset<P> {
    type Item = &'a P;
    type IntoIter = std::slice::Iter<'a, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
