//! Squared-error loss.
//!
//! Every model in this crate is scored per point with `L = (a - y_true)^2`
//! and per step with the arithmetic mean of that over the dataset. Note there
//! is no `0.5` factor, so `dL/da = 2 (a - y_true)`.

/// Single-point loss: `(pred - target)^2`.
#[inline]
pub fn squared_error(pred: f64, target: f64) -> f64 {
    let diff = pred - target;
    diff * diff
}

/// `dL/d(pred)` for [`squared_error`]: `2 (pred - target)`.
#[inline]
pub fn squared_error_grad(pred: f64, target: f64) -> f64 {
    2.0 * (pred - target)
}

/// Running sum that reports its arithmetic mean.
///
/// The count is divided as `f64`, never as an integer.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    #[inline]
    pub(crate) fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    #[inline]
    pub(crate) fn get(&self) -> f64 {
        self.sum / self.count as f64
    }
}
