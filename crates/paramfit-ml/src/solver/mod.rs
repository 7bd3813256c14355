//! Numerical optimizers used by the estimators.

pub mod lbfgs;

use crate::error::MlResult;

/// A differentiable objective.
pub trait DiffFunction {
    /// Returns the objective value and its gradient at `x`.
    fn calculate(&self, x: &[f64]) -> MlResult<(f64, Vec<f64>)>;
}
