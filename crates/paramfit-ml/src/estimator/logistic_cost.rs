//! Weighted binary logistic loss evaluated over partitions.
//!
//! Coefficients live in the scaled feature space where each feature is divided by its
//! standard deviation. The intercept, when fitted, is the last coefficient.

use std::sync::Arc;

use paramfit_common::runtime::RuntimeHandle;

use crate::error::MlResult;
use crate::execution::execute_partitions;
use crate::solver::DiffFunction;
use crate::stat::Instance;

/// `ln(1 + e^x)` without overflow.
fn log1p_exp(x: f64) -> f64 {
    if x > 0.0 {
        x + (-x).exp().ln_1p()
    } else {
        x.exp().ln_1p()
    }
}

pub(crate) struct LogisticCostFunction {
    runtime: RuntimeHandle,
    partitions: Vec<Arc<Vec<Instance>>>,
    feature_std: Arc<Vec<f64>>,
    fit_intercept: bool,
    weight_sum: f64,
    reg_l2: f64,
    standardization: bool,
}

impl LogisticCostFunction {
    pub fn new(
        runtime: RuntimeHandle,
        partitions: Vec<Arc<Vec<Instance>>>,
        feature_std: Vec<f64>,
        fit_intercept: bool,
        weight_sum: f64,
        reg_l2: f64,
        standardization: bool,
    ) -> Self {
        Self {
            runtime,
            partitions,
            feature_std: Arc::new(feature_std),
            fit_intercept,
            weight_sum,
            reg_l2,
            standardization,
        }
    }

    fn num_features(&self) -> usize {
        self.feature_std.len()
    }
}

/// Sums the loss and gradient of one partition.
fn partition_loss(
    instances: &[Instance],
    coefficients: &[f64],
    feature_std: &[f64],
    fit_intercept: bool,
) -> (f64, Vec<f64>) {
    let n = feature_std.len();
    let mut loss = 0.0;
    let mut gradient = vec![0.0; coefficients.len()];
    for instance in instances.iter().filter(|i| i.weight != 0.0) {
        let mut dot = 0.0;
        for j in 0..n {
            if feature_std[j] != 0.0 {
                dot += coefficients[j] * instance.features[j] / feature_std[j];
            }
        }
        if fit_intercept {
            dot += coefficients[n];
        }
        let margin = -dot;
        let multiplier = instance.weight * (1.0 / (1.0 + margin.exp()) - instance.label);
        for j in 0..n {
            if feature_std[j] != 0.0 {
                gradient[j] += multiplier * instance.features[j] / feature_std[j];
            }
        }
        if fit_intercept {
            gradient[n] += multiplier;
        }
        loss += if instance.label > 0.0 {
            instance.weight * log1p_exp(margin)
        } else {
            instance.weight * (log1p_exp(margin) - margin)
        };
    }
    (loss, gradient)
}

impl DiffFunction for LogisticCostFunction {
    fn calculate(&self, x: &[f64]) -> MlResult<(f64, Vec<f64>)> {
        let coefficients = Arc::new(x.to_vec());
        let feature_std = Arc::clone(&self.feature_std);
        let fit_intercept = self.fit_intercept;
        let outputs = execute_partitions(
            &self.runtime,
            self.partitions.clone(),
            move |instances: Arc<Vec<Instance>>| {
                Ok(partition_loss(
                    &instances,
                    &coefficients,
                    &feature_std,
                    fit_intercept,
                ))
            },
        )?;

        let mut loss = 0.0;
        let mut gradient = vec![0.0; x.len()];
        for (partition_loss, partition_gradient) in outputs {
            loss += partition_loss;
            for (g, p) in gradient.iter_mut().zip(partition_gradient) {
                *g += p;
            }
        }
        loss /= self.weight_sum;
        gradient.iter_mut().for_each(|g| *g /= self.weight_sum);

        if self.reg_l2 != 0.0 {
            for j in 0..self.num_features() {
                let c = x[j];
                let scaled = if self.standardization {
                    c
                } else if self.feature_std[j] != 0.0 {
                    c / (self.feature_std[j] * self.feature_std[j])
                } else {
                    0.0
                };
                loss += 0.5 * self.reg_l2 * c * scaled;
                gradient[j] += self.reg_l2 * scaled;
            }
        }
        Ok((loss, gradient))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log1p_exp() {
        assert!((log1p_exp(0.0) - 2f64.ln()).abs() < 1e-15);
        assert_eq!(log1p_exp(1000.0), 1000.0);
        assert!(log1p_exp(-1000.0) >= 0.0);
    }

    #[test]
    fn test_partition_loss_matches_finite_differences() {
        let instances = vec![
            Instance {
                label: 1.0,
                weight: 1.0,
                features: vec![0.5, -1.0],
            },
            Instance {
                label: 0.0,
                weight: 2.0,
                features: vec![1.5, 0.25],
            },
        ];
        let std = vec![1.0, 0.5];
        let x = vec![0.3, -0.2, 0.1];
        let (_, gradient) = partition_loss(&instances, &x, &std, true);
        let eps = 1e-6;
        for k in 0..x.len() {
            let mut plus = x.clone();
            plus[k] += eps;
            let mut minus = x.clone();
            minus[k] -= eps;
            let (lp, _) = partition_loss(&instances, &plus, &std, true);
            let (lm, _) = partition_loss(&instances, &minus, &std, true);
            let numeric = (lp - lm) / (2.0 * eps);
            assert!((numeric - gradient[k]).abs() < 1e-6, "{numeric} vs {}", gradient[k]);
        }
    }
}
