//! Estimators that learn models from datasets.

mod logistic_cost;
mod logistic_regression;

pub use logistic_regression::{
    HasLogisticRegressionParams, LogisticRegression, LogisticRegressionParams,
};
