//! Estimators, transformers and params over in-memory Arrow datasets.

pub mod dataset;
pub mod error;
pub mod estimator;
mod execution;
pub mod identifiable;
pub mod linalg;
pub mod model;
pub mod param;
pub mod pipeline;
pub mod session;
pub mod solver;
mod stat;

pub mod prelude {
    pub use crate::dataset::{Dataset, Row, Value};
    pub use crate::error::{MlError, MlResult};
    pub use crate::estimator::{HasLogisticRegressionParams, LogisticRegression};
    pub use crate::linalg::{DenseVector, Vectors};
    pub use crate::model::LogisticRegressionModel;
    pub use crate::param::{Param, ParamMap, Params};
    pub use crate::pipeline::{Estimator, Model, Transformer};
    pub use crate::session::MlSession;
}
