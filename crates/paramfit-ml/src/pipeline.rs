//! The estimator, transformer and model abstractions.

use crate::dataset::Dataset;
use crate::error::MlResult;
use crate::param::{ParamMap, Params};

/// Learns a [`Model`] from a dataset.
pub trait Estimator: Params {
    type Model: Model;

    /// Fits a model using the estimator's own parameter values with `extra` applied on top.
    ///
    /// The overrides are scoped to this call and the estimator itself is never modified.
    fn fit_with(&self, dataset: &Dataset, extra: &ParamMap) -> MlResult<Self::Model>;

    fn fit(&self, dataset: &Dataset) -> MlResult<Self::Model> {
        self.fit_with(dataset, &ParamMap::new())
    }

    /// Fits one model per parameter map.
    fn fit_multiple(&self, dataset: &Dataset, maps: &[ParamMap]) -> MlResult<Vec<Self::Model>> {
        maps.iter().map(|m| self.fit_with(dataset, m)).collect()
    }
}

/// Maps an input dataset to an output dataset, usually by appending columns.
pub trait Transformer: Params {
    fn transform_with(&self, dataset: &Dataset, extra: &ParamMap) -> MlResult<Dataset>;

    fn transform(&self, dataset: &Dataset) -> MlResult<Dataset> {
        self.transform_with(dataset, &ParamMap::new())
    }
}

/// A transformer produced by an [`Estimator`].
pub trait Model: Transformer {
    /// The uid of the estimator that produced this model.
    fn parent(&self) -> &str;
}
