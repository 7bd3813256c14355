//! Trained ML models.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field};
use log::warn;

use crate::dataset::column::{is_vector_type, vector_array, vector_column, vector_data_type};
use crate::dataset::Dataset;
use crate::error::{MlError, MlResult};
use crate::estimator::{HasLogisticRegressionParams, LogisticRegressionParams};
use crate::linalg::DenseVector;
use crate::param::{Param, ParamMap, ParamSet, ParamType, Params};
use crate::pipeline::{Model, Transformer};

/// Statistics collected while training a [`LogisticRegressionModel`].
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegressionTrainingSummary {
    objective_history: Vec<f64>,
    total_iterations: usize,
}

impl LogisticRegressionTrainingSummary {
    /// Creates a summary from the objective history and iteration count.
    pub fn new(objective_history: Vec<f64>, total_iterations: usize) -> Self {
        Self {
            objective_history,
            total_iterations,
        }
    }

    /// The objective value at the start and after each iteration.
    pub fn objective_history(&self) -> &[f64] {
        &self.objective_history
    }

    /// The number of solver iterations run.
    pub fn total_iterations(&self) -> usize {
        self.total_iterations
    }
}

/// A trained binary logistic regression model.
///
/// The model shares the uid of the estimator that produced it, and carries a snapshot of
/// the parameter values used for training.
#[derive(Debug, Clone)]
pub struct LogisticRegressionModel {
    params: LogisticRegressionParams,
    coefficients: DenseVector,
    intercept: f64,
    summary: LogisticRegressionTrainingSummary,
}

impl LogisticRegressionModel {
    /// Creates a model from trained coefficients and the parameters used to fit it.
    pub fn new(
        params: LogisticRegressionParams,
        coefficients: DenseVector,
        intercept: f64,
        summary: LogisticRegressionTrainingSummary,
    ) -> Self {
        Self {
            params,
            coefficients,
            intercept,
            summary,
        }
    }

    /// The model coefficients.
    pub fn coefficients(&self) -> &DenseVector {
        &self.coefficients
    }

    /// The model intercept.
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// The number of features the model was trained on.
    pub fn num_features(&self) -> usize {
        self.coefficients.size()
    }

    /// The number of classes, always 2.
    pub fn num_classes(&self) -> usize {
        2
    }

    /// The training summary.
    pub fn summary(&self) -> &LogisticRegressionTrainingSummary {
        &self.summary
    }

    /// The raw margin `w . x + b`.
    pub fn margin(&self, features: &[f64]) -> f64 {
        margin(self.coefficients.values(), self.intercept, features)
    }

    /// The probability of the positive class.
    pub fn predict_probability(&self, features: &[f64]) -> f64 {
        sigmoid(self.margin(features))
    }

    /// Predicts the label of a single sample using the current threshold.
    pub fn predict(&self, features: &[f64]) -> MlResult<f64> {
        let threshold = self.get_threshold()?;
        Ok(label(self.predict_probability(features), threshold))
    }

    fn with<T: ParamType>(
        mut self,
        select: fn(&LogisticRegressionParams) -> &Param<T>,
        value: T,
    ) -> MlResult<Self> {
        self.params.assign(select, value)?;
        Ok(self)
    }

    /// Sets the decision threshold.
    pub fn with_threshold(self, value: f64) -> MlResult<Self> {
        self.with(|p| &p.threshold, value)
    }

    /// Sets the features column name.
    pub fn with_features_col(self, value: impl Into<String>) -> MlResult<Self> {
        self.with(|p| &p.features_col, value.into())
    }

    /// Sets the prediction column name.
    pub fn with_prediction_col(self, value: impl Into<String>) -> MlResult<Self> {
        self.with(|p| &p.prediction_col, value.into())
    }

    /// Sets the raw prediction column name.
    pub fn with_raw_prediction_col(self, value: impl Into<String>) -> MlResult<Self> {
        self.with(|p| &p.raw_prediction_col, value.into())
    }

    /// Sets the probability column name.
    pub fn with_probability_col(self, value: impl Into<String>) -> MlResult<Self> {
        self.with(|p| &p.probability_col, value.into())
    }
}

fn margin(coefficients: &[f64], intercept: f64, features: &[f64]) -> f64 {
    intercept
        + coefficients
            .iter()
            .zip(features)
            .map(|(c, x)| c * x)
            .sum::<f64>()
}

fn sigmoid(margin: f64) -> f64 {
    1.0 / (1.0 + (-margin).exp())
}

fn label(probability: f64, threshold: f64) -> f64 {
    if probability > threshold {
        1.0
    } else {
        0.0
    }
}

/// The output columns requested for one `transform` call. Empty names are skipped.
#[derive(Debug, Clone)]
struct OutputColumns {
    raw_prediction: Option<String>,
    probability: Option<String>,
    prediction: Option<String>,
}

impl OutputColumns {
    fn try_new(params: &LogisticRegressionParams) -> MlResult<Self> {
        let non_empty = |name: String| (!name.is_empty()).then_some(name);
        Ok(Self {
            raw_prediction: non_empty(params.value(|p| &p.raw_prediction_col)?),
            probability: non_empty(params.value(|p| &p.probability_col)?),
            prediction: non_empty(params.value(|p| &p.prediction_col)?),
        })
    }

    fn is_empty(&self) -> bool {
        self.raw_prediction.is_none() && self.probability.is_none() && self.prediction.is_none()
    }

    fn fields(&self) -> Vec<Field> {
        let mut fields = vec![];
        if let Some(name) = &self.raw_prediction {
            fields.push(Field::new(name, vector_data_type(), false));
        }
        if let Some(name) = &self.probability {
            fields.push(Field::new(name, vector_data_type(), false));
        }
        if let Some(name) = &self.prediction {
            fields.push(Field::new(name, DataType::Float64, false));
        }
        fields
    }
}

impl Params for LogisticRegressionModel {
    fn param_set(&self) -> &ParamSet {
        self.params.param_set()
    }
}

impl HasLogisticRegressionParams for LogisticRegressionModel {
    fn lr_params(&self) -> &LogisticRegressionParams {
        &self.params
    }
}

impl Transformer for LogisticRegressionModel {
    fn transform_with(&self, dataset: &Dataset, extra: &ParamMap) -> MlResult<Dataset> {
        let params = self.params.copy_with(extra);
        let outputs = OutputColumns::try_new(&params)?;
        if outputs.is_empty() {
            warn!(
                "{}: transform() was called as a no-op since all output column names are empty",
                self.uid()
            );
            return Ok(dataset.clone());
        }

        let features_col = params.value(|p| &p.features_col)?;
        match dataset.column_type(&features_col) {
            None => {
                return Err(MlError::schema(format!(
                    "Column {features_col} does not exist."
                )))
            }
            Some(data_type) if !is_vector_type(data_type) => {
                return Err(MlError::schema(format!(
                    "Column {features_col} must be of type vector but was actually {data_type}."
                )))
            }
            Some(_) => {}
        }

        let fields = outputs.fields();
        if let Some(field) = fields.iter().enumerate().find_map(|(i, f)| {
            let taken = dataset.column_type(f.name()).is_some()
                || fields[..i].iter().any(|other| other.name() == f.name());
            taken.then_some(f)
        }) {
            return Err(MlError::schema(format!(
                "Output column {} already exists.",
                field.name()
            )));
        }

        let threshold = params.value(|p| &p.threshold)?;
        let coefficients = Arc::new(self.coefficients.values().to_vec());
        let intercept = self.intercept;
        let outputs = Arc::new(outputs);
        let columns = dataset.map_partitions(move |batch| {
            let mut margins = Vec::with_capacity(batch.num_rows());
            for features in vector_column(batch, &features_col)? {
                let features = features.ok_or_else(|| {
                    MlError::invalid(format!("null value in features column {features_col}"))
                })?;
                if features.len() != coefficients.len() {
                    return Err(MlError::invalid(format!(
                        "features size {} does not match the model with {} features",
                        features.len(),
                        coefficients.len()
                    )));
                }
                margins.push(margin(&coefficients, intercept, &features));
            }

            let mut arrays: Vec<ArrayRef> = vec![];
            if outputs.raw_prediction.is_some() {
                arrays.push(vector_array(margins.iter().map(|m| vec![-m, *m])));
            }
            if outputs.probability.is_some() {
                arrays.push(vector_array(margins.iter().map(|m| {
                    let p = sigmoid(*m);
                    vec![1.0 - p, p]
                })));
            }
            if outputs.prediction.is_some() {
                let labels = margins
                    .iter()
                    .map(|m| label(sigmoid(*m), threshold))
                    .collect::<Vec<_>>();
                arrays.push(Arc::new(Float64Array::from(labels)));
            }
            Ok(arrays)
        })?;
        dataset.with_columns(fields, columns)
    }
}

impl Model for LogisticRegressionModel {
    fn parent(&self) -> &str {
        self.uid()
    }
}
