//! Binary logistic regression estimator.

use std::sync::Arc;

use log::{info, warn};

use crate::dataset::Dataset;
use crate::error::{MlError, MlResult};
use crate::estimator::logistic_cost::LogisticCostFunction;
use crate::identifiable::random_uid;
use crate::linalg::DenseVector;
use crate::model::{LogisticRegressionModel, LogisticRegressionTrainingSummary};
use crate::param::{validators, Param, ParamMap, ParamSet, ParamType, Params};
use crate::pipeline::Estimator;
use crate::solver::lbfgs::{self, LbfgsParams};
use crate::stat::{extract_instances, Instance, InstanceColumns, Summarizer};

/// The parameters shared by [`LogisticRegression`] and the models it produces.
#[derive(Debug, Clone)]
pub struct LogisticRegressionParams {
    pub(crate) set: ParamSet,
    pub(crate) elastic_net_param: Param<f64>,
    pub(crate) features_col: Param<String>,
    pub(crate) fit_intercept: Param<bool>,
    pub(crate) label_col: Param<String>,
    pub(crate) max_iter: Param<i64>,
    pub(crate) prediction_col: Param<String>,
    pub(crate) probability_col: Param<String>,
    pub(crate) raw_prediction_col: Param<String>,
    pub(crate) reg_param: Param<f64>,
    pub(crate) standardization: Param<bool>,
    pub(crate) threshold: Param<f64>,
    pub(crate) tol: Param<f64>,
    pub(crate) weight_col: Param<String>,
}

impl LogisticRegressionParams {
    pub fn new(uid: impl Into<String>) -> Self {
        let mut set = ParamSet::new(uid);
        let elastic_net_param = set.declare(
            "elasticNetParam",
            "the ElasticNet mixing parameter, in range [0, 1]. For alpha = 0, the penalty is an L2 penalty. For alpha = 1, it is an L1 penalty",
            Some(0.0),
            Some(validators::in_range(0.0, 1.0)),
        );
        let features_col = set.declare(
            "featuresCol",
            "features column name",
            Some("features".to_string()),
            None,
        );
        let fit_intercept = set.declare(
            "fitIntercept",
            "whether to fit an intercept term",
            Some(true),
            None,
        );
        let label_col = set.declare(
            "labelCol",
            "label column name",
            Some("label".to_string()),
            None,
        );
        let max_iter = set.declare(
            "maxIter",
            "max number of iterations (>= 0)",
            Some(100),
            Some(validators::gt_eq(0)),
        );
        let prediction_col = set.declare(
            "predictionCol",
            "prediction column name",
            Some("prediction".to_string()),
            None,
        );
        let probability_col = set.declare(
            "probabilityCol",
            "Column name for predicted class conditional probabilities. Note: Not all models output well-calibrated probability estimates! These probabilities should be treated as confidences, not precise probabilities",
            Some("probability".to_string()),
            None,
        );
        let raw_prediction_col = set.declare(
            "rawPredictionCol",
            "raw prediction (a.k.a. confidence) column name",
            Some("rawPrediction".to_string()),
            None,
        );
        let reg_param = set.declare(
            "regParam",
            "regularization parameter (>= 0)",
            Some(0.0),
            Some(validators::gt_eq(0.0)),
        );
        let standardization = set.declare(
            "standardization",
            "whether to standardize the training features before fitting the model",
            Some(true),
            None,
        );
        let threshold = set.declare(
            "threshold",
            "threshold in binary classification prediction, in range [0, 1]",
            Some(0.5),
            Some(validators::in_range(0.0, 1.0)),
        );
        let tol = set.declare(
            "tol",
            "the convergence tolerance for iterative algorithms (>= 0)",
            Some(1e-6),
            Some(validators::gt_eq(0.0)),
        );
        let weight_col = set.declare(
            "weightCol",
            "weight column name. If this is not set or empty, we treat all instance weights as 1.0",
            None,
            None,
        );
        Self {
            set,
            elastic_net_param,
            features_col,
            fit_intercept,
            label_col,
            max_iter,
            prediction_col,
            probability_col,
            raw_prediction_col,
            reg_param,
            standardization,
            threshold,
            tol,
            weight_col,
        }
    }

    pub fn param_set(&self) -> &ParamSet {
        &self.set
    }

    pub(crate) fn assign<T: ParamType>(
        &mut self,
        select: fn(&Self) -> &Param<T>,
        value: T,
    ) -> MlResult<()> {
        let param = select(self).clone();
        self.set.set(&param, value)
    }

    /// The effective value of a parameter.
    pub(crate) fn value<T: ParamType>(&self, select: fn(&Self) -> &Param<T>) -> MlResult<T> {
        self.set.get_or_default(select(self))
    }

    pub(crate) fn copy_with(&self, extra: &ParamMap) -> Self {
        Self {
            set: self.set.copy_with(extra),
            ..self.clone()
        }
    }

    /// The weight column, if one is set to a non-empty name.
    pub(crate) fn weight_column(&self) -> Option<String> {
        self.set
            .get(&self.weight_col)
            .filter(|name| !name.is_empty())
    }
}

/// Accessors for the parameters of logistic regression.
pub trait HasLogisticRegressionParams: Params {
    fn lr_params(&self) -> &LogisticRegressionParams;

    fn elastic_net_param(&self) -> &Param<f64> {
        &self.lr_params().elastic_net_param
    }

    fn features_col(&self) -> &Param<String> {
        &self.lr_params().features_col
    }

    fn fit_intercept(&self) -> &Param<bool> {
        &self.lr_params().fit_intercept
    }

    fn label_col(&self) -> &Param<String> {
        &self.lr_params().label_col
    }

    fn max_iter(&self) -> &Param<i64> {
        &self.lr_params().max_iter
    }

    fn prediction_col(&self) -> &Param<String> {
        &self.lr_params().prediction_col
    }

    fn probability_col(&self) -> &Param<String> {
        &self.lr_params().probability_col
    }

    fn raw_prediction_col(&self) -> &Param<String> {
        &self.lr_params().raw_prediction_col
    }

    fn reg_param(&self) -> &Param<f64> {
        &self.lr_params().reg_param
    }

    fn standardization(&self) -> &Param<bool> {
        &self.lr_params().standardization
    }

    fn threshold(&self) -> &Param<f64> {
        &self.lr_params().threshold
    }

    fn tol(&self) -> &Param<f64> {
        &self.lr_params().tol
    }

    fn weight_col(&self) -> &Param<String> {
        &self.lr_params().weight_col
    }

    fn get_threshold(&self) -> MlResult<f64> {
        self.lr_params().value(|p| &p.threshold)
    }

    fn get_max_iter(&self) -> MlResult<i64> {
        self.lr_params().value(|p| &p.max_iter)
    }

    fn get_reg_param(&self) -> MlResult<f64> {
        self.lr_params().value(|p| &p.reg_param)
    }
}

/// Resolved training options for one `fit` call.
#[derive(Debug, Clone)]
struct TrainingOptions {
    max_iter: usize,
    reg_param: f64,
    elastic_net_param: f64,
    tol: f64,
    fit_intercept: bool,
    standardization: bool,
    columns: InstanceColumns,
}

impl TrainingOptions {
    fn try_new(params: &LogisticRegressionParams) -> MlResult<Self> {
        let max_iter = params.value(|p| &p.max_iter)?;
        Ok(Self {
            max_iter: usize::try_from(max_iter)
                .map_err(|_| MlError::invalid(format!("invalid maxIter: {max_iter}")))?,
            reg_param: params.value(|p| &p.reg_param)?,
            elastic_net_param: params.value(|p| &p.elastic_net_param)?,
            tol: params.value(|p| &p.tol)?,
            fit_intercept: params.value(|p| &p.fit_intercept)?,
            standardization: params.value(|p| &p.standardization)?,
            columns: InstanceColumns {
                label: params.value(|p| &p.label_col)?,
                features: params.value(|p| &p.features_col)?,
                weight: params.weight_column(),
            },
        })
    }

    fn reg_l1(&self) -> f64 {
        self.elastic_net_param * self.reg_param
    }

    fn reg_l2(&self) -> f64 {
        (1.0 - self.elastic_net_param) * self.reg_param
    }
}

/// Binary logistic regression trained with L-BFGS, or OWL-QN when an L1 penalty is present.
///
/// Parameters are validated when they are set, so every `with_*` builder returns a result.
///
/// # Example
///
/// ```ignore
/// let lr = LogisticRegression::new()
///     .with_max_iter(10)?
///     .with_reg_param(0.01)?;
///
/// let model = lr.fit(&training)?;
/// ```
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    params: LogisticRegressionParams,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self::with_uid(random_uid("LogisticRegression"))
    }

    pub fn with_uid(uid: impl Into<String>) -> Self {
        Self {
            params: LogisticRegressionParams::new(uid),
        }
    }

    fn with<T: ParamType>(
        mut self,
        select: fn(&LogisticRegressionParams) -> &Param<T>,
        value: T,
    ) -> MlResult<Self> {
        self.params.assign(select, value)?;
        Ok(self)
    }

    pub fn with_max_iter(self, value: i64) -> MlResult<Self> {
        self.with(|p| &p.max_iter, value)
    }

    pub fn with_reg_param(self, value: f64) -> MlResult<Self> {
        self.with(|p| &p.reg_param, value)
    }

    pub fn with_elastic_net_param(self, value: f64) -> MlResult<Self> {
        self.with(|p| &p.elastic_net_param, value)
    }

    pub fn with_tol(self, value: f64) -> MlResult<Self> {
        self.with(|p| &p.tol, value)
    }

    pub fn with_fit_intercept(self, value: bool) -> MlResult<Self> {
        self.with(|p| &p.fit_intercept, value)
    }

    pub fn with_standardization(self, value: bool) -> MlResult<Self> {
        self.with(|p| &p.standardization, value)
    }

    pub fn with_threshold(self, value: f64) -> MlResult<Self> {
        self.with(|p| &p.threshold, value)
    }

    pub fn with_features_col(self, value: impl Into<String>) -> MlResult<Self> {
        self.with(|p| &p.features_col, value.into())
    }

    pub fn with_label_col(self, value: impl Into<String>) -> MlResult<Self> {
        self.with(|p| &p.label_col, value.into())
    }

    pub fn with_weight_col(self, value: impl Into<String>) -> MlResult<Self> {
        self.with(|p| &p.weight_col, value.into())
    }

    pub fn with_prediction_col(self, value: impl Into<String>) -> MlResult<Self> {
        self.with(|p| &p.prediction_col, value.into())
    }

    pub fn with_raw_prediction_col(self, value: impl Into<String>) -> MlResult<Self> {
        self.with(|p| &p.raw_prediction_col, value.into())
    }

    pub fn with_probability_col(self, value: impl Into<String>) -> MlResult<Self> {
        self.with(|p| &p.probability_col, value.into())
    }
}

impl Params for LogisticRegression {
    fn param_set(&self) -> &ParamSet {
        &self.params.set
    }
}

impl HasLogisticRegressionParams for LogisticRegression {
    fn lr_params(&self) -> &LogisticRegressionParams {
        &self.params
    }
}

impl Estimator for LogisticRegression {
    type Model = LogisticRegressionModel;

    fn fit_with(&self, dataset: &Dataset, extra: &ParamMap) -> MlResult<LogisticRegressionModel> {
        let params = self.params.copy_with(extra);
        let options = TrainingOptions::try_new(&params)?;
        info!(
            "training logistic regression {} with maxIter={} regParam={} elasticNetParam={}",
            self.uid(),
            options.max_iter,
            options.reg_param,
            options.elastic_net_param
        );

        let columns = Arc::new(options.columns.clone());
        let summarized = dataset.map_partitions(move |batch| {
            let instances = extract_instances(batch, &columns)?;
            let mut summarizer = Summarizer::default();
            for instance in &instances {
                if instance.label != 0.0 && instance.label != 1.0 {
                    return Err(MlError::invalid(format!(
                        "binomial logistic regression requires labels in {{0, 1}} but found {:?}",
                        instance.label
                    )));
                }
                summarizer.add(instance)?;
            }
            Ok((instances, summarizer))
        })?;
        let mut partitions = Vec::with_capacity(summarized.len());
        let mut summary = Summarizer::default();
        for (instances, summarizer) in summarized {
            partitions.push(Arc::new(instances));
            summary = summary.merge(summarizer)?;
        }

        if summary.count() == 0 {
            return Err(MlError::invalid(
                "training dataset has no instances with positive weight",
            ));
        }
        let histogram = summary.histogram();
        let num_features = summary.num_features();
        let negatives = histogram.first().copied().unwrap_or(0.0);
        let positives = histogram.get(1).copied().unwrap_or(0.0);

        let (coefficients, intercept, training_summary) =
            if options.fit_intercept && (negatives == 0.0 || positives == 0.0) {
                let intercept = if positives > 0.0 {
                    f64::INFINITY
                } else {
                    f64::NEG_INFINITY
                };
                warn!(
                    "all labels are {}, so the intercept is {intercept} and all coefficients are zero",
                    if positives > 0.0 { "1.0" } else { "0.0" }
                );
                let summary = LogisticRegressionTrainingSummary::new(vec![0.0], 0);
                (vec![0.0; num_features], intercept, summary)
            } else {
                train(dataset, &options, &summary, partitions)?
            };

        info!(
            "logistic regression {} finished after {} iterations",
            self.uid(),
            training_summary.total_iterations()
        );
        Ok(LogisticRegressionModel::new(
            params,
            DenseVector::new(coefficients),
            intercept,
            training_summary,
        ))
    }
}

/// Runs the optimizer and maps the solution back to the original feature scale.
fn train(
    dataset: &Dataset,
    options: &TrainingOptions,
    summary: &Summarizer,
    partitions: Vec<Arc<Vec<Instance>>>,
) -> MlResult<(Vec<f64>, f64, LogisticRegressionTrainingSummary)> {
    let num_features = summary.num_features();
    let feature_std = summary.std();
    let histogram = summary.histogram();

    let mut initial = vec![0.0; num_features + usize::from(options.fit_intercept)];
    if options.fit_intercept {
        // The intercept that matches the label distribution when all coefficients are zero.
        initial[num_features] = (histogram[1] / histogram[0]).ln();
    }

    let reg_l1 = options.reg_l1();
    let l1 = (reg_l1 != 0.0).then(|| {
        let mut weights = feature_std
            .iter()
            .map(|std| {
                if options.standardization {
                    reg_l1
                } else if *std != 0.0 {
                    reg_l1 / std
                } else {
                    0.0
                }
            })
            .collect::<Vec<_>>();
        if options.fit_intercept {
            weights.push(0.0);
        }
        weights
    });

    let optimizer = &dataset.context().config().optimizer;
    let lbfgs_params = LbfgsParams {
        max_iter: options.max_iter,
        memory: optimizer.lbfgs_memory,
        tolerance: options.tol,
        line_search_max_steps: optimizer.line_search_max_steps,
    };
    let cost = LogisticCostFunction::new(
        dataset.context().runtime().clone(),
        partitions,
        feature_std.clone(),
        options.fit_intercept,
        summary.weight_sum(),
        options.reg_l2(),
        options.standardization,
    );
    let result = lbfgs::minimize(&cost, initial, l1.as_deref(), &lbfgs_params)?;
    if !result.converged && options.max_iter > 0 {
        warn!(
            "logistic regression did not converge within {} iterations",
            options.max_iter
        );
    }

    let coefficients = (0..num_features)
        .map(|j| {
            if feature_std[j] != 0.0 {
                result.x[j] / feature_std[j]
            } else {
                0.0
            }
        })
        .collect();
    let intercept = if options.fit_intercept {
        result.x[num_features]
    } else {
        0.0
    };
    let summary = LogisticRegressionTrainingSummary::new(result.objective_history, result.iterations);
    Ok((coefficients, intercept, summary))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::param::ParamValue;

    #[test]
    fn test_default_params() {
        let lr = LogisticRegression::with_uid("LogisticRegression_test");
        let names = lr.params().iter().map(|p| p.name()).collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                "elasticNetParam",
                "featuresCol",
                "fitIntercept",
                "labelCol",
                "maxIter",
                "predictionCol",
                "probabilityCol",
                "rawPredictionCol",
                "regParam",
                "standardization",
                "threshold",
                "tol",
                "weightCol",
            ]
        );
        assert_eq!(lr.get_max_iter().unwrap(), 100);
        assert_eq!(lr.get_threshold().unwrap(), 0.5);
        let map = lr.extract_param_map();
        assert_eq!(map.len(), 12);
        assert_eq!(
            map.get_value(lr.tol().id()),
            Some(&ParamValue::Double(1e-6))
        );
    }

    #[test]
    fn test_builders_validate() {
        let lr = LogisticRegression::new()
            .with_max_iter(10)
            .unwrap()
            .with_reg_param(0.01)
            .unwrap();
        assert_eq!(lr.get_max_iter().unwrap(), 10);
        assert_eq!(lr.get_reg_param().unwrap(), 0.01);
        assert!(lr.is_set(lr.max_iter()));
        assert!(!lr.is_set(lr.tol()));

        assert!(LogisticRegression::new().with_max_iter(-1).is_err());
        assert!(LogisticRegression::new().with_threshold(1.5).is_err());
        assert!(LogisticRegression::new().with_elastic_net_param(-0.1).is_err());
        assert!(LogisticRegression::new().with_reg_param(-1.0).is_err());
    }

    #[test]
    fn test_uid_prefix() {
        let lr = LogisticRegression::new();
        assert!(lr.uid().starts_with("LogisticRegression_"));
        assert_eq!(lr.max_iter().parent(), lr.uid());
    }

    #[test]
    fn test_weight_column_ignores_empty_name() {
        let lr = LogisticRegression::new().with_weight_col("").unwrap();
        assert_eq!(lr.lr_params().weight_column(), None);
        let lr = lr.with_weight_col("w").unwrap();
        assert_eq!(lr.lr_params().weight_column(), Some("w".to_string()));
    }

    #[test]
    fn test_training_options_apply_overrides() {
        let lr = LogisticRegression::new();
        let mut extra = ParamMap::new();
        extra
            .put(lr.max_iter(), 30)
            .unwrap()
            .put(lr.reg_param(), 0.1)
            .unwrap()
            .put(lr.elastic_net_param(), 0.25)
            .unwrap();
        let params = lr.lr_params().copy_with(&extra);
        let options = TrainingOptions::try_new(&params).unwrap();
        assert_eq!(options.max_iter, 30);
        assert!((options.reg_l1() - 0.025).abs() < 1e-12);
        assert!((options.reg_l2() - 0.075).abs() < 1e-12);
        assert_eq!(lr.get_max_iter().unwrap(), 100);
    }
}
