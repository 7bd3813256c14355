use arrow::record_batch::RecordBatch;

use crate::dataset::column::{double_column, vector_column};
use crate::error::{MlError, MlResult};

/// A weighted training example.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Instance {
    pub label: f64,
    pub weight: f64,
    pub features: Vec<f64>,
}

#[derive(Debug, Clone)]
pub(crate) struct InstanceColumns {
    pub label: String,
    pub features: String,
    pub weight: Option<String>,
}

/// Reads the label, weight and features columns of a partition.
pub(crate) fn extract_instances(
    batch: &RecordBatch,
    columns: &InstanceColumns,
) -> MlResult<Vec<Instance>> {
    let labels = double_column(batch, &columns.label)?;
    let features = vector_column(batch, &columns.features)?;
    let weights = match &columns.weight {
        Some(name) => double_column(batch, name)?,
        None => vec![Some(1.0); batch.num_rows()],
    };
    labels
        .into_iter()
        .zip(weights)
        .zip(features)
        .map(|((label, weight), features)| {
            let label = label.ok_or_else(|| {
                MlError::invalid(format!("null value in label column {}", columns.label))
            })?;
            let weight = weight.ok_or_else(|| MlError::invalid("null value in weight column"))?;
            if !weight.is_finite() || weight < 0.0 {
                return Err(MlError::invalid(format!(
                    "weights must be non-negative and finite but got {weight:?}"
                )));
            }
            let features = features.ok_or_else(|| {
                MlError::invalid(format!(
                    "null value in features column {}",
                    columns.features
                ))
            })?;
            Ok(Instance {
                label,
                weight,
                features,
            })
        })
        .collect()
}
