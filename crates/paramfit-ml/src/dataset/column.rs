//! Conversions between Arrow arrays and dataset values.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, Float64Array, Float64Builder, Int64Array, ListArray, ListBuilder,
    StringArray,
};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use crate::dataset::Value;
use crate::error::{MlError, MlResult};
use crate::linalg::DenseVector;

/// The Arrow type used to store dense vectors.
pub fn vector_data_type() -> DataType {
    DataType::new_list(DataType::Float64, true)
}

pub(crate) fn is_vector_type(data_type: &DataType) -> bool {
    matches!(data_type, DataType::List(field) if field.data_type() == &DataType::Float64)
}

pub(crate) fn value_data_type(value: &Value) -> Option<DataType> {
    match value {
        Value::Null => None,
        Value::Long(_) => Some(DataType::Int64),
        Value::Double(_) => Some(DataType::Float64),
        Value::String(_) => Some(DataType::Utf8),
        Value::Vector(_) => Some(vector_data_type()),
    }
}

fn type_mismatch(name: &str, data_type: &DataType, value: &Value) -> MlError {
    MlError::schema(format!(
        "column {name} has type {data_type} but got value {value}"
    ))
}

/// Builds an array of the given type from one column of row values.
pub(crate) fn build_column<'a>(
    name: &str,
    data_type: &DataType,
    values: impl Iterator<Item = &'a Value>,
) -> MlResult<ArrayRef> {
    match data_type {
        DataType::Int64 => {
            let values = values
                .map(|v| match v {
                    Value::Null => Ok(None),
                    Value::Long(x) => Ok(Some(*x)),
                    other => Err(type_mismatch(name, data_type, other)),
                })
                .collect::<MlResult<Vec<_>>>()?;
            Ok(Arc::new(Int64Array::from(values)))
        }
        DataType::Float64 => {
            let values = values
                .map(|v| match v {
                    Value::Null => Ok(None),
                    Value::Double(x) => Ok(Some(*x)),
                    other => Err(type_mismatch(name, data_type, other)),
                })
                .collect::<MlResult<Vec<_>>>()?;
            Ok(Arc::new(Float64Array::from(values)))
        }
        DataType::Utf8 => {
            let values = values
                .map(|v| match v {
                    Value::Null => Ok(None),
                    Value::String(x) => Ok(Some(x.clone())),
                    other => Err(type_mismatch(name, data_type, other)),
                })
                .collect::<MlResult<Vec<_>>>()?;
            Ok(Arc::new(StringArray::from(values)))
        }
        _ if is_vector_type(data_type) => {
            let mut builder = ListBuilder::new(Float64Builder::new());
            for value in values {
                match value {
                    Value::Null => builder.append_null(),
                    Value::Vector(v) => {
                        builder.values().append_slice(v.values());
                        builder.append(true);
                    }
                    other => return Err(type_mismatch(name, data_type, other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        other => Err(MlError::schema(format!(
            "unsupported data type for column {name}: {other}"
        ))),
    }
}

/// Builds a vector array without nulls.
pub(crate) fn vector_array(vectors: impl Iterator<Item = Vec<f64>>) -> ArrayRef {
    let mut builder = ListBuilder::new(Float64Builder::new());
    for v in vectors {
        builder.values().append_slice(&v);
        builder.append(true);
    }
    Arc::new(builder.finish())
}

fn downcast<'a, T: 'static>(array: &'a ArrayRef, name: &str) -> MlResult<&'a T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        MlError::internal(format!(
            "failed to downcast column {name} of type {}",
            array.data_type()
        ))
    })
}

fn list_element(list: &ListArray, i: usize, name: &str) -> MlResult<Vec<f64>> {
    let inner = list.value(i);
    let values = inner
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| MlError::schema(format!("vector values in column {name} must be double")))?;
    if values.null_count() > 0 {
        return Err(MlError::invalid(format!(
            "vector in column {name} contains null elements"
        )));
    }
    Ok(values.values().to_vec())
}

/// Converts an array into dataset values, one per row.
pub(crate) fn column_values(array: &ArrayRef, name: &str) -> MlResult<Vec<Value>> {
    match array.data_type() {
        DataType::Int64 => Ok(downcast::<Int64Array>(array, name)?
            .iter()
            .map(|v| v.map_or(Value::Null, Value::Long))
            .collect()),
        DataType::Float64 => Ok(downcast::<Float64Array>(array, name)?
            .iter()
            .map(|v| v.map_or(Value::Null, Value::Double))
            .collect()),
        DataType::Utf8 => Ok(downcast::<StringArray>(array, name)?
            .iter()
            .map(|v| v.map_or(Value::Null, |s| Value::String(s.to_string())))
            .collect()),
        data_type if is_vector_type(data_type) => {
            let list = downcast::<ListArray>(array, name)?;
            (0..list.len())
                .map(|i| {
                    if list.is_null(i) {
                        Ok(Value::Null)
                    } else {
                        Ok(Value::Vector(DenseVector::new(list_element(list, i, name)?)))
                    }
                })
                .collect()
        }
        other => Err(MlError::schema(format!(
            "unsupported data type for column {name}: {other}"
        ))),
    }
}

fn required_column<'a>(batch: &'a RecordBatch, name: &str) -> MlResult<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| MlError::schema(format!("column {name} does not exist")))
}

/// Reads a numeric column as doubles. Nulls are kept as `None`.
pub(crate) fn double_column(batch: &RecordBatch, name: &str) -> MlResult<Vec<Option<f64>>> {
    let array = required_column(batch, name)?;
    if !array.data_type().is_numeric() {
        return Err(MlError::schema(format!(
            "column {name} must be of numeric type but was {}",
            array.data_type()
        )));
    }
    let array = cast(array, &DataType::Float64)?;
    Ok(downcast::<Float64Array>(&array, name)?.iter().collect())
}

/// Reads a vector column. Nulls are kept as `None`.
pub(crate) fn vector_column(batch: &RecordBatch, name: &str) -> MlResult<Vec<Option<Vec<f64>>>> {
    let array = required_column(batch, name)?;
    if !is_vector_type(array.data_type()) {
        return Err(MlError::schema(format!(
            "column {name} must be of vector type but was {}",
            array.data_type()
        )));
    }
    let list = downcast::<ListArray>(array, name)?;
    (0..list.len())
        .map(|i| {
            if list.is_null(i) {
                Ok(None)
            } else {
                list_element(list, i, name).map(Some)
            }
        })
        .collect()
}
