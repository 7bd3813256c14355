//! Partitioned in-memory datasets backed by Arrow record batches.

pub mod column;
mod show;

use std::fmt;
use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;

use crate::error::{MlError, MlResult};
use crate::execution::execute_partitions;
use crate::linalg::DenseVector;
use crate::session::SessionContext;

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Long(i64),
    Double(f64),
    String(String),
    Vector(DenseVector),
}

impl Value {
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            Value::Long(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&DenseVector> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v:?}"),
            Value::String(v) => write!(f, "{v}"),
            Value::Vector(v) => write!(f, "{v}"),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<DenseVector> for Value {
    fn from(value: DenseVector) -> Self {
        Value::Vector(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// A collected row with named values.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    schema: SchemaRef,
    values: Vec<Value>,
}

impl Row {
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self.schema.index_of(name).ok()?;
        self.values.get(index)
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row(")?;
        for (i, (field, value)) in self.schema.fields().iter().zip(&self.values).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", field.name(), value)?;
        }
        write!(f, ")")
    }
}

/// An ordered collection of rows with a fixed schema, split into partitions.
///
/// The dataset keeps a handle to the session that created it, which is used to
/// run per-partition work.
#[derive(Debug, Clone)]
pub struct Dataset {
    context: SessionContext,
    schema: SchemaRef,
    partitions: Vec<RecordBatch>,
}

impl Dataset {
    pub(crate) fn try_new(
        context: SessionContext,
        schema: SchemaRef,
        partitions: Vec<RecordBatch>,
    ) -> MlResult<Self> {
        if let Some(batch) = partitions.iter().find(|b| b.schema() != schema) {
            return Err(MlError::internal(format!(
                "partition schema {:?} does not match dataset schema {:?}",
                batch.schema(),
                schema
            )));
        }
        Ok(Self {
            context,
            schema,
            partitions,
        })
    }

    /// Creates a dataset from rows, inferring the type of each column from its
    /// first non-null value.
    pub(crate) fn from_rows(
        context: SessionContext,
        rows: Vec<Vec<Value>>,
        columns: &[&str],
        num_partitions: usize,
    ) -> MlResult<Self> {
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(MlError::invalid(format!(
                "row {i} has {} values but {} column names were given",
                row.len(),
                columns.len()
            )));
        }
        let fields = columns
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let data_type = rows
                    .iter()
                    .find_map(|row| column::value_data_type(&row[j]))
                    .ok_or_else(|| {
                        MlError::invalid(format!(
                            "cannot infer the type of column {name}: all values are null"
                        ))
                    })?;
                Ok(Field::new(*name, data_type, true))
            })
            .collect::<MlResult<Vec<_>>>()?;
        let schema = Arc::new(Schema::new(fields));

        let num_partitions = num_partitions.max(1);
        let n = rows.len();
        let partitions = (0..num_partitions)
            .map(|p| {
                let slice = &rows[p * n / num_partitions..(p + 1) * n / num_partitions];
                let arrays = schema
                    .fields()
                    .iter()
                    .enumerate()
                    .map(|(j, field)| {
                        column::build_column(
                            field.name(),
                            field.data_type(),
                            slice.iter().map(|row| &row[j]),
                        )
                    })
                    .collect::<MlResult<Vec<_>>>()?;
                Ok(RecordBatch::try_new(schema.clone(), arrays)?)
            })
            .collect::<MlResult<Vec<_>>>()?;
        Self::try_new(context, schema, partitions)
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn columns(&self) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .collect()
    }

    pub fn column_type(&self, name: &str) -> Option<&DataType> {
        self.schema
            .field_with_name(name)
            .ok()
            .map(|f| f.data_type())
    }

    pub fn num_rows(&self) -> usize {
        self.partitions.iter().map(|b| b.num_rows()).sum()
    }

    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    pub fn partitions(&self) -> &[RecordBatch] {
        &self.partitions
    }

    /// Projects the dataset onto the given columns, in the given order.
    pub fn select(&self, columns: &[&str]) -> MlResult<Dataset> {
        let indices = columns
            .iter()
            .map(|name| {
                self.schema.index_of(name).map_err(|_| {
                    MlError::schema(format!(
                        "cannot resolve column {name} among [{}]",
                        self.columns().join(", ")
                    ))
                })
            })
            .collect::<MlResult<Vec<_>>>()?;
        let schema = Arc::new(self.schema.project(&indices)?);
        let partitions = self
            .partitions
            .iter()
            .map(|b| b.project(&indices))
            .collect::<Result<Vec<_>, _>>()?;
        Self::try_new(self.context.clone(), schema, partitions)
    }

    /// Returns a dataset with extra columns appended to every partition.
    ///
    /// `columns` yields the new arrays for each partition in partition order.
    pub(crate) fn with_columns(
        &self,
        fields: Vec<Field>,
        columns: Vec<Vec<ArrayRef>>,
    ) -> MlResult<Dataset> {
        if let Some(field) = fields
            .iter()
            .find(|f| self.schema.index_of(f.name()).is_ok())
        {
            return Err(MlError::schema(format!(
                "Output column {} already exists.",
                field.name()
            )));
        }
        if columns.len() != self.partitions.len() {
            return Err(MlError::internal(format!(
                "expected columns for {} partitions but got {}",
                self.partitions.len(),
                columns.len()
            )));
        }
        let mut all_fields = self.schema.fields().iter().cloned().collect::<Vec<_>>();
        all_fields.extend(fields.into_iter().map(Arc::new));
        let schema = Arc::new(Schema::new(all_fields));
        let partitions = self
            .partitions
            .iter()
            .zip(columns)
            .map(|(batch, extra)| {
                let mut arrays = batch.columns().to_vec();
                arrays.extend(extra);
                RecordBatch::try_new(schema.clone(), arrays)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::try_new(self.context.clone(), schema, partitions)
    }

    /// Runs `f` on every partition using the session runtime.
    /// Results are returned in partition order.
    pub(crate) fn map_partitions<T, F>(&self, f: F) -> MlResult<Vec<T>>
    where
        T: Send + 'static,
        F: Fn(&RecordBatch) -> MlResult<T> + Send + Sync + 'static,
    {
        execute_partitions(self.context.runtime(), self.partitions.clone(), move |batch| {
            f(&batch)
        })
    }

    pub fn collect(&self) -> MlResult<Vec<Row>> {
        let mut rows = Vec::with_capacity(self.num_rows());
        for batch in self.partitions.iter() {
            let columns = batch
                .columns()
                .iter()
                .zip(self.schema.fields().iter())
                .map(|(array, field)| column::column_values(array, field.name()))
                .collect::<MlResult<Vec<_>>>()?;
            for i in 0..batch.num_rows() {
                rows.push(Row {
                    schema: self.schema.clone(),
                    values: columns.iter().map(|c| c[i].clone()).collect(),
                });
            }
        }
        Ok(rows)
    }

    /// Renders the first `n` rows as a table.
    pub fn show_string(&self, n: usize) -> MlResult<String> {
        show::show_string(self, n)
    }

    /// Prints the first `n` rows as a table to stdout.
    pub fn show(&self, n: usize) -> MlResult<()> {
        println!("{}", self.show_string(n)?);
        Ok(())
    }
}
