use std::sync::Arc;

use log::info;
use paramfit_common::config::AppConfig;
use paramfit_common::runtime::{RuntimeHandle, RuntimeManager};

use crate::dataset::{Dataset, Value};
use crate::error::MlResult;

/// The state shared by a session and every dataset it creates.
#[derive(Debug, Clone)]
pub struct SessionContext {
    app_name: Arc<str>,
    runtime: RuntimeHandle,
    config: Arc<AppConfig>,
}

impl SessionContext {
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn runtime(&self) -> &RuntimeHandle {
        &self.runtime
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// The compute context: owns the runtime that datasets use for partition work.
///
/// The runtime is released by [`MlSession::stop`], or when the session is dropped.
#[derive(Debug)]
pub struct MlSession {
    context: SessionContext,
    runtime: RuntimeManager,
}

impl MlSession {
    pub fn builder() -> MlSessionBuilder {
        MlSessionBuilder::default()
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn app_name(&self) -> &str {
        self.context.app_name()
    }

    /// Creates a dataset from rows and column names using the default parallelism.
    pub fn create_dataset(&self, rows: Vec<Vec<Value>>, columns: &[&str]) -> MlResult<Dataset> {
        let num_partitions = self.context.config.session.default_parallelism;
        self.create_dataset_with_partitions(rows, columns, num_partitions)
    }

    pub fn create_dataset_with_partitions(
        &self,
        rows: Vec<Vec<Value>>,
        columns: &[&str],
        num_partitions: usize,
    ) -> MlResult<Dataset> {
        Dataset::from_rows(self.context.clone(), rows, columns, num_partitions)
    }

    pub fn stop(self) {
        info!("stopping session {}", self.context.app_name);
        self.runtime.shutdown();
    }
}

#[derive(Debug, Default)]
pub struct MlSessionBuilder {
    app_name: Option<String>,
    config: Option<AppConfig>,
}

impl MlSessionBuilder {
    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Starts the session, loading the application config if none was given.
    pub fn build(self) -> MlResult<MlSession> {
        let config = match self.config {
            Some(config) => config,
            None => AppConfig::load()?,
        };
        let app_name = self.app_name.unwrap_or_else(|| "paramfit".to_string());
        let runtime = RuntimeManager::try_new(&config.runtime, &app_name)?;
        info!("started session {app_name}");
        Ok(MlSession {
            context: SessionContext {
                app_name: app_name.into(),
                runtime: runtime.handle(),
                config: Arc::new(config),
            },
            runtime,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::MlError;
    use crate::linalg::Vectors;

    fn session() -> MlSession {
        MlSession::builder().app_name("SessionTest").build().unwrap()
    }

    fn labeled_rows() -> Vec<Vec<Value>> {
        vec![
            vec![1.0.into(), Vectors::dense([0.0, 1.1, 0.1]).into()],
            vec![0.0.into(), Vectors::dense([2.0, 1.0, -1.0]).into()],
            vec![0.0.into(), Vectors::dense([2.0, 1.3, 1.0]).into()],
            vec![1.0.into(), Vectors::dense([0.0, 1.2, -0.5]).into()],
            vec![1.0.into(), Vectors::dense([0.5, 1.0, 0.0]).into()],
        ]
    }

    #[test]
    fn test_create_dataset() {
        let spark = session();
        let dataset = spark
            .create_dataset_with_partitions(labeled_rows(), &["label", "features"], 3)
            .unwrap();
        assert_eq!(dataset.num_rows(), 5);
        assert_eq!(dataset.num_partitions(), 3);
        assert_eq!(dataset.columns(), vec!["label", "features"]);
        let sizes = dataset
            .partitions()
            .iter()
            .map(|b| b.num_rows())
            .collect::<Vec<_>>();
        assert_eq!(sizes, vec![1, 2, 2]);

        let rows = dataset.collect().unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].get("label"), Some(&Value::Double(1.0)));
        assert_eq!(
            rows[4].to_string(),
            "Row(label=1.0, features=[0.5,1.0,0.0])"
        );
        spark.stop();
    }

    #[test]
    fn test_select() {
        let spark = session();
        let dataset = spark
            .create_dataset(labeled_rows(), &["label", "features"])
            .unwrap();
        let selected = dataset.select(&["features"]).unwrap();
        assert_eq!(selected.columns(), vec!["features"]);
        assert_eq!(selected.num_rows(), 5);
        assert!(matches!(
            dataset.select(&["prediction"]),
            Err(MlError::SchemaError(_))
        ));
        spark.stop();
    }

    #[test]
    fn test_create_dataset_errors() {
        let spark = session();
        let ragged = vec![vec![1.0.into()], vec![0.0.into(), "x".into()]];
        assert!(matches!(
            spark.create_dataset(ragged, &["label"]),
            Err(MlError::InvalidArgument(_))
        ));

        let nulls = vec![vec![Value::Null], vec![Value::Null]];
        assert!(matches!(
            spark.create_dataset(nulls, &["label"]),
            Err(MlError::InvalidArgument(_))
        ));

        let mixed = vec![vec![1.0.into()], vec!["one".into()]];
        assert!(matches!(
            spark.create_dataset(mixed, &["label"]),
            Err(MlError::SchemaError(_))
        ));
        spark.stop();
    }

    #[test]
    fn test_show_string() {
        let spark = session();
        let dataset = spark
            .create_dataset(labeled_rows(), &["label", "features"])
            .unwrap();
        let output = dataset.show_string(2).unwrap();
        assert!(output.contains("label"));
        assert!(output.contains("[0.0,1.1,0.1]"));
        assert!(!output.contains("[0.5,1.0,0.0]"));
        assert!(output.ends_with("only showing top 2 rows"));
        spark.stop();
    }
}
