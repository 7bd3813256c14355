use arrow::error::ArrowError;
use paramfit_common::error::CommonError;
use thiserror::Error;
use tokio::task::JoinError;

pub type MlResult<T> = Result<T, MlError>;

#[derive(Debug, Error)]
pub enum MlError {
    #[error("error in Arrow: {0}")]
    ArrowError(#[from] ArrowError),
    #[error("{0}")]
    CommonError(#[from] CommonError),
    #[error("missing parameter: {0}")]
    MissingParameter(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("schema error: {0}")]
    SchemaError(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl MlError {
    pub fn missing(message: impl Into<String>) -> Self {
        MlError::MissingParameter(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        MlError::InvalidArgument(message.into())
    }

    pub fn schema(message: impl Into<String>) -> Self {
        MlError::SchemaError(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        MlError::InternalError(message.into())
    }
}

impl From<JoinError> for MlError {
    fn from(error: JoinError) -> Self {
        MlError::InternalError(format!("partition task failed: {error}"))
    }
}
