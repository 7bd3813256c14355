use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::config::deserialize_non_zero;
use crate::error::{CommonError, CommonResult};

const DEFAULT_CONFIG: &str = include_str!("default.toml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub runtime: RuntimeConfig,
    pub session: SessionConfig,
    pub optimizer: OptimizerConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// The configuration sources in increasing order of precedence.
    pub fn figment() -> Figment {
        Figment::from(Toml::string(DEFAULT_CONFIG))
            .admerge(Env::prefixed("PARAMFIT__").map(|p| p.as_str().replace("__", ".").into()))
    }

    pub fn load() -> CommonResult<Self> {
        Self::extract(Self::figment())
    }

    pub fn extract(figment: Figment) -> CommonResult<Self> {
        let config: Self = figment
            .extract()
            .map_err(|e| CommonError::InvalidArgument(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CommonResult<()> {
        if self.session.default_parallelism == 0 {
            return Err(CommonError::invalid(
                "session.default_parallelism must be positive",
            ));
        }
        if self.optimizer.lbfgs_memory == 0 {
            return Err(CommonError::invalid("optimizer.lbfgs_memory must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub stack_size: usize,
    #[serde(deserialize_with = "deserialize_non_zero")]
    pub worker_threads: Option<usize>,
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub default_parallelism: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    pub lbfgs_memory: usize,
    pub line_search_max_steps: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub default_log_level: String,
}
