use std::time::Duration;

use log::debug;
use tokio::runtime::{Handle, Runtime};

use crate::config::RuntimeConfig;
use crate::error::{CommonError, CommonResult};

#[derive(Debug)]
pub struct RuntimeManager {
    primary: Runtime,
    shutdown_timeout: Duration,
}

impl RuntimeManager {
    pub fn try_new(config: &RuntimeConfig, name: &str) -> CommonResult<Self> {
        let primary = Self::build_runtime(config, name)?;
        debug!(
            "runtime {name} started with {} workers",
            primary.handle().metrics().num_workers()
        );
        Ok(Self {
            primary,
            shutdown_timeout: Duration::from_secs(config.shutdown_timeout_secs),
        })
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle {
            primary: self.primary.handle().clone(),
        }
    }

    /// Shuts down the runtime, waiting for blocking tasks up to the configured timeout.
    pub fn shutdown(self) {
        self.primary.shutdown_timeout(self.shutdown_timeout);
    }

    fn build_runtime(config: &RuntimeConfig, name: &str) -> CommonResult<Runtime> {
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        builder
            .thread_name(name)
            .thread_stack_size(config.stack_size)
            .enable_all();
        if let Some(worker_threads) = config.worker_threads {
            builder.worker_threads(worker_threads);
        }
        builder
            .build()
            .map_err(|e| CommonError::internal(e.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    primary: Handle,
}

impl RuntimeHandle {
    pub fn primary(&self) -> &Handle {
        &self.primary
    }
}
