use std::sync::Arc;

use futures::future::try_join_all;
use paramfit_common::runtime::RuntimeHandle;
use tokio::task::JoinHandle;

use crate::error::MlResult;

/// Runs `f` on each input as a blocking task on the runtime and waits for all of them.
///
/// Outputs are returned in input order. Must not be called from within an async context.
pub(crate) fn execute_partitions<I, T, F>(
    runtime: &RuntimeHandle,
    inputs: Vec<I>,
    f: F,
) -> MlResult<Vec<T>>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> MlResult<T> + Send + Sync + 'static,
{
    let handle = runtime.primary();
    let f = Arc::new(f);
    let tasks = inputs
        .into_iter()
        .map(|input| {
            let f = Arc::clone(&f);
            handle.spawn_blocking(move || f(input))
        })
        .collect::<Vec<_>>();
    handle.block_on(join_partitions(tasks))
}

async fn join_partitions<T>(tasks: Vec<JoinHandle<MlResult<T>>>) -> MlResult<Vec<T>> {
    let outputs = try_join_all(tasks).await?;
    outputs.into_iter().collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use paramfit_common::config::RuntimeConfig;
    use paramfit_common::runtime::RuntimeManager;

    use super::*;
    use crate::error::MlError;

    fn runtime() -> RuntimeManager {
        let config = RuntimeConfig {
            stack_size: 2 * 1024 * 1024,
            worker_threads: Some(2),
            shutdown_timeout_secs: 1,
        };
        RuntimeManager::try_new(&config, "test-execution").unwrap()
    }

    #[test]
    fn test_execute_partitions_keeps_order() {
        let manager = runtime();
        let output = execute_partitions(&manager.handle(), (0..8).collect(), |x: i32| Ok(x * x))
            .unwrap();
        assert_eq!(output, vec![0, 1, 4, 9, 16, 25, 36, 49]);
        manager.shutdown();
    }

    #[test]
    fn test_execute_partitions_propagates_errors() {
        let manager = runtime();
        let result = execute_partitions(&manager.handle(), vec![1, 2, 3], |x: i32| {
            if x == 2 {
                Err(MlError::invalid("bad partition"))
            } else {
                Ok(x)
            }
        });
        assert!(matches!(result, Err(MlError::InvalidArgument(_))));
        manager.shutdown();
    }
}
