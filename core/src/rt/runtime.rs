//! Tokio runtime wrapper and the ordered fan-in combinator.

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::debug;

use crate::error::{HarnessError, HarnessResult};

const SINGLE_THREAD_ENV: &str = "MAPBENCH_SINGLE_THREAD";

/// Owns the tokio runtime concurrent cases are driven on.
#[derive(Debug)]
pub struct Runtime {
    tokio_runtime: tokio::runtime::Runtime,
}

impl Runtime {
    /// Create a new multi-threaded runtime
    pub fn new_multi_thread() -> HarnessResult<Self> {
        let tokio_runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| HarnessError::Runtime(format!("failed to create tokio runtime: {}", e)))?;
        Ok(Runtime { tokio_runtime })
    }

    /// Create a new current-thread runtime
    pub fn new_current_thread() -> HarnessResult<Self> {
        let tokio_runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| HarnessError::Runtime(format!("failed to create tokio runtime: {}", e)))?;
        Ok(Runtime { tokio_runtime })
    }

    /// Picks the runtime flavor. `MAPBENCH_SINGLE_THREAD` forces current-thread;
    /// a failing multi-thread build falls back to current-thread.
    pub fn for_config(single_thread: bool) -> HarnessResult<Self> {
        if single_thread || std::env::var_os(SINGLE_THREAD_ENV).is_some() {
            return Runtime::new_current_thread();
        }

        match Runtime::new_multi_thread() {
            Ok(runtime) => Ok(runtime),
            Err(err) => {
                debug!(error = %err, "multi-thread runtime unavailable, using current-thread");
                Runtime::new_current_thread().map_err(|fallback_err| {
                    HarnessError::Runtime(format!(
                        "failed to create multi-thread runtime ({}) and fallback to current-thread runtime failed ({})",
                        err, fallback_err
                    ))
                })
            }
        }
    }

    /// Block on a future using the tokio runtime
    pub fn block_on<F>(&self, future: F) -> F::Output
    where
        F: std::future::Future,
    {
        self.tokio_runtime.block_on(future)
    }

    pub fn stats(&self) -> RuntimeStats {
        let handle = self.tokio_runtime.handle();
        RuntimeStats {
            is_multi_threaded: matches!(handle.runtime_flavor(), tokio::runtime::RuntimeFlavor::MultiThread),
            workers: handle.metrics().num_workers(),
        }
    }
}

/// Runtime statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeStats {
    pub is_multi_threaded: bool,
    pub workers: usize,
}

/// Waits for every spawned task and returns their results in spawn order.
///
/// Tasks are polled as they complete, in whatever order the scheduler picks,
/// and each result is written back into the slot of its original index. The
/// first task error aborts the tasks that are still pending, and so does
/// dropping the returned future before it completes.
pub async fn join_ordered<T>(handles: Vec<JoinHandle<HarnessResult<T>>>) -> HarnessResult<Vec<T>>
where
    T: Send + 'static,
{
    let _abort_guard = AbortOnDrop(handles.iter().map(JoinHandle::abort_handle).collect());
    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(handles.len()).collect();

    let mut pending: FuturesUnordered<_> = handles
        .into_iter()
        .enumerate()
        .map(|(index, handle)| async move { (index, handle.await) })
        .collect();

    while let Some((index, joined)) = pending.next().await {
        let outcome = joined
            .map_err(|e| HarnessError::Runtime(format!("task {} failed: {}", index, e)))
            .and_then(|result| result);
        match outcome {
            Ok(value) => slots[index] = Some(value),
            Err(err) => return Err(err),
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| slot.ok_or_else(|| HarnessError::Runtime(format!("task {} produced no result", index))))
        .collect()
}

/// Aborts every task it holds when dropped. Aborting a finished task is a no-op.
struct AbortOnDrop(Vec<AbortHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}
