use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;

/// Set once the owning [`ScopedTask`] is dropped.
#[derive(Debug, Clone)]
pub(crate) struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub(crate) fn is_stopped(&self) -> bool {
        // Pairs with the Release store in ScopedTask::drop.
        self.0.load(Ordering::Acquire)
    }
}

/// A spawned task that lives exactly as long as this handle.
///
/// Dropping it raises the stop flag and aborts the task, so a timer loop
/// that checks the flag before each tick cannot fire after teardown even
/// if it is already scheduled on another worker.
#[derive(Debug)]
pub(crate) struct ScopedTask {
    handle: JoinHandle<()>,
    stopped: Arc<AtomicBool>,
}

impl ScopedTask {
    /// Spawn onto the current Tokio runtime.
    pub(crate) fn spawn<F, Fut>(f: F) -> Self
    where
        F: FnOnce(StopFlag) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let stopped = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(f(StopFlag(stopped.clone())));
        Self { handle, stopped }
    }
}

impl Drop for ScopedTask {
    fn drop(&mut self) {
        self.stopped.store(true, Ordering::Release);
        self.handle.abort();
    }
}
