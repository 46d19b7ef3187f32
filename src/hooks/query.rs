//! Generic query engine behind every query and polling hook.
//!
//! A [`Query`] owns one state cell (published through a `watch` channel)
//! and one driver task. Mounting spawns the driver, which performs the
//! initial fetch and, when a poll interval is set, keeps fetching on a
//! timer. Replacing or dropping the driver tears the timer down.
//!
//! Overlapping fetches are not deduplicated or cancelled: whichever settles
//! last writes the final state, and `loading` is cleared by whichever
//! settles first. A fetch whose future is dropped before it settles
//! still clears `loading`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

use super::state::{HookError, LoadingGuard, QueryState};
use super::task::{ScopedTask, StopFlag};

pub(crate) type FetchFuture<T> = Pin<Box<dyn Future<Output = Result<T, HookError>> + Send>>;
pub(crate) type Fetcher<T> = Arc<dyn Fn() -> FetchFuture<T> + Send + Sync>;

pub(crate) fn fetcher<T, F, Fut>(f: F) -> Fetcher<T>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, HookError>> + Send + 'static,
{
    Arc::new(move || -> FetchFuture<T> { Box::pin(f()) })
}

/// What happens to `data` when a fetch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OnError {
    /// Reset to the empty value.
    Reset,
    /// Keep the last successful value.
    Keep,
}

struct Shared<T> {
    label: &'static str,
    state: watch::Sender<QueryState<T>>,
    fetch: Fetcher<T>,
    on_error: OnError,
}

impl<T> Shared<T>
where
    T: Default + Send + Sync + 'static,
{
    async fn run(&self) {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });
        tracing::debug!(query = self.label, "query started");

        let guard = LoadingGuard::new(self.label, &self.state, |s: &mut QueryState<T>| {
            s.loading = false
        });
        let outcome = (self.fetch)().await;
        guard.disarm();
        let on_error = self.on_error;
        let label = self.label;

        self.state.send_modify(move |s| {
            match outcome {
                Ok(data) => {
                    tracing::debug!(query = label, "query settled");
                    s.data = data;
                    s.error = None;
                }
                Err(err) => {
                    tracing::warn!(query = label, error = %err, "query failed");
                    if on_error == OnError::Reset {
                        s.data = T::default();
                    }
                    s.error = Some(err);
                }
            }
            s.loading = false;
        });
    }
}

async fn drive<T>(shared: Arc<Shared<T>>, poll_interval: Option<Duration>, stop: StopFlag)
where
    T: Default + Send + Sync + 'static,
{
    shared.run().await;

    let Some(period) = poll_interval.filter(|p| !p.is_zero()) else {
        return;
    };
    tracing::debug!(query = shared.label, period_ms = period.as_millis() as u64, "poll scheduled");

    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if stop.is_stopped() {
            break;
        }
        shared.run().await;
    }
}

/// Query state cell plus the task that keeps it fresh.
pub(crate) struct Query<T> {
    shared: Arc<Shared<T>>,
    poll_interval: Mutex<Option<Duration>>,
    driver: Mutex<Option<ScopedTask>>,
}

impl<T> Query<T>
where
    T: Clone + Default + Send + Sync + 'static,
{
    /// Create the state cell and start the initial fetch.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub(crate) fn mount(
        label: &'static str,
        fetch: Fetcher<T>,
        on_error: OnError,
        poll_interval: Option<Duration>,
    ) -> Self {
        let (state, _) = watch::channel(QueryState {
            data: T::default(),
            loading: true,
            error: None,
        });

        let query = Self {
            shared: Arc::new(Shared {
                label,
                state,
                fetch,
                on_error,
            }),
            poll_interval: Mutex::new(poll_interval),
            driver: Mutex::new(None),
        };
        query.restart();
        query
    }

    /// Tear down the current driver and start a new one, which fetches
    /// immediately. Used when an identifying parameter changes.
    pub(crate) fn restart(&self) {
        let poll_interval = *self.poll_interval.lock();
        let shared = self.shared.clone();
        let task = ScopedTask::spawn(move |stop| drive(shared, poll_interval, stop));

        if self.driver.lock().replace(task).is_some() && poll_interval.is_some() {
            tracing::debug!(query = self.shared.label, "previous poll torn down");
        }
    }

    pub(crate) fn set_poll_interval(&self, poll_interval: Option<Duration>) {
        *self.poll_interval.lock() = poll_interval;
        self.restart();
    }

    pub(crate) fn poll_interval(&self) -> Option<Duration> {
        *self.poll_interval.lock()
    }

    /// Fetch again now and wait for the result to land in state.
    ///
    /// Dropping the returned future abandons the fetch and clears `loading`.
    pub async fn refetch(&self) {
        self.shared.run().await;
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> QueryState<T> {
        self.shared.state.borrow().clone()
    }

    /// Receiver that is notified on every state transition.
    pub fn subscribe(&self) -> watch::Receiver<QueryState<T>> {
        self.shared.state.subscribe()
    }
}

impl<T> Drop for Query<T> {
    fn drop(&mut self) {
        if self.driver.get_mut().take().is_some() {
            tracing::debug!(query = self.shared.label, "query unmounted");
        }
    }
}
