use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use crate::error::SupportError;
use crate::models::{Paginated, PaginationMeta};

/// Error shape stored in hook state.
///
/// Every failure a hook observes is normalized into this, whatever it was
/// originally. When it came from the client, `cause` keeps the original.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct HookError {
    pub message: String,
    #[source]
    pub cause: Option<Arc<SupportError>>,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// The client error behind this one, if any.
    pub fn support_error(&self) -> Option<&SupportError> {
        self.cause.as_deref()
    }

    /// Server rejection code, for programmatic branching.
    pub fn code(&self) -> Option<&str> {
        self.support_error().and_then(SupportError::code)
    }
}

impl From<SupportError> for HookError {
    fn from(err: SupportError) -> Self {
        Self {
            message: err.message().to_string(),
            cause: Some(Arc::new(err)),
        }
    }
}

impl From<String> for HookError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for HookError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<anyhow::Error> for HookError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Observable state of a query hook.
#[derive(Debug, Clone, Default)]
pub struct QueryState<T> {
    pub data: T,
    pub loading: bool,
    pub error: Option<HookError>,
}

/// Observable state of a mutation hook. Results are returned, not stored.
#[derive(Debug, Clone, Default)]
pub struct MutationState {
    pub loading: bool,
    pub error: Option<HookError>,
}

/// Clears the loading flag if the operation it guards never settles,
/// e.g. when the caller drops the future mid-flight.
pub(crate) struct LoadingGuard<'a, S> {
    label: &'static str,
    state: Option<&'a watch::Sender<S>>,
    clear: fn(&mut S),
}

impl<'a, S> LoadingGuard<'a, S> {
    pub(crate) fn new(
        label: &'static str,
        state: &'a watch::Sender<S>,
        clear: fn(&mut S),
    ) -> Self {
        Self {
            label,
            state: Some(state),
            clear,
        }
    }

    /// The operation settled; its own state update takes over.
    pub(crate) fn disarm(mut self) {
        self.state = None;
    }
}

impl<S> Drop for LoadingGuard<'_, S> {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            tracing::debug!(operation = self.label, "cancelled before settling");
            state.send_modify(self.clear);
        }
    }
}

/// One page of a list as held by a list hook.
#[derive(Debug, Clone, PartialEq)]
pub struct ListData<T> {
    pub items: Vec<T>,
    pub meta: Option<PaginationMeta>,
}

impl<T> Default for ListData<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            meta: None,
        }
    }
}

impl<T> From<Paginated<T>> for ListData<T> {
    fn from(page: Paginated<T>) -> Self {
        Self {
            items: page.data,
            meta: Some(page.meta),
        }
    }
}
