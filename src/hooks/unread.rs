use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use super::mutation::Mutation;
use super::query::{fetcher, OnError, Query};
use super::state::{HookError, MutationState, QueryState};
use crate::client::SupportClient;

/// Unread ticket count, optionally kept fresh on a timer.
///
/// A failed fetch keeps the last known count so a badge does not drop to
/// zero on a transient error.
pub struct UnreadCountHook {
    query: Query<u64>,
}

impl UnreadCountHook {
    /// Fetch once, then every `poll_interval` when it is set and non-zero.
    pub fn mount(client: Arc<SupportClient>, poll_interval: Option<Duration>) -> Self {
        let fetch = fetcher(move || {
            let client = client.clone();
            async move { client.unread_count().await.map_err(HookError::from) }
        });

        Self {
            query: Query::mount("unread_count", fetch, OnError::Keep, poll_interval),
        }
    }

    pub fn state(&self) -> QueryState<u64> {
        self.query.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState<u64>> {
        self.query.subscribe()
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        self.query.poll_interval()
    }

    /// Replace the poll interval. The old timer is torn down first; the
    /// count is fetched again immediately and then on the new schedule.
    pub fn set_poll_interval(&self, poll_interval: Option<Duration>) {
        if self.query.poll_interval() != poll_interval {
            self.query.set_poll_interval(poll_interval);
        }
    }

    pub async fn refetch(&self) {
        self.query.refetch().await;
    }

    /// Stop polling and release the hook.
    pub fn unmount(self) {}
}

pub struct MarkAsReadHook {
    client: Arc<SupportClient>,
    mutation: Mutation,
}

impl MarkAsReadHook {
    pub fn new(client: Arc<SupportClient>) -> Self {
        Self {
            client,
            mutation: Mutation::new("mark_as_read"),
        }
    }

    pub fn state(&self) -> MutationState {
        self.mutation.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<MutationState> {
        self.mutation.subscribe()
    }

    pub async fn mark_as_read(&self, ticket_id: &str) -> Result<(), HookError> {
        self.mutation.run(self.client.mark_read(ticket_id)).await
    }
}
