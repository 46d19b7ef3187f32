use std::sync::Arc;

use tokio::sync::watch;

use super::query::{fetcher, OnError, Query};
use super::state::{HookError, QueryState};
use crate::client::SupportClient;
use crate::models::Topic;

pub struct TopicsHook {
    query: Query<Vec<Topic>>,
}

impl TopicsHook {
    pub fn mount(client: Arc<SupportClient>) -> Self {
        let fetch = fetcher(move || {
            let client = client.clone();
            async move { client.list_topics().await.map_err(HookError::from) }
        });

        Self {
            query: Query::mount("topics", fetch, OnError::Reset, None),
        }
    }

    pub fn state(&self) -> QueryState<Vec<Topic>> {
        self.query.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState<Vec<Topic>>> {
        self.query.subscribe()
    }

    pub async fn refetch(&self) {
        self.query.refetch().await;
    }
}
