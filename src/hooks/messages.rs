use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use super::mutation::Mutation;
use super::query::{fetcher, OnError, Query};
use super::state::{HookError, ListData, MutationState, QueryState};
use crate::client::SupportClient;
use crate::models::{Message, PaginationParams};

/// A ticket's messages, one page at a time.
pub struct MessagesHook {
    query: Query<ListData<Message>>,
    ticket_id: Arc<Mutex<String>>,
    params: Arc<Mutex<PaginationParams>>,
}

impl MessagesHook {
    pub fn mount(
        client: Arc<SupportClient>,
        ticket_id: impl Into<String>,
        params: PaginationParams,
    ) -> Self {
        let ticket_id = Arc::new(Mutex::new(ticket_id.into()));
        let params = Arc::new(Mutex::new(params));
        let current_id = ticket_id.clone();
        let current = params.clone();

        let fetch = fetcher(move || {
            let client = client.clone();
            let id = current_id.lock().clone();
            let params = *current.lock();
            async move {
                client
                    .list_messages(&id, params)
                    .await
                    .map(ListData::from)
                    .map_err(HookError::from)
            }
        });

        Self {
            query: Query::mount("messages", fetch, OnError::Reset, None),
            ticket_id,
            params,
        }
    }

    pub fn ticket_id(&self) -> String {
        self.ticket_id.lock().clone()
    }

    /// Switch to another ticket's messages, keeping the pagination.
    /// Refetches only when the id changes.
    pub fn set_ticket_id(&self, ticket_id: impl Into<String>) {
        let ticket_id = ticket_id.into();
        {
            let mut current = self.ticket_id.lock();
            if *current == ticket_id {
                return;
            }
            *current = ticket_id;
        }
        self.query.restart();
    }

    pub fn state(&self) -> QueryState<ListData<Message>> {
        self.query.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState<ListData<Message>>> {
        self.query.subscribe()
    }

    pub fn params(&self) -> PaginationParams {
        *self.params.lock()
    }

    pub async fn refetch(&self) {
        self.query.refetch().await;
    }

    pub async fn fetch_page(&self, page: u32) {
        self.params.lock().page = Some(page);
        self.query.refetch().await;
    }
}

/// Sends user messages to one ticket.
pub struct SendMessageHook {
    client: Arc<SupportClient>,
    ticket_id: String,
    mutation: Mutation,
}

impl SendMessageHook {
    pub fn new(client: Arc<SupportClient>, ticket_id: impl Into<String>) -> Self {
        Self {
            client,
            ticket_id: ticket_id.into(),
            mutation: Mutation::new("send_message"),
        }
    }

    pub fn state(&self) -> MutationState {
        self.mutation.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<MutationState> {
        self.mutation.subscribe()
    }

    pub async fn send_message(
        &self,
        body: impl Into<String>,
    ) -> Result<Option<Message>, HookError> {
        self.mutation
            .run(self.client.send_message(&self.ticket_id, body))
            .await
    }
}
