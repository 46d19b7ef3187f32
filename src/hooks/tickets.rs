use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use super::mutation::Mutation;
use super::query::{fetcher, OnError, Query};
use super::state::{HookError, ListData, MutationState, QueryState};
use crate::client::SupportClient;
use crate::models::{CreateTicketParams, PaginationParams, Ticket, TicketWithMessages};

/// The caller's tickets, one page at a time.
pub struct TicketsHook {
    query: Query<ListData<Ticket>>,
    params: Arc<Mutex<PaginationParams>>,
}

impl TicketsHook {
    pub fn mount(client: Arc<SupportClient>, params: PaginationParams) -> Self {
        let params = Arc::new(Mutex::new(params));
        let current = params.clone();

        let fetch = fetcher(move || {
            let client = client.clone();
            let params = *current.lock();
            async move {
                client
                    .list_tickets(params)
                    .await
                    .map(ListData::from)
                    .map_err(HookError::from)
            }
        });

        Self {
            query: Query::mount("tickets", fetch, OnError::Reset, None),
            params,
        }
    }

    pub fn state(&self) -> QueryState<ListData<Ticket>> {
        self.query.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState<ListData<Ticket>>> {
        self.query.subscribe()
    }

    pub fn params(&self) -> PaginationParams {
        *self.params.lock()
    }

    pub async fn refetch(&self) {
        self.query.refetch().await;
    }

    /// Load `page`, keeping the current page size.
    pub async fn fetch_page(&self, page: u32) {
        self.params.lock().page = Some(page);
        self.query.refetch().await;
    }
}

/// One ticket with its messages.
pub struct TicketDetailHook {
    query: Query<Option<TicketWithMessages>>,
    ticket_id: Arc<Mutex<String>>,
}

impl TicketDetailHook {
    pub fn mount(client: Arc<SupportClient>, ticket_id: impl Into<String>) -> Self {
        let ticket_id = Arc::new(Mutex::new(ticket_id.into()));
        let current = ticket_id.clone();

        let fetch = fetcher(move || {
            let client = client.clone();
            let id = current.lock().clone();
            async move {
                client
                    .get_ticket(&id)
                    .await
                    .map_err(HookError::from)
            }
        });

        Self {
            query: Query::mount("ticket_detail", fetch, OnError::Reset, None),
            ticket_id,
        }
    }

    pub fn state(&self) -> QueryState<Option<TicketWithMessages>> {
        self.query.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState<Option<TicketWithMessages>>> {
        self.query.subscribe()
    }

    pub fn ticket_id(&self) -> String {
        self.ticket_id.lock().clone()
    }

    /// Switch to another ticket. Refetches only when the id changes.
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

    pub async fn refetch(&self) {
        self.query.refetch().await;
    }
}

pub struct CreateTicketHook {
    client: Arc<SupportClient>,
    mutation: Mutation,
}

impl CreateTicketHook {
    pub fn new(client: Arc<SupportClient>) -> Self {
        Self {
            client,
            mutation: Mutation::new("create_ticket"),
        }
    }

    pub fn state(&self) -> MutationState {
        self.mutation.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<MutationState> {
        self.mutation.subscribe()
    }

    /// Open a ticket. `None` when the server answered without a body.
    pub async fn create_ticket(
        &self,
        params: CreateTicketParams,
    ) -> Result<Option<Ticket>, HookError> {
        self.mutation.run(self.client.create_ticket(params)).await
    }
}
