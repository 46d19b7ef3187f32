//! Provider wiring: one client per configuration, handed to every hook.

use std::sync::Arc;
use std::time::Duration;

use crate::client::SupportClient;
use crate::hooks::{
    CreateTicketHook, MarkAsReadHook, MessagesHook, SendMessageHook, TicketDetailHook,
    TicketsHook, TopicsHook, UnreadCountHook,
};
use crate::models::PaginationParams;

/// Owns the client for one configuration scope.
///
/// Cloning shares the same client. Separate contexts never share state, so
/// several tenants can live in one process.
///
/// # Panics
///
/// The query hooks (`use_tickets`, `use_ticket`, `use_messages`,
/// `use_topics`, `use_unread_count`) start fetching on mount and panic
/// when called outside a Tokio runtime. Mutation hooks do not spawn.
#[derive(Debug, Clone)]
pub struct SupportContext {
    client: Arc<SupportClient>,
}

impl SupportContext {
    #[cfg(feature = "reqwest-transport")]
    pub fn new(
        config: &crate::config::SupportConfig,
        tokens: Arc<dyn crate::config::TokenProvider>,
    ) -> crate::Result<Self> {
        Ok(Self::from_client(SupportClient::new(config, tokens)?))
    }

    pub fn from_client(client: SupportClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn client(&self) -> &Arc<SupportClient> {
        &self.client
    }

    pub fn use_tickets(&self, params: PaginationParams) -> TicketsHook {
        TicketsHook::mount(self.client.clone(), params)
    }

    pub fn use_ticket(&self, ticket_id: impl Into<String>) -> TicketDetailHook {
        TicketDetailHook::mount(self.client.clone(), ticket_id)
    }

    pub fn use_messages(
        &self,
        ticket_id: impl Into<String>,
        params: PaginationParams,
    ) -> MessagesHook {
        MessagesHook::mount(self.client.clone(), ticket_id, params)
    }

    pub fn use_topics(&self) -> TopicsHook {
        TopicsHook::mount(self.client.clone())
    }

    pub fn use_unread_count(&self, poll_interval: Option<Duration>) -> UnreadCountHook {
        UnreadCountHook::mount(self.client.clone(), poll_interval)
    }

    pub fn use_create_ticket(&self) -> CreateTicketHook {
        CreateTicketHook::new(self.client.clone())
    }

    pub fn use_send_message(&self, ticket_id: impl Into<String>) -> SendMessageHook {
        SendMessageHook::new(self.client.clone(), ticket_id)
    }

    pub fn use_mark_as_read(&self) -> MarkAsReadHook {
        MarkAsReadHook::new(self.client.clone())
    }
}
