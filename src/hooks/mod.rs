//! Synchronization hooks.
//!
//! Each hook pairs client calls with observable local state. Query hooks
//! (`TicketsHook`, `TicketDetailHook`, `MessagesHook`, `TopicsHook`,
//! `UnreadCountHook`) fetch when mounted and hold `{data, loading, error}`.
//! Mutation hooks (`CreateTicketHook`, `SendMessageHook`, `MarkAsReadHook`)
//! hold `{loading, error}` and hand results back to the caller.
//!
//! Mounting a query hook spawns a task on the current Tokio runtime;
//! dropping the hook unmounts it and stops any poll timer.

mod messages;
mod mutation;
mod query;
mod state;
mod task;
mod tickets;
mod topics;
mod unread;

pub use messages::{MessagesHook, SendMessageHook};
pub use mutation::Mutation;
pub use state::{HookError, ListData, MutationState, QueryState};
pub use tickets::{CreateTicketHook, TicketDetailHook, TicketsHook};
pub use topics::TopicsHook;
pub use unread::{MarkAsReadHook, UnreadCountHook};
