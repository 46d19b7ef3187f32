//! # support-client
//!
//! Client library for a remote support-ticket service.
//!
//! ## Features
//!
//! - **API Client** - One typed method per remote operation, with token,
//!   tenant and content headers injected on every request
//! - **Error Taxonomy** - Server rejections (`code` + `status_code`) kept
//!   apart from transport failures (`cause`)
//! - **Fingerprint Probe** - Platform/OS/browser/locale/timezone detection
//!   for new tickets
//! - **Hooks** - Observable `{data, loading, error}` state for queries,
//!   `{loading, error}` for mutations, and a polling unread counter
//! - **Pluggable Transport** - `reqwest` by default, or any [`Transport`]
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use support_client::{PaginationParams, StaticToken, SupportConfig, SupportContext};
//!
//! # async fn example() -> support_client::Result<()> {
//! let config = SupportConfig::new("https://support.example.com/api/v1", "acme")
//!     .with_app_version("2.4.1");
//! let ctx = SupportContext::new(&config, Arc::new(StaticToken("token".into())))?;
//!
//! // Query hooks fetch as soon as they are mounted
//! let tickets = ctx.use_tickets(PaginationParams::page(1).with_per_page(20));
//! let unread = ctx.use_unread_count(Some(Duration::from_secs(30)));
//!
//! tickets.fetch_page(2).await;
//! println!("{} tickets, {} unread", tickets.state().data.items.len(), unread.state().data);
//! # Ok(())
//! # }
//! ```
//!
//! ### Errors
//!
//! ```rust
//! use support_client::SupportError;
//!
//! fn describe(err: &SupportError) -> String {
//!     match err {
//!         SupportError::Api { code, status_code, .. } => format!("{code} ({status_code})"),
//!         SupportError::Transport { message, .. } => message.clone(),
//!     }
//! }
//! ```

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod fingerprint;
pub mod hooks;
pub mod models;
pub mod transport;

// Re-export commonly used types
pub use client::SupportClient;
pub use config::{StaticToken, SupportConfig, TokenProvider};
pub use context::SupportContext;
pub use error::{Result, SupportError};
pub use fingerprint::{probe, DeviceFingerprint, Environment};
pub use hooks::*;
pub use models::*;
pub use transport::{HttpMethod, Transport, TransportRequest, TransportResponse};

#[cfg(feature = "reqwest-transport")]
pub use transport::ReqwestTransport;
