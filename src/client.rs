//! API client for the support service.
//!
//! `SupportClient` turns one typed intent into exactly one round trip. Every
//! call resolves a fresh access token first, decorates the request with the
//! auth, tenant and content headers, and normalizes the outcome into either
//! a typed value or a [`SupportError`].
//!
//! A 204 is a bodiless success: record operations yield `None`, list
//! operations an empty page and the unread counter zero.

use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::config::{SupportConfig, TokenProvider};
use crate::error::{Result, SupportError, AUTH_TOKEN_FAILED, DECODE_FAILED, NETWORK_FAILED};
use crate::fingerprint::{probe, DeviceFingerprint, Environment};
use crate::models::{
    CreateTicketBody, CreateTicketParams, Device, Message, Paginated, PaginationParams,
    RegisterDeviceParams, SendMessageBody, Ticket, TicketWithMessages, Topic, TopicsResponse,
    UnreadCountResponse, UpdateDeviceParams,
};
use crate::transport::{HttpMethod, Transport, TransportRequest};

pub const TENANT_HEADER: &str = "X-Tenant-Key";
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Client for the support service.
///
/// Holds only read-only configuration, so one instance can be shared by
/// any number of hooks.
#[derive(Clone)]
pub struct SupportClient {
    base_url: String,
    tenant_key: String,
    app_version: Option<String>,
    environment: Environment,
    tokens: Arc<dyn TokenProvider>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for SupportClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupportClient")
            .field("base_url", &self.base_url)
            .field("tenant_key", &self.tenant_key)
            .field("app_version", &self.app_version)
            .finish_non_exhaustive()
    }
}

impl SupportClient {
    /// Build a client that talks HTTP through `reqwest`.
    #[cfg(feature = "reqwest-transport")]
    pub fn new(config: &SupportConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        let transport = crate::transport::ReqwestTransport::new(
            std::time::Duration::from_millis(config.timeout_ms),
            config.user_agent.as_deref(),
        )
        .map_err(|e| SupportError::transport("Failed to build HTTP client", e))?;

        Ok(Self::with_transport(config, tokens, Arc::new(transport)))
    }

    pub fn with_transport(
        config: &SupportConfig,
        tokens: Arc<dyn TokenProvider>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            tenant_key: config.tenant_key.clone(),
            app_version: config.app_version.clone(),
            environment: Environment::from_process(config.user_agent.as_deref()),
            tokens,
            transport,
        }
    }

    /// Replace the environment the fingerprint probe reads.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Fingerprint of the environment this client runs in.
    pub fn device_fingerprint(&self) -> DeviceFingerprint {
        probe(&self.environment)
    }

    // ── request helpers ──────────────────────────────────────────────

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// One authenticated round trip.
    ///
    /// Returns `None` for a 204 response, whose body is never read.
    async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Option<serde_json::Value>> {
        let token = self.tokens.token().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to retrieve auth token");
            SupportError::transport(AUTH_TOKEN_FAILED, e)
        })?;

        let request_id = Uuid::new_v4().to_string();
        let request = TransportRequest {
            method,
            url: self.url(path),
            headers: vec![
                ("Authorization".to_string(), format!("Bearer {}", token)),
                (TENANT_HEADER.to_string(), self.tenant_key.clone()),
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
                (REQUEST_ID_HEADER.to_string(), request_id.clone()),
            ],
            body,
        };

        tracing::debug!(%method, path, %request_id, "support request");

        let resp = self.transport.send(request).await.map_err(|e| {
            tracing::error!(%method, path, %request_id, error = %e, "Network request failed");
            SupportError::transport(NETWORK_FAILED, e)
        })?;

        let status = resp.status();
        if status == 204 {
            return Ok(None);
        }

        if !resp.ok() {
            let body = resp.json().await.ok();
            let err = SupportError::from_rejection(status, body.as_ref());
            tracing::warn!(
                %method,
                path,
                %request_id,
                status,
                code = err.code().unwrap_or_default(),
                "support request rejected"
            );
            return Err(err);
        }

        let value = resp
            .json()
            .await
            .map_err(|e| SupportError::transport(DECODE_FAILED, e))?;
        Ok(Some(value))
    }

    /// Round trip decoded into `T`; `None` when the server answered 204.
    async fn send<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Option<T>> {
        let Some(value) = self.request(method, path, body).await? else {
            return Ok(None);
        };
        serde_json::from_value(value).map(Some).map_err(|e| {
            tracing::error!(%method, path, error = %e, "failed to decode support response");
            SupportError::transport(DECODE_FAILED, e)
        })
    }

    // ── tickets ──────────────────────────────────────────────────────

    /// List the caller's tickets (GET /tickets). A 204 is an empty page.
    pub async fn list_tickets(&self, params: PaginationParams) -> Result<Paginated<Ticket>> {
        let path = format!("/tickets{}", params.to_query_string());
        let page: Option<Paginated<Ticket>> = self.send(HttpMethod::Get, &path, None).await?;
        Ok(page.unwrap_or_default())
    }

    /// Ticket detail with its messages (GET /tickets/{id}).
    pub async fn get_ticket(&self, ticket_id: &str) -> Result<Option<TicketWithMessages>> {
        let path = format!("/tickets/{}", encode_segment(ticket_id));
        self.send(HttpMethod::Get, &path, None).await
    }

    /// Open a ticket (POST /tickets).
    ///
    /// Device fields the caller leaves empty are filled from the
    /// fingerprint probe, and `app_version` from the client config.
    pub async fn create_ticket(&self, params: CreateTicketParams) -> Result<Option<Ticket>> {
        let body = to_body(&self.create_ticket_body(params))?;
        self.send(HttpMethod::Post, "/tickets", Some(body)).await
    }

    pub(crate) fn create_ticket_body(&self, params: CreateTicketParams) -> CreateTicketBody {
        let detected = self.device_fingerprint();

        CreateTicketBody {
            message: params.message,
            title: params.title,
            topic_id: params.topic_id,
            context: params.context,
            platform: params.platform.unwrap_or(detected.platform),
            os_version: params.os_version.unwrap_or(detected.os_version),
            device_model: params.device_model.unwrap_or(detected.device_model),
            app_version: params.app_version.or_else(|| self.app_version.clone()),
            locale: params.locale.unwrap_or(detected.locale),
            timezone: params.timezone.unwrap_or(detected.timezone),
        }
    }

    /// Mark every message on a ticket as read (POST /tickets/{id}/read).
    pub async fn mark_read(&self, ticket_id: &str) -> Result<()> {
        let path = format!("/tickets/{}/read", encode_segment(ticket_id));
        self.request(HttpMethod::Post, &path, None).await?;
        Ok(())
    }

    /// Number of tickets with unread operator replies (GET /tickets/unread_count).
    pub async fn unread_count(&self) -> Result<u64> {
        let resp: Option<UnreadCountResponse> = self
            .send(HttpMethod::Get, "/tickets/unread_count", None)
            .await?;
        Ok(resp.map_or(0, |r| r.unread_count))
    }

    // ── messages ─────────────────────────────────────────────────────

    /// One page of a ticket's messages (GET /tickets/{id}/messages).
    pub async fn list_messages(
        &self,
        ticket_id: &str,
        params: PaginationParams,
    ) -> Result<Paginated<Message>> {
        let path = format!(
            "/tickets/{}/messages{}",
            encode_segment(ticket_id),
            params.to_query_string()
        );
        let page: Option<Paginated<Message>> = self.send(HttpMethod::Get, &path, None).await?;
        Ok(page.unwrap_or_default())
    }

    /// Append a user message to a ticket (POST /tickets/{id}/messages).
    pub async fn send_message(
        &self,
        ticket_id: &str,
        body: impl Into<String>,
    ) -> Result<Option<Message>> {
        let path = format!("/tickets/{}/messages", encode_segment(ticket_id));
        let body = to_body(&SendMessageBody { body: body.into() })?;
        self.send(HttpMethod::Post, &path, Some(body)).await
    }

    // ── topics ───────────────────────────────────────────────────────

    /// Topics selectable when opening a ticket (GET /topics).
    pub async fn list_topics(&self) -> Result<Vec<Topic>> {
        let resp: Option<TopicsResponse> = self.send(HttpMethod::Get, "/topics", None).await?;
        Ok(resp.map(|r| r.topics).unwrap_or_default())
    }

    // ── devices ──────────────────────────────────────────────────────

    /// Register a push-capable device (POST /devices).
    pub async fn register_device(&self, params: RegisterDeviceParams) -> Result<Option<Device>> {
        let body = to_body(&params)?;
        self.send(HttpMethod::Post, "/devices", Some(body)).await
    }

    /// Update a registered device, e.g. after a token rotation (PATCH /devices/{id}).
    pub async fn update_device(
        &self,
        device_id: &str,
        params: UpdateDeviceParams,
    ) -> Result<Option<Device>> {
        let path = format!("/devices/{}", encode_segment(device_id));
        let body = to_body(&params)?;
        self.send(HttpMethod::Patch, &path, Some(body)).await
    }

    /// Unregister a device (DELETE /devices/{id}).
    pub async fn delete_device(&self, device_id: &str) -> Result<()> {
        let path = format!("/devices/{}", encode_segment(device_id));
        self.request(HttpMethod::Delete, &path, None).await?;
        Ok(())
    }
}

fn to_body<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| SupportError::transport("Failed to encode request", e))
}

/// Everything but RFC 3986 unreserved characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode one path segment.
fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticToken;
    use crate::transport::TransportResponse;
    use async_trait::async_trait;

    struct Unused;

    #[async_trait]
    impl Transport for Unused {
        async fn send(&self, _: TransportRequest) -> anyhow::Result<Box<dyn TransportResponse>> {
            anyhow::bail!("not used")
        }
    }

    fn client(config: SupportConfig) -> SupportClient {
        SupportClient::with_transport(
            &config,
            Arc::new(StaticToken("t".into())),
            Arc::new(Unused),
        )
        .with_environment(
            Environment::new(
                "Mozilla/5.0 (X11; Linux x86_64; rv:126.0) Gecko/20100101 Firefox/126.0",
            )
            .with_locale("fr-FR")
            .with_timezone("Europe/Paris"),
        )
    }

    #[test]
    fn trailing_separators_are_stripped_once() {
        for base in [
            "https://help.example.com/api",
            "https://help.example.com/api/",
            "https://help.example.com/api///",
        ] {
            let c = client(SupportConfig::new(base, "acme"));
            assert_eq!(c.url("/tickets"), "https://help.example.com/api/tickets");
        }
    }

    #[test]
    fn create_body_is_filled_from_probe() {
        let c = client(SupportConfig::new("https://x", "acme").with_app_version("3.1.0"));
        let body = c.create_ticket_body(CreateTicketParams::new("help"));
        let fp = c.device_fingerprint();

        assert_eq!(body.platform, fp.platform);
        assert_eq!(body.os_version, fp.os_version);
        assert_eq!(body.device_model, fp.device_model);
        assert_eq!(body.locale, "fr-FR");
        assert_eq!(body.timezone, "Europe/Paris");
        assert_eq!(body.app_version.as_deref(), Some("3.1.0"));
    }

    #[test]
    fn explicit_fields_override_probe() {
        let c = client(SupportConfig::new("https://x", "acme").with_app_version("3.1.0"));
        let params = CreateTicketParams {
            os_version: Some("Custom OS 1".into()),
            app_version: Some("9.9.9".into()),
            locale: Some("ja-JP".into()),
            ..CreateTicketParams::new("help")
        };
        let body = c.create_ticket_body(params);

        assert_eq!(body.os_version, "Custom OS 1");
        assert_eq!(body.app_version.as_deref(), Some("9.9.9"));
        assert_eq!(body.locale, "ja-JP");
        // untouched fields still come from the probe
        assert_eq!(body.device_model, "Firefox 126.0");
        assert_eq!(body.timezone, "Europe/Paris");
    }

    #[test]
    fn segments_are_percent_encoded() {
        assert_eq!(encode_segment("t_123-abc"), "t_123-abc");
        assert_eq!(encode_segment("a/b c"), "a%2Fb%20c");
        assert_eq!(encode_segment("é"), "%C3%A9");
        assert_eq!(encode_segment("50%~ok?"), "50%25~ok%3F");
    }
}
