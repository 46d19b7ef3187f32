//! The transport primitive the client is built on.
//!
//! [`Transport`] is a fetch-like capability: one request in, one response
//! out. The default implementation wraps `reqwest`; tests and embedders can
//! inject their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl TransportRequest {
    /// First header value with this name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A response whose body has not been read yet.
#[async_trait]
pub trait TransportResponse: Send {
    fn status(&self) -> u16;

    fn ok(&self) -> bool {
        (200..300).contains(&self.status())
    }

    /// Read and parse the body as JSON. Consumes the response.
    async fn json(self: Box<Self>) -> anyhow::Result<serde_json::Value>;
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one round trip. An `Err` means no response was obtained.
    async fn send(&self, request: TransportRequest) -> anyhow::Result<Box<dyn TransportResponse>>;
}

#[cfg(feature = "reqwest-transport")]
pub use self::reqwest_impl::ReqwestTransport;

#[cfg(feature = "reqwest-transport")]
mod reqwest_impl {
    use std::time::Duration;

    use async_trait::async_trait;
    use reqwest::Client;

    use super::{HttpMethod, Transport, TransportRequest, TransportResponse};

    /// [`Transport`] backed by a pooled `reqwest::Client`.
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        http: Client,
    }

    impl ReqwestTransport {
        pub fn new(timeout: Duration, user_agent: Option<&str>) -> anyhow::Result<Self> {
            let mut builder = Client::builder().timeout(timeout);
            if let Some(ua) = user_agent {
                builder = builder.user_agent(ua);
            }
            Ok(Self {
                http: builder.build()?,
            })
        }

        pub fn from_client(http: Client) -> Self {
            Self { http }
        }
    }

    #[async_trait]
    impl Transport for ReqwestTransport {
        async fn send(
            &self,
            request: TransportRequest,
        ) -> anyhow::Result<Box<dyn TransportResponse>> {
            let mut rb = match request.method {
                HttpMethod::Get => self.http.get(&request.url),
                HttpMethod::Post => self.http.post(&request.url),
                HttpMethod::Patch => self.http.patch(&request.url),
                HttpMethod::Delete => self.http.delete(&request.url),
            };

            for (name, value) in &request.headers {
                rb = rb.header(name.as_str(), value.as_str());
            }
            if let Some(body) = &request.body {
                rb = rb.json(body);
            }

            let resp = rb.send().await?;
            Ok(Box::new(ReqwestResponse(resp)))
        }
    }

    struct ReqwestResponse(reqwest::Response);

    #[async_trait]
    impl TransportResponse for ReqwestResponse {
        fn status(&self) -> u16 {
            self.0.status().as_u16()
        }

        async fn json(self: Box<Self>) -> anyhow::Result<serde_json::Value> {
            Ok(self.0.json::<serde_json::Value>().await?)
        }
    }
}
