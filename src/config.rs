//! Client configuration and the access-token capability.
//!
//! `SupportConfig` holds the read-only settings a [`SupportClient`] is built
//! from. Tokens are not configuration: they come from a [`TokenProvider`]
//! the hosting application supplies, and are resolved once per request.
//!
//! [`SupportClient`]: crate::SupportClient

use std::future::Future;

use anyhow::Context as _;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportConfig {
    #[serde(default = "d_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub tenant_key: String,
    /// Sent with new tickets unless the caller supplies its own.
    #[serde(default)]
    pub app_version: Option<String>,
    #[serde(default = "d_10000")]
    pub timeout_ms: u64,
    /// User agent for the HTTP transport and the fingerprint probe.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            base_url: d_base_url(),
            tenant_key: String::new(),
            app_version: None,
            timeout_ms: d_10000(),
            user_agent: None,
        }
    }
}

impl SupportConfig {
    pub fn new(base_url: impl Into<String>, tenant_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            tenant_key: tenant_key.into(),
            ..Default::default()
        }
    }

    pub fn with_app_version(mut self, app_version: impl Into<String>) -> Self {
        self.app_version = Some(app_version.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Read settings from `SUPPORT_*` environment variables.
    ///
    /// `SUPPORT_BASE_URL` and `SUPPORT_TENANT_KEY` are required.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let base_url = lookup("SUPPORT_BASE_URL").context("SUPPORT_BASE_URL is not set")?;
        let tenant_key = lookup("SUPPORT_TENANT_KEY").context("SUPPORT_TENANT_KEY is not set")?;

        let timeout_ms = match lookup("SUPPORT_TIMEOUT_MS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("SUPPORT_TIMEOUT_MS is not a number: {raw}"))?,
            None => d_10000(),
        };

        Ok(Self {
            base_url,
            tenant_key,
            app_version: lookup("SUPPORT_APP_VERSION"),
            timeout_ms,
            user_agent: lookup("SUPPORT_USER_AGENT"),
        })
    }
}

// serde default helpers

fn d_base_url() -> String {
    "http://localhost:3000/api/v1".into()
}
fn d_10000() -> u64 {
    10_000
}

/// Produces the access token attached to every request.
///
/// Called once per request; implementations that cache or refresh tokens
/// do so internally.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> anyhow::Result<String>;
}

/// A fixed token, for service accounts and tests.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> anyhow::Result<String> {
        Ok(self.0.clone())
    }
}

#[async_trait]
impl<F, Fut> TokenProvider for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
{
    async fn token(&self) -> anyhow::Result<String> {
        (self)().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let cfg = SupportConfig::default();
        assert_eq!(cfg.timeout_ms, 10_000);
        assert!(cfg.app_version.is_none());

        let cfg: SupportConfig =
            serde_json::from_str(r#"{ "tenant_key": "acme" }"#).unwrap();
        assert_eq!(cfg.tenant_key, "acme");
        assert_eq!(cfg.base_url, "http://localhost:3000/api/v1");
    }

    #[test]
    fn from_lookup_reads_all_keys() {
        let vars: HashMap<&str, &str> = [
            ("SUPPORT_BASE_URL", "https://support.example.com/api/"),
            ("SUPPORT_TENANT_KEY", "acme"),
            ("SUPPORT_APP_VERSION", "2.4.1"),
            ("SUPPORT_TIMEOUT_MS", "2500"),
        ]
        .into_iter()
        .collect();

        let cfg = SupportConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.base_url, "https://support.example.com/api/");
        assert_eq!(cfg.tenant_key, "acme");
        assert_eq!(cfg.app_version.as_deref(), Some("2.4.1"));
        assert_eq!(cfg.timeout_ms, 2500);
        assert_eq!(cfg.user_agent, None);
    }

    #[test]
    fn from_lookup_requires_tenant() {
        let err = SupportConfig::from_lookup(|k| {
            (k == "SUPPORT_BASE_URL").then(|| "https://x".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("SUPPORT_TENANT_KEY"));
    }

    #[test]
    fn from_lookup_rejects_bad_timeout() {
        let err = SupportConfig::from_lookup(|k| match k {
            "SUPPORT_TIMEOUT_MS" => Some("soon".into()),
            _ => Some("x".into()),
        })
        .unwrap_err();
        assert!(err.to_string().contains("SUPPORT_TIMEOUT_MS"));
    }

    #[tokio::test]
    async fn closure_token_provider() {
        let provider = || async { Ok::<_, anyhow::Error>("tok_123".to_string()) };
        assert_eq!(provider.token().await.unwrap(), "tok_123");

        let fixed = StaticToken("abc".into());
        assert_eq!(fixed.token().await.unwrap(), "abc");
    }
}
