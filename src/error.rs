use thiserror::Error;

/// Message used when the token provider fails before any request is sent.
pub const AUTH_TOKEN_FAILED: &str = "Failed to retrieve auth token";

/// Message used when the transport call itself fails.
pub const NETWORK_FAILED: &str = "Network request failed";

/// Message used when a successful response body cannot be decoded.
pub const DECODE_FAILED: &str = "Failed to decode response";

/// Fallback code for rejections that carry no machine-readable code.
pub const INTERNAL_ERROR_CODE: &str = "INTERNAL_ERROR";

/// Support client errors
///
/// The two variants never overlap: `Api` means the service answered and
/// declined, `Transport` means no decisive answer was obtained.
#[derive(Error, Debug)]
pub enum SupportError {
    #[error("{message}")]
    Api {
        message: String,
        code: String,
        status_code: u16,
    },

    #[error("{message}")]
    Transport {
        message: String,
        #[source]
        cause: anyhow::Error,
    },
}

impl SupportError {
    pub fn api(message: impl Into<String>, code: impl Into<String>, status_code: u16) -> Self {
        Self::Api {
            message: message.into(),
            code: code.into(),
            status_code,
        }
    }

    pub fn transport(message: impl Into<String>, cause: impl Into<anyhow::Error>) -> Self {
        Self::Transport {
            message: message.into(),
            cause: cause.into(),
        }
    }

    /// Build a rejection from a non-ok status and whatever body could be read.
    ///
    /// `body` is `None` when the response body was not valid JSON.
    pub(crate) fn from_rejection(status_code: u16, body: Option<&serde_json::Value>) -> Self {
        let field = |name: &str| {
            body.and_then(|b| b.get(name))
                .and_then(|v| v.as_str())
                .map(str::to_owned)
        };

        let message = field("error")
            .unwrap_or_else(|| format!("Request failed with status {}", status_code));
        let code = field("code").unwrap_or_else(|| INTERNAL_ERROR_CODE.to_string());

        Self::Api {
            message,
            code,
            status_code,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Api { message, .. } | Self::Transport { message, .. } => message,
        }
    }

    /// Machine-readable code, only present on server rejections.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            Self::Transport { .. } => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status_code, .. } => Some(*status_code),
            Self::Transport { .. } => None,
        }
    }

    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

pub type Result<T> = std::result::Result<T, SupportError>;
