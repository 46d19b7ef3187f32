//! Scripted in-memory transport shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use support_client::{
    Environment, HttpMethod, StaticToken, SupportClient, SupportConfig, Transport,
    TransportRequest, TransportResponse,
};

pub const BASE_URL: &str = "https://help.example.com/api/v1";
pub const FIREFOX_LINUX: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:126.0) Gecko/20100101 Firefox/126.0";

#[derive(Debug, Clone)]
pub enum Reply {
    Json(u16, Value),
    NoContent,
    /// Non-JSON body with this status.
    Garbage(u16),
    /// The round trip itself fails.
    Fail(String),
}

type Handler = Box<dyn Fn(&TransportRequest) -> Reply + Send + Sync>;

pub struct ScriptedTransport {
    handler: Mutex<Handler>,
    requests: Mutex<Vec<TransportRequest>>,
    body_reads: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub fn new(handler: impl Fn(&TransportRequest) -> Reply + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            handler: Mutex::new(Box::new(handler)),
            requests: Mutex::new(Vec::new()),
            body_reads: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn always(reply: Reply) -> Arc<Self> {
        Self::new(move |_| reply.clone())
    }

    pub fn set_handler(&self, handler: impl Fn(&TransportRequest) -> Reply + Send + Sync + 'static) {
        *self.handler.lock() = Box::new(handler);
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> TransportRequest {
        self.requests.lock().last().cloned().expect("no request was sent")
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        let url = format!("{BASE_URL}{path}");
        self.requests.lock().iter().filter(|r| r.url == url).count()
    }

    pub fn body_reads(&self) -> usize {
        self.body_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> anyhow::Result<Box<dyn TransportResponse>> {
        let reply = {
            let handler = self.handler.lock();
            (**handler)(&request)
        };
        self.requests.lock().push(request);

        match reply {
            Reply::Fail(msg) => Err(anyhow::anyhow!(msg)),
            Reply::NoContent => Ok(Box::new(Scripted {
                status: 204,
                body: None,
                reads: self.body_reads.clone(),
            })),
            Reply::Garbage(status) => Ok(Box::new(Scripted {
                status,
                body: None,
                reads: self.body_reads.clone(),
            })),
            Reply::Json(status, body) => Ok(Box::new(Scripted {
                status,
                body: Some(body),
                reads: self.body_reads.clone(),
            })),
        }
    }
}

struct Scripted {
    status: u16,
    body: Option<Value>,
    reads: Arc<AtomicUsize>,
}

#[async_trait]
impl TransportResponse for Scripted {
    fn status(&self) -> u16 {
        self.status
    }

    async fn json(self: Box<Self>) -> anyhow::Result<Value> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.body
            .ok_or_else(|| anyhow::anyhow!("expected value at line 1 column 1"))
    }
}

pub fn config() -> SupportConfig {
    SupportConfig::new(format!("{BASE_URL}/"), "acme").with_app_version("2.4.1")
}

pub fn client_with(transport: Arc<ScriptedTransport>) -> SupportClient {
    SupportClient::with_transport(&config(), Arc::new(StaticToken("tok_abc".into())), transport)
        .with_environment(
            Environment::new(FIREFOX_LINUX)
                .with_locale("en-GB")
                .with_timezone("Europe/London"),
        )
}

// ── fixtures ────────────────────────────────────────────────────────────

pub fn ticket_json(id: &str) -> Value {
    json!({
        "id": id,
        "title": "Cannot log in",
        "topic_id": "topic_auth",
        "context": { "screen": "login" },
        "device_info": { "platform": "web", "os_version": "Linux" },
        "unread": false,
        "created_at": "2024-05-01T10:00:00Z",
        "updated_at": "2024-05-01T10:00:00Z"
    })
}

pub fn message_json(id: &str, body: &str) -> Value {
    json!({
        "id": id,
        "sender_type": "user",
        "sender_id": "u_1",
        "body": body,
        "created_at": "2024-05-01T10:00:00Z"
    })
}

pub fn page_json(data: Vec<Value>, current_page: u32) -> Value {
    json!({
        "data": data,
        "meta": {
            "current_page": current_page,
            "total_pages": 3,
            "total_count": 42,
            "per_page": 20
        }
    })
}

pub fn route(method: HttpMethod, path: &str, request: &TransportRequest) -> bool {
    let url = request.url.split('?').next().unwrap_or_default();
    request.method == method && url == format!("{BASE_URL}{path}")
}

/// Let spawned hook tasks run to their next suspension point.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}
