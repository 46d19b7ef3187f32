use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub topic_id: Option<String>,
    /// Opaque integrator payload, stored verbatim by the service.
    #[serde(default)]
    pub context: serde_json::Value,
    #[serde(default)]
    pub device_info: DeviceInfo,
    /// Server-owned; refreshed by refetching, never flipped locally.
    #[serde(default)]
    pub unread: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketWithMessages {
    #[serde(flatten)]
    pub ticket: Ticket,
    /// Chronological, oldest first.
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderType {
    User,
    Operator,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender_type: SenderType,
    #[serde(default)]
    pub sender_id: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub platform: String,
    pub push_token: String,
    pub token_type: String,
    #[serde(default)]
    pub os_version: Option<String>,
}

/// Device snapshot captured when a ticket is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub os_version: Option<String>,
    #[serde(default)]
    pub device_model: Option<String>,
    #[serde(default)]
    pub app_version: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub per_page: u32,
}

/// A list response: one page of records plus its pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T> Default for Paginated<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            meta: PaginationMeta::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PaginationParams {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            per_page: None,
        }
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    /// Query string for the supplied keys only, `page` before `per_page`.
    ///
    /// Returns an empty string when neither key is set.
    pub fn to_query_string(&self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in [("page", self.page), ("per_page", self.per_page)] {
            if let Some(value) = value {
                query.append_pair(key, &value.to_string());
            }
        }

        let query = query.finish();
        if query.is_empty() {
            query
        } else {
            format!("?{query}")
        }
    }
}

// Input types

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateTicketParams {
    /// First message of the conversation.
    pub message: String,
    pub title: Option<String>,
    pub topic_id: Option<String>,
    pub context: Option<serde_json::Value>,
    pub platform: Option<String>,
    pub os_version: Option<String>,
    pub device_model: Option<String>,
    pub app_version: Option<String>,
    pub locale: Option<String>,
    pub timezone: Option<String>,
}

impl CreateTicketParams {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }
}

/// Wire body for `POST /tickets`, with every device field resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct CreateTicketBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
    pub platform: String,
    pub os_version: String,
    pub device_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    pub locale: String,
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SendMessageBody {
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterDeviceParams {
    pub push_token: String,
    pub token_type: String,
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDeviceParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
}

// Wrapped scalar responses

#[derive(Debug, Deserialize)]
pub(crate) struct UnreadCountResponse {
    pub unread_count: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopicsResponse {
    pub topics: Vec<Topic>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_string_only_has_supplied_keys() {
        let cases = [
            (None, None, ""),
            (Some(2), None, "?page=2"),
            (None, Some(50), "?per_page=50"),
            (Some(3), Some(25), "?page=3&per_page=25"),
        ];

        for (page, per_page, expected) in cases {
            let params = PaginationParams { page, per_page };
            assert_eq!(params.to_query_string(), expected);
        }
    }

    #[test]
    fn ticket_with_messages_flattens_ticket_fields() {
        let value = json!({
            "id": "t_1",
            "title": "Payment failed",
            "topic_id": null,
            "context": { "order": 991 },
            "device_info": { "platform": "web", "locale": "en-US" },
            "unread": true,
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T10:05:00Z",
            "messages": [
                {
                    "id": "m_1",
                    "sender_type": "user",
                    "sender_id": "u_7",
                    "body": "My card was charged twice",
                    "created_at": "2024-05-01T10:00:00Z"
                },
                {
                    "id": "m_2",
                    "sender_type": "operator",
                    "body": "Looking into it",
                    "created_at": "2024-05-01T10:05:00Z"
                }
            ]
        });

        let detail: TicketWithMessages = serde_json::from_value(value).unwrap();
        assert_eq!(detail.ticket.id, "t_1");
        assert!(detail.ticket.unread);
        assert_eq!(detail.ticket.device_info.platform.as_deref(), Some("web"));
        assert_eq!(detail.messages.len(), 2);
        assert_eq!(detail.messages[1].sender_type, SenderType::Operator);
        assert_eq!(detail.messages[1].sender_id, None);
    }

    #[test]
    fn create_body_omits_absent_optionals() {
        let body = CreateTicketBody {
            message: "hi".into(),
            title: None,
            topic_id: None,
            context: None,
            platform: "web".into(),
            os_version: "Linux".into(),
            device_model: "Firefox 126.0".into(),
            app_version: None,
            locale: "en-US".into(),
            timezone: "UTC".into(),
        };

        let value = serde_json::to_value(&body).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("title"));
        assert!(!object.contains_key("app_version"));
        assert_eq!(object["device_model"], "Firefox 126.0");
    }
}
