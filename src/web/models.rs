use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::relay::ChatRequest;

#[derive(Debug, Deserialize)]
pub struct ChatPayload {
    #[serde(default)]
    pub message: Option<String>,
    /// Left untyped so malformed history degrades to "no history".
    #[serde(default)]
    pub conversation_history: Value,
    #[serde(default)]
    pub is_new_chat: Option<bool>,
}

impl From<ChatPayload> for ChatRequest {
    fn from(payload: ChatPayload) -> Self {
        ChatRequest {
            message: payload.message.unwrap_or_default(),
            history: payload.conversation_history,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContactResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub chat_configured: bool,
    pub news_configured: bool,
    pub news_filter_english: bool,
    pub email_configured: bool,
    pub method: String,
    pub path: String,
    pub request_id: Uuid,
}
