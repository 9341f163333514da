use log::{error, warn};

use crate::error::ChatError;
use crate::model::{CompletionResponse, UpstreamReply};
use crate::text::{sanitize, strip_answer_wrapper};

pub const FALLBACK_REPLY: &str = "I'm sorry, I couldn't generate a response. Please try again.";

/// Sanitized text returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
}

/// Turns a successful upstream body into a reply.
pub fn normalize(reply: &UpstreamReply) -> Result<ChatReply, ChatError> {
    let parsed: CompletionResponse = serde_json::from_str(&reply.body).map_err(|e| {
        error!("Invalid JSON from completion API: {}", e);
        ChatError::upstream("Invalid response from AI service", reply.body.clone())
    })?;

    if parsed.choices.as_ref().map_or(true, Vec::is_empty) {
        error!("No choices in completion response: {}", reply.body);
        return Err(ChatError::upstream(
            "No response choices from AI service",
            reply.body.clone(),
        ));
    }

    let content = parsed.first_content().ok_or_else(|| {
        error!("No message content in first choice: {}", reply.body);
        ChatError::upstream("No message in AI response", reply.body.clone())
    })?;

    Ok(ChatReply {
        text: clean_content(content),
    })
}

/// Strips the answer wrapper and any markup; never returns an empty string.
pub fn clean_content(content: &str) -> String {
    let cleaned = sanitize(&strip_answer_wrapper(content));
    if !cleaned.is_empty() {
        return cleaned;
    }

    warn!("Empty response after cleaning, using fallback");
    let original = content.trim();
    if original.is_empty() {
        FALLBACK_REPLY.to_string()
    } else {
        original.to_string()
    }
}
