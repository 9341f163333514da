use serde_json::Value;

use crate::model::{Message, Role};
use crate::text::{detect_language, sanitize, truncate_chars};

pub const SYSTEM_PROMPT: &str = "You are a professional medical AI assistant for Inspair.Health. Your ONLY purpose is to provide medical information and health guidance.\n\n\
STRICT RULES - YOU MUST FOLLOW THESE:\n\
1. ONLY answer questions about: medical conditions, symptoms, treatments, medications, health advice, nutrition, exercise for health, mental health, preventive care, and general health information\n\
2. If asked about ANY non-health topic (technology, sports, news, entertainment, politics, etc.), respond with: 'I am a medical AI assistant and can only help with health-related questions. Please ask me about medical topics, symptoms, treatments, or general health information.'\n\
3. Always provide clear, concise, and professional medical information\n\
4. Use simple, understandable language while maintaining medical accuracy\n\
5. Always include this disclaimer: 'This is for informational purposes only. Please consult a healthcare professional for medical advice.'\n\
6. Never provide definitive diagnoses - only general information and guidance\n\
7. If unsure about a medical topic, say: 'I recommend consulting with a healthcare professional for this specific medical question.'\n\
8. Keep responses focused and to the point\n\
9. Respond in the same language as the user (English or Arabic)\n\n\
CRITICAL: Respond with plain text only. No XML tags, HTML tags, or special formatting. Write your response directly.";

/// Extracts the usable turns from caller-supplied history.
///
/// Anything that is not an array of `{role, content}` objects with a
/// user/assistant role and non-blank string content is skipped. The most
/// recent `history_cap` survivors are kept, each sanitized and cut to
/// `content_cap` characters.
pub fn history_turns(history: &Value, history_cap: usize, content_cap: usize) -> Vec<Message> {
    let Some(entries) = history.as_array() else {
        return Vec::new();
    };

    let mut turns: Vec<Message> = entries
        .iter()
        .filter_map(|entry| {
            let role = Role::from_history(entry.get("role")?.as_str()?)?;
            let content = sanitize(entry.get("content")?.as_str()?);
            if content.is_empty() {
                return None;
            }
            Some(Message::new(role, truncate_chars(&content, content_cap)))
        })
        .collect();

    if turns.len() > history_cap {
        turns.drain(..turns.len() - history_cap);
    }
    turns
}

pub fn assemble(message: &str, history: &Value, history_cap: usize, content_cap: usize) -> Vec<Message> {
    let turns = history_turns(history, history_cap, content_cap);

    let mut messages = Vec::with_capacity(turns.len() + 2);
    messages.push(Message::new(Role::System, SYSTEM_PROMPT));
    messages.extend(turns);

    let directive = detect_language(message).map(|lang| lang.directive()).unwrap_or("");
    messages.push(Message::new(Role::User, format!("{message}{directive}")));
    messages
}
