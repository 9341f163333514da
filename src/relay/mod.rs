pub mod context;
pub mod reply;
pub mod retry;

use log::{error, info, warn};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ChatError;
use crate::model::{CompletionApi, CompletionError, CompletionRequest, UpstreamReply};

pub use reply::{ChatReply, FALLBACK_REPLY};
pub use retry::{AttemptOutcome, AttemptState, RetryPolicy};

const SERVICE_UNAVAILABLE: u16 = 503;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub history_cap: usize,
    pub content_cap: usize,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            history_cap: 12,
            content_cap: 300,
            timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_delay: Duration::from_secs(2),
            model: "tencent/hunyuan-a13b-instruct:free".to_string(),
            max_tokens: 512,
            temperature: 0.7,
        }
    }
}

impl RelayConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            delay: self.retry_delay,
        }
    }
}

/// One inbound chat message plus whatever history the caller holds.
///
/// `history` is kept as raw JSON: malformed entries are dropped during
/// context assembly instead of failing the request.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub message: String,
    pub history: Value,
}

pub struct ChatRelay {
    api: Arc<dyn CompletionApi>,
    config: RelayConfig,
}

impl ChatRelay {
    pub fn new(api: Arc<dyn CompletionApi>, config: RelayConfig) -> Self {
        Self { api, config }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.api.is_configured()
    }

    pub async fn handle(&self, request: ChatRequest) -> Result<ChatReply, ChatError> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(ChatError::Validation("No message provided".to_string()));
        }

        let messages = context::assemble(
            message,
            &request.history,
            self.config.history_cap,
            self.config.content_cap,
        );
        info!("Built {} messages for API call", messages.len());

        let completion = CompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            stream: false,
        };

        let upstream = self.call_with_retry(&completion).await?;
        let reply = reply::normalize(&upstream)?;
        info!("Final cleaned response: {} characters", reply.text.chars().count());
        Ok(reply)
    }

    async fn call_with_retry(&self, request: &CompletionRequest) -> Result<UpstreamReply, ChatError> {
        let policy = self.config.retry_policy();
        let mut state = AttemptState::Attempting;
        let mut attempts = 0;

        loop {
            attempts += 1;
            let result = match tokio::time::timeout(self.config.timeout, self.api.complete(request)).await {
                Ok(result) => result,
                Err(_) => Err(CompletionError::Network(format!(
                    "request timed out after {}s",
                    self.config.timeout.as_secs_f32()
                ))),
            };

            let outcome = classify(&result);
            state = policy.next(state, outcome, attempts);

            if state != AttemptState::RetryableFailure {
                return finish(result);
            }

            warn!(
                "Upstream attempt {}/{} failed ({:?}), retrying in {:?}",
                attempts,
                policy.max_attempts(),
                outcome,
                policy.delay
            );
            tokio::time::sleep(policy.delay).await;
            state = policy.next(state, outcome, attempts);
        }
    }
}

fn classify(result: &Result<UpstreamReply, CompletionError>) -> AttemptOutcome {
    match result {
        Ok(reply) if reply.is_success() => AttemptOutcome::Success,
        Ok(reply) if reply.status == SERVICE_UNAVAILABLE => AttemptOutcome::Transient,
        Ok(_) => AttemptOutcome::Permanent,
        Err(CompletionError::Network(_)) => AttemptOutcome::Network,
        Err(CompletionError::MissingApiKey | CompletionError::Request(_)) => {
            AttemptOutcome::Permanent
        }
    }
}

fn finish(result: Result<UpstreamReply, CompletionError>) -> Result<UpstreamReply, ChatError> {
    match result {
        Ok(reply) if reply.is_success() => Ok(reply),
        Ok(reply) if reply.status == SERVICE_UNAVAILABLE => {
            error!("Completion API still unavailable: {}", reply.body);
            Err(ChatError::ServiceUnavailable)
        }
        Ok(reply) => {
            error!("Completion API error {}: {}", reply.status, reply.body);
            Err(ChatError::upstream(
                format!("OpenRouter API error: {}", reply.status),
                reply.body,
            ))
        }
        Err(CompletionError::Network(cause)) => {
            error!("Network error: {}", cause);
            Err(ChatError::Network(cause))
        }
        Err(CompletionError::MissingApiKey) => {
            error!("OPENROUTER_API_KEY not set");
            Err(ChatError::Configuration(
                "OPENROUTER_API_KEY is not set".to_string(),
            ))
        }
        Err(CompletionError::Request(cause)) => {
            error!("Failed to build completion request: {}", cause);
            Err(ChatError::Internal(cause))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedApi {
        script: Mutex<VecDeque<Result<UpstreamReply, CompletionError>>>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedApi {
        fn new(script: Vec<Result<UpstreamReply, CompletionError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                seen: Mutex::default(),
            })
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionApi for ScriptedApi {
        async fn complete(&self, request: &CompletionRequest) -> Result<UpstreamReply, CompletionError> {
            self.seen.lock().unwrap().push(request.clone());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(CompletionError::Network("script exhausted".into())))
        }
    }

    fn status(code: u16) -> Result<UpstreamReply, CompletionError> {
        Ok(UpstreamReply {
            status: code,
            body: r#"{"error":"No instances available"}"#.to_string(),
        })
    }

    fn answer(content: &str) -> Result<UpstreamReply, CompletionError> {
        Ok(UpstreamReply {
            status: 200,
            body: json!({"choices": [{"message": {"content": content}}]}).to_string(),
        })
    }

    fn relay(api: Arc<ScriptedApi>) -> ChatRelay {
        let config = RelayConfig {
            retry_delay: Duration::ZERO,
            ..RelayConfig::default()
        };
        ChatRelay::new(api, config)
    }

    fn request(message: &str) -> ChatRequest {
        ChatRequest {
            message: message.to_string(),
            history: Value::Null,
        }
    }

    #[tokio::test]
    async fn blank_message_never_reaches_upstream() {
        let api = ScriptedApi::new(vec![answer("hi")]);
        for message in ["", "   ", "\n\t"] {
            let err = relay(api.clone()).handle(request(message)).await.unwrap_err();
            assert!(matches!(err, ChatError::Validation(_)));
        }
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn recovers_after_two_unavailable_responses() {
        let api = ScriptedApi::new(vec![status(503), status(503), answer("Drink water.")]);
        let reply = relay(api.clone()).handle(request("I feel dizzy")).await.unwrap();
        assert_eq!(reply.text, "Drink water.");
        assert_eq!(api.calls(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_three_unavailable_responses() {
        let api = ScriptedApi::new(vec![status(503), status(503), status(503), answer("late")]);
        let err = relay(api.clone()).handle(request("I feel dizzy")).await.unwrap_err();
        assert!(matches!(err, ChatError::ServiceUnavailable));
        assert_eq!(api.calls(), 3);
    }

    #[tokio::test]
    async fn network_failures_surface_with_cause() {
        let api = ScriptedApi::new(vec![
            Err(CompletionError::Network("connection refused".into())),
            Err(CompletionError::Network("connection refused".into())),
            Err(CompletionError::Network("connection refused".into())),
        ]);
        let err = relay(api.clone()).handle(request("hello")).await.unwrap_err();
        match err {
            ChatError::Network(cause) => assert_eq!(cause, "connection refused"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(api.calls(), 3);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let api = ScriptedApi::new(vec![status(401), answer("unused")]);
        let err = relay(api.clone()).handle(request("hello")).await.unwrap_err();
        assert_eq!(err.to_string(), "OpenRouter API error: 401");
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn missing_key_is_a_configuration_error() {
        let api = ScriptedApi::new(vec![Err(CompletionError::MissingApiKey)]);
        let err = relay(api.clone()).handle(request("hello")).await.unwrap_err();
        assert!(matches!(err, ChatError::Configuration(_)));
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn request_build_failure_is_internal() {
        let api = ScriptedApi::new(vec![Err(CompletionError::Request("invalid header value".into()))]);
        let err = relay(api.clone()).handle(request("hello")).await.unwrap_err();
        assert!(matches!(err, ChatError::Internal(_)));
        assert_eq!(err.details(), None);
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn slow_upstream_counts_as_network_failure() {
        struct Stalled;

        #[async_trait]
        impl CompletionApi for Stalled {
            async fn complete(&self, _: &CompletionRequest) -> Result<UpstreamReply, CompletionError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Err(CompletionError::Network("unreachable".into()))
            }
        }

        let config = RelayConfig {
            timeout: Duration::from_millis(10),
            max_retries: 0,
            ..RelayConfig::default()
        };
        let err = ChatRelay::new(Arc::new(Stalled), config)
            .handle(request("hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Network(_)));
    }

    #[tokio::test]
    async fn sends_bounded_context() {
        let history: Vec<Value> = (0..20)
            .map(|i| json!({"role": "user", "content": "y".repeat(500 + i)}))
            .collect();
        let api = ScriptedApi::new(vec![answer("ok")]);
        relay(api.clone())
            .handle(ChatRequest {
                message: "  I have a headache  ".to_string(),
                history: Value::Array(history),
            })
            .await
            .unwrap();

        let seen = api.seen.lock().unwrap();
        let sent = &seen[0];
        assert_eq!(sent.messages.len(), 14);
        assert_eq!(sent.messages[0].role, Role::System);
        assert!(sent.messages[1..13].iter().all(|m| m.content.chars().count() <= 300));
        let last = sent.messages.last().unwrap();
        assert_eq!(last.content, "I have a headache (Please respond in English)");
        assert!(!sent.stream);
        assert_eq!(sent.max_tokens, 512);
    }
}
