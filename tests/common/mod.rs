#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use inspair_health::contact::{ContactNotifier, MailError, Mailer, OutgoingMail};
use inspair_health::model::{CompletionApi, CompletionError, CompletionRequest, UpstreamReply};
use inspair_health::news::{NewsClient, NewsConfig};
use inspair_health::relay::{ChatRelay, RelayConfig};
use inspair_health::state::{load_templates, AppState};

/// Completion upstream that replays a fixed script and records requests.
#[derive(Default)]
pub struct StubCompletion {
    script: Mutex<VecDeque<Result<UpstreamReply, CompletionError>>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl StubCompletion {
    pub fn new(script: Vec<Result<UpstreamReply, CompletionError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::default(),
        })
    }

    pub fn answering(content: &str) -> Arc<Self> {
        Self::new(vec![answer(content)])
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionApi for StubCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<UpstreamReply, CompletionError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CompletionError::Network("stub script exhausted".into())))
    }
}

pub fn answer(content: &str) -> Result<UpstreamReply, CompletionError> {
    Ok(UpstreamReply {
        status: 200,
        body: json!({"choices": [{"message": {"role": "assistant", "content": content}}]}).to_string(),
    })
}

pub fn status(code: u16, body: &str) -> Result<UpstreamReply, CompletionError> {
    Ok(UpstreamReply {
        status: code,
        body: body.to_string(),
    })
}

/// Mailer that records what it was asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingMail>>,
}

impl RecordingMailer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    fn is_configured(&self) -> bool {
        true
    }

    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

pub fn app_state(api: Arc<dyn CompletionApi>, mailer: Arc<dyn Mailer>) -> AppState {
    let relay_config = RelayConfig {
        retry_delay: Duration::ZERO,
        ..RelayConfig::default()
    };
    AppState {
        tera: load_templates(concat!(env!("CARGO_MANIFEST_DIR"), "/templates")).unwrap(),
        relay: ChatRelay::new(api, relay_config),
        news: NewsClient::new(NewsConfig::default()).unwrap(),
        contact: ContactNotifier::new(mailer),
    }
}
