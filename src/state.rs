use anyhow::{Context, Result};
use std::sync::Arc;
use tera::Tera;

use crate::config::AppConfig;
use crate::contact::{ContactNotifier, SmtpMailer};
use crate::model::OpenRouterClient;
use crate::news::NewsClient;
use crate::relay::ChatRelay;

// Shared, read-only per worker; nothing here changes between requests.
pub struct AppState {
    pub tera: Tera,
    pub relay: ChatRelay,
    pub news: NewsClient,
    pub contact: ContactNotifier,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let tera = load_templates(&config.server.templates_dir)?;

        let completion = OpenRouterClient::new(config.completion.clone())
            .context("failed to build completion HTTP client")?;
        let relay = ChatRelay::new(Arc::new(completion), config.relay.clone());

        let news = NewsClient::new(config.news.clone()).context("failed to build news HTTP client")?;
        let contact = ContactNotifier::new(Arc::new(SmtpMailer::new(config.mail.clone())));

        Ok(Self {
            tera,
            relay,
            news,
            contact,
        })
    }
}

pub fn load_templates(dir: &str) -> Result<Tera> {
    let mut tera = Tera::new(&format!("{}/**/*", dir.trim_end_matches('/')))
        .with_context(|| format!("template parsing error in {dir}"))?;
    tera.autoescape_on(vec![".html"]);
    Ok(tera)
}
