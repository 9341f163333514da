use log::{error, info};
use rand::Rng;
use regex::Regex;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

use crate::text::strip_tags;

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());

static ENGLISH_TEXT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9\s]+$").unwrap());

/// Shorter strings are not trusted to carry a language signal.
const MIN_DETECTABLE_LEN: usize = 10;

#[derive(Debug, Clone)]
pub struct NewsConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub query: String,
    pub language: String,
    pub page_size: u32,
    /// Pages are drawn uniformly from `1..=max_page`.
    pub max_page: u32,
    pub timeout: Duration,
    /// Drop articles whose title or description does not look English.
    pub filter_english: bool,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://newsapi.org/v2/everything".to_string(),
            api_key: None,
            query: "health OR medicine OR disease".to_string(),
            language: "en".to_string(),
            page_size: 20,
            max_page: 5,
            timeout: Duration::from_secs(10),
            filter_english: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum NewsError {
    #[error("API configuration error: NEWSAPI_KEY not set.")]
    MissingApiKey,
    #[error("{0}")]
    Fetch(#[from] reqwest::Error),
}

/// What the site's daily-posts page consumes.
#[derive(Debug, Serialize)]
pub struct NewsFeed {
    pub articles: Vec<Value>,
    pub status: String,
    pub newsapi_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_received: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub english_filtered: Option<usize>,
    pub newsapi_raw: Value,
}

pub struct NewsClient {
    config: NewsConfig,
    client: Client,
}

impl NewsClient {
    pub fn new(config: NewsConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &NewsConfig {
        &self.config
    }

    pub async fn fetch(&self) -> Result<NewsFeed, NewsError> {
        let api_key = self.config.api_key.as_deref().ok_or(NewsError::MissingApiKey)?;
        let page = rand::thread_rng().gen_range(1..=self.config.max_page.max(1));

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("q", self.config.query.as_str()),
                ("language", self.config.language.as_str()),
                ("apiKey", api_key),
            ])
            .query(&[("page", page), ("pageSize", self.config.page_size)])
            .send()
            .await?;
        info!("News API request page {} -> {}", page, response.status());

        let data: Value = response.error_for_status()?.json().await?;
        Ok(self.shape(data))
    }

    /// Builds the feed from a decoded upstream payload.
    pub fn shape(&self, data: Value) -> NewsFeed {
        let status = data
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("error")
            .to_string();
        let upstream_message = data.get("message").and_then(Value::as_str).map(str::to_string);

        if status != "ok" {
            error!("News API error: {:?}", upstream_message);
            return NewsFeed {
                articles: Vec::new(),
                status,
                newsapi_message: upstream_message
                    .unwrap_or_else(|| "Live news unavailable. Please try later.".to_string()),
                total_received: None,
                english_filtered: None,
                newsapi_raw: data,
            };
        }

        let received: Vec<Value> = data
            .get("articles")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let total_received = received.len();

        let articles = if self.config.filter_english {
            filter_english_articles(received)
        } else {
            received
        };
        info!(
            "Returning {} of {} articles (english filter {})",
            articles.len(),
            total_received,
            if self.config.filter_english { "on" } else { "off" }
        );

        NewsFeed {
            english_filtered: Some(articles.len()),
            articles,
            status,
            newsapi_message: upstream_message.unwrap_or_default(),
            total_received: Some(total_received),
            newsapi_raw: data,
        }
    }
}

/// Heuristic English check for article titles and descriptions.
pub fn is_english_text(text: &str) -> bool {
    let without_tags = strip_tags(text);
    let cleaned = NON_WORD.replace_all(&without_tags, " ");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() < MIN_DETECTABLE_LEN {
        return false;
    }
    ENGLISH_TEXT.is_match(cleaned)
}

pub fn filter_english_articles(articles: Vec<Value>) -> Vec<Value> {
    articles
        .into_iter()
        .filter(|article| {
            let title = article.get("title").and_then(Value::as_str).unwrap_or("");
            let description = article.get("description").and_then(Value::as_str).unwrap_or("");
            let keep = is_english_text(title) && is_english_text(description);
            if !keep {
                let preview: String = title.chars().take(50).collect();
                info!("Filtered out non-English article: {}...", preview);
            }
            keep
        })
        .collect()
}
