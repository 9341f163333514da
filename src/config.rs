use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::contact::MailConfig;
use crate::model::CompletionSettings;
use crate::news::NewsConfig;
use crate::relay::RelayConfig;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub templates_dir: String,
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            templates_dir: "templates".to_string(),
            static_dir: "./static".to_string(),
        }
    }
}

// Secrets are optional; a missing key only disables the feature that needs it
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub completion: CompletionSettings,
    pub relay: RelayConfig,
    pub news: NewsConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = AppConfig::default();

        let server = ServerConfig {
            host: get("BIND_ADDR").unwrap_or(defaults.server.host),
            port: parse_or(get("PORT"), "PORT", defaults.server.port)?,
            templates_dir: get("TEMPLATES_DIR").unwrap_or(defaults.server.templates_dir),
            static_dir: get("STATIC_DIR").unwrap_or(defaults.server.static_dir),
        };

        let relay = RelayConfig {
            model: get("OPENROUTER_MODEL").unwrap_or(defaults.relay.model),
            max_tokens: parse_or(get("MAX_TOKENS"), "MAX_TOKENS", defaults.relay.max_tokens)?,
            temperature: parse_or(get("TEMPERATURE"), "TEMPERATURE", defaults.relay.temperature)?,
            ..defaults.relay
        };

        let completion = CompletionSettings {
            endpoint: get("OPENROUTER_URL").unwrap_or(defaults.completion.endpoint),
            api_key: get("OPENROUTER_API_KEY"),
            referer: get("SITE_URL").unwrap_or(defaults.completion.referer),
            title: get("SITE_TITLE").unwrap_or(defaults.completion.title),
            timeout: relay.timeout,
        };

        let news = NewsConfig {
            endpoint: get("NEWSAPI_URL").unwrap_or(defaults.news.endpoint),
            api_key: get("NEWSAPI_KEY"),
            filter_english: parse_flag(get("NEWS_FILTER_ENGLISH"), defaults.news.filter_english),
            ..defaults.news
        };

        let mail = MailConfig {
            host: get("EMAIL_HOST").unwrap_or(defaults.mail.host),
            port: parse_or(get("EMAIL_PORT"), "EMAIL_PORT", defaults.mail.port)?,
            username: get("EMAIL_HOST_USER"),
            password: get("EMAIL_HOST_PASSWORD"),
            recipient: get("CONTACT_RECIPIENT"),
            timeout: Duration::from_secs(30),
        };

        Ok(Self {
            server,
            completion,
            relay,
            news,
            mail,
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value
            .parse()
            .with_context(|| format!("invalid value for {key}: {value:?}")),
        None => Ok(default),
    }
}

fn parse_flag(raw: Option<String>, default: bool) -> bool {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert!(cfg.completion.api_key.is_none());
        assert!(cfg.news.api_key.is_none());
        assert!(!cfg.news.filter_english);
        assert!(cfg.mail.username.is_none());
        assert_eq!(cfg.relay.history_cap, 12);
        assert_eq!(cfg.relay.content_cap, 300);
        assert_eq!(cfg.relay.max_retries, 2);
    }

    #[test]
    fn reads_secrets_and_overrides() {
        let cfg = config(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("NEWSAPI_KEY", "news-test"),
            ("NEWS_FILTER_ENGLISH", "TRUE"),
            ("MAX_TOKENS", "256"),
            ("TEMPERATURE", "0.2"),
            ("EMAIL_HOST_USER", "clinic@example.com"),
            ("PORT", "9000"),
        ])
        .unwrap();
        assert_eq!(cfg.completion.api_key.as_deref(), Some("sk-test"));
        assert_eq!(cfg.news.api_key.as_deref(), Some("news-test"));
        assert!(cfg.news.filter_english);
        assert_eq!(cfg.relay.max_tokens, 256);
        assert!((cfg.relay.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(cfg.mail.username.as_deref(), Some("clinic@example.com"));
        assert_eq!(cfg.server.port, 9000);
    }

    #[test]
    fn blank_secret_counts_as_missing() {
        let cfg = config(&[("OPENROUTER_API_KEY", "   ")]).unwrap();
        assert!(cfg.completion.api_key.is_none());
    }

    #[test]
    fn rejects_unparseable_numbers() {
        let err = config(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
