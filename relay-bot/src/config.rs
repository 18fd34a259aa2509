//! Bot configuration, loaded once from environment variables at startup.

use anyhow::{Context, Result};
use relay_core::RevealMode;
use reply_client::{build_request_url, DEFAULT_REPLY_API_URL, QUERY_PLACEHOLDER};
use std::env;
use std::time::Duration;

const DEFAULT_LOG_FILE: &str = "logs/reply-relay.log";
const DEFAULT_REPLY_API_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TYPING_INTERVAL_MS: u64 = 500;

/// Masks a token for safe logging: first 7 chars + "***" + last 4 chars, or "***" when 11 chars or fewer.
pub fn mask_token(token: &str) -> String {
    let len = token.len();
    if len <= 11 || !token.is_char_boundary(7) || !token.is_char_boundary(len - 4) {
        "***".to_string()
    } else {
        format!("{}***{}", &token[..7], &token[len - 4..])
    }
}

/// Reply relay config.
#[derive(Clone)]
pub struct BotConfig {
    /// BOT_TOKEN (required)
    pub bot_token: String,
    /// API_ID; reserved for an alternate transport, unused
    pub api_id: Option<String>,
    /// API_HASH; reserved for an alternate transport, unused
    pub api_hash: Option<String>,
    /// TELEGRAM_API_URL or TELOXIDE_API_URL
    pub telegram_api_url: Option<String>,
    /// REPLY_API_URL; `{}` is replaced by the encoded user text
    pub reply_api_url: String,
    /// REPLY_API_TIMEOUT_SECS
    pub reply_api_timeout_secs: u64,
    /// TYPING_INTERVAL_MS; pause between reveal steps
    pub typing_interval_ms: u64,
    /// TYPING_MODE: `edit` or `resend`
    pub typing_mode: RevealMode,
    /// LOG_FILE
    pub log_file: String,
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl BotConfig {
    /// Load from environment variables. `token` overrides BOT_TOKEN if provided.
    pub fn load(token: Option<String>) -> Result<Self> {
        let bot_token = match token {
            Some(token) => token,
            None => env::var("BOT_TOKEN")
                .map_err(|_| anyhow::anyhow!("BOT_TOKEN environment variable is required"))?,
        };
        let api_id = optional_var("API_ID");
        let api_hash = optional_var("API_HASH");
        let telegram_api_url =
            optional_var("TELEGRAM_API_URL").or_else(|| optional_var("TELOXIDE_API_URL"));
        let reply_api_url =
            optional_var("REPLY_API_URL").unwrap_or_else(|| DEFAULT_REPLY_API_URL.to_string());
        let reply_api_timeout_secs = env::var("REPLY_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_REPLY_API_TIMEOUT_SECS);
        let typing_interval_ms = env::var("TYPING_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TYPING_INTERVAL_MS);
        let typing_mode = match optional_var("TYPING_MODE") {
            Some(mode) => mode.parse::<RevealMode>().context("TYPING_MODE")?,
            None => RevealMode::default(),
        };
        let log_file = optional_var("LOG_FILE").unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());

        Ok(Self {
            bot_token,
            api_id,
            api_hash,
            telegram_api_url,
            reply_api_url,
            reply_api_timeout_secs,
            typing_interval_ms,
            typing_mode,
            log_file,
        })
    }

    /// Validate config. Call after load() to fail fast before starting the listener.
    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            anyhow::bail!("BOT_TOKEN is set but empty");
        }
        if let Some(ref url_str) = self.telegram_api_url {
            if reqwest::Url::parse(url_str).is_err() {
                anyhow::bail!(
                    "TELEGRAM_API_URL (or TELOXIDE_API_URL) is set but not a valid URL: {}",
                    url_str
                );
            }
        }
        if !self.reply_api_url.contains(QUERY_PLACEHOLDER) {
            anyhow::bail!(
                "REPLY_API_URL must contain '{}' for the query text: {}",
                QUERY_PLACEHOLDER,
                self.reply_api_url
            );
        }
        let sample = build_request_url(&self.reply_api_url, "ping");
        reqwest::Url::parse(&sample)
            .with_context(|| format!("REPLY_API_URL is not a valid URL: {}", self.reply_api_url))?;
        if self.reply_api_timeout_secs == 0 {
            anyhow::bail!("REPLY_API_TIMEOUT_SECS must be greater than 0");
        }
        Ok(())
    }

    pub fn reply_api_timeout(&self) -> Duration {
        Duration::from_secs(self.reply_api_timeout_secs)
    }

    pub fn typing_interval(&self) -> Duration {
        Duration::from_millis(self.typing_interval_ms)
    }

    pub fn masked_token(&self) -> String {
        mask_token(&self.bot_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "BOT_TOKEN",
        "API_ID",
        "API_HASH",
        "TELEGRAM_API_URL",
        "TELOXIDE_API_URL",
        "REPLY_API_URL",
        "REPLY_API_TIMEOUT_SECS",
        "TYPING_INTERVAL_MS",
        "TYPING_MODE",
        "LOG_FILE",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_load_config_with_defaults() {
        clear_env();
        env::set_var("BOT_TOKEN", "test_token");

        let config = BotConfig::load(None).unwrap();

        assert_eq!(config.bot_token, "test_token");
        assert!(config.api_id.is_none());
        assert!(config.api_hash.is_none());
        assert!(config.telegram_api_url.is_none());
        assert_eq!(config.reply_api_url, DEFAULT_REPLY_API_URL);
        assert_eq!(config.reply_api_timeout(), Duration::from_secs(30));
        assert_eq!(config.typing_interval(), Duration::from_millis(500));
        assert_eq!(config.typing_mode, RevealMode::Edit);
        assert_eq!(config.log_file, "logs/reply-relay.log");
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_load_config_with_custom_values() {
        clear_env();
        env::set_var("BOT_TOKEN", "custom_token");
        env::set_var("API_ID", "12345");
        env::set_var("API_HASH", "abcdef");
        env::set_var("TELOXIDE_API_URL", "http://127.0.0.1:8081");
        env::set_var("REPLY_API_URL", "http://localhost:9000/reply?text={}");
        env::set_var("REPLY_API_TIMEOUT_SECS", "5");
        env::set_var("TYPING_INTERVAL_MS", "250");
        env::set_var("TYPING_MODE", "resend");
        env::set_var("LOG_FILE", "/tmp/relay.log");

        let config = BotConfig::load(None).unwrap();

        assert_eq!(config.api_id.as_deref(), Some("12345"));
        assert_eq!(config.api_hash.as_deref(), Some("abcdef"));
        assert_eq!(config.telegram_api_url.as_deref(), Some("http://127.0.0.1:8081"));
        assert_eq!(config.reply_api_url, "http://localhost:9000/reply?text={}");
        assert_eq!(config.reply_api_timeout_secs, 5);
        assert_eq!(config.typing_interval_ms, 250);
        assert_eq!(config.typing_mode, RevealMode::Resend);
        assert_eq!(config.log_file, "/tmp/relay.log");
        assert!(config.validate().is_ok());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_config_missing_token_fails() {
        clear_env();

        let err = BotConfig::load(None).err().expect("missing token must fail");
        assert!(err.to_string().contains("BOT_TOKEN"));
    }

    #[test]
    #[serial]
    fn test_load_config_with_override_token() {
        clear_env();
        env::set_var("BOT_TOKEN", "env_token");

        let config = BotConfig::load(Some("override_token".to_string())).unwrap();

        assert_eq!(config.bot_token, "override_token");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_config_rejects_unknown_typing_mode() {
        clear_env();
        env::set_var("BOT_TOKEN", "test_token");
        env::set_var("TYPING_MODE", "teleport");

        assert!(BotConfig::load(None).is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_validate_rejects_bad_values() {
        clear_env();
        let base = BotConfig::load(Some("token".to_string())).unwrap();

        let mut config = base.clone();
        config.bot_token = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.telegram_api_url = Some("not a url".to_string());
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.reply_api_url = "https://example.com/api".to_string();
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.reply_api_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("short"), "***");
        assert_eq!(
            mask_token("123456789:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw"),
            "1234567***Dsaw"
        );
    }
}
