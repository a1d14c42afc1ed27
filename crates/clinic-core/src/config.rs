//! Configuration management
//!
//! 設定は以下の優先順位で読み込まれます:
//! 1. 環境変数
//! 2. clinic-bot.toml 設定ファイル
//! 3. デフォルト値
//!
//! 設定ファイル内では `${VAR_NAME}` 形式で環境変数を展開できます。

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "clinic-bot.toml";

/// What the inbound webhook does when the reply cannot be delivered
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryFailurePolicy {
    /// Log the failure and still acknowledge the webhook
    #[default]
    Log,
    /// Answer the webhook with a server error
    Surface,
}

impl DeliveryFailurePolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "log" => Some(Self::Log),
            "surface" => Some(Self::Surface),
            _ => None,
        }
    }
}

/// Twilio credentials and client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwilioConfig {
    /// Account SID (`AC...`)
    pub account_sid: String,

    /// Auth token
    #[serde(skip_serializing)]
    pub auth_token: String,

    /// Sender address, e.g. `whatsapp:+14155238886`
    pub whatsapp_from: String,

    /// REST API base URL
    pub api_base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            whatsapp_from: String::new(),
            api_base_url: default_api_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl TwilioConfig {
    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port for the HTTP server
    pub port: u16,

    /// Allowed CORS origins (e.g., ["http://localhost:3000"])
    /// If unset, any origin is allowed
    pub allowed_origins: Option<Vec<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            allowed_origins: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Reply delivery failure handling on the inbound webhook
    pub delivery_failure: DeliveryFailurePolicy,
}

/// Main configuration for clinic-bot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Twilio settings
    pub twilio: TwilioConfig,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Inbound webhook behavior
    pub webhook: WebhookConfig,
}

fn default_api_base_url() -> String {
    "https://api.twilio.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_port() -> u16 {
    8000
}

impl Config {
    /// 文字列内の `${VAR_NAME}` を `lookup` の値に置換する
    ///
    /// 値が見つからない場合は空文字列になります。
    fn expand_env_vars<F>(value: &str, lookup: &F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut result = String::with_capacity(value.len());
        let mut rest = value;

        while let Some(start) = rest.find("${") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find('}') {
                Some(end) => {
                    let var_name = &after[..end];
                    if let Some(env_value) = lookup(var_name) {
                        result.push_str(&env_value);
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    // 閉じ括弧がない場合はそのまま残す
                    result.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }

        result.push_str(rest);
        result
    }

    /// Build a configuration from defaults plus values returned by `lookup`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_overrides(&lookup);
        config
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// TOML 文字列から設定を読み込み、`lookup` の値で上書きする
    pub fn from_toml_str<F>(content: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let expanded = Self::expand_env_vars(content, &lookup);
        let mut config: Config = toml::from_str(&expanded)?;
        config.apply_overrides(&lookup);
        Ok(config)
    }

    /// TOML 設定ファイルから設定を読み込む
    ///
    /// 設定ファイル内の `${VAR_NAME}` は環境変数の値に置換され、
    /// 既存の環境変数が優先されます。
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content, |key| std::env::var(key).ok())
    }

    /// デフォルトパスから設定を読み込む
    ///
    /// `CONFIG_PATH` が設定されていればそのファイル、なければ
    /// `./clinic-bot.toml`、どちらもなければ環境変数のみを使います。
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var("CONFIG_PATH") {
            return Self::from_toml_file(path);
        }

        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_toml_file(DEFAULT_CONFIG_FILE);
        }

        Ok(Self::from_env())
    }

    /// 環境変数で設定を上書きする
    fn apply_overrides<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Twilio 設定の上書き
        if let Some(sid) = lookup("TWILIO_ACCOUNT_SID") {
            self.twilio.account_sid = sid;
        }
        if let Some(token) = lookup("TWILIO_AUTH_TOKEN") {
            self.twilio.auth_token = token;
        }
        if let Some(from) = lookup("TWILIO_WHATSAPP_FROM") {
            self.twilio.whatsapp_from = from;
        }
        if let Some(url) = lookup("TWILIO_API_BASE_URL") {
            if !url.is_empty() {
                self.twilio.api_base_url = url;
            }
        }
        if let Some(secs) = lookup("TWILIO_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                self.twilio.timeout_secs = secs;
            }
        }

        // Server 設定の上書き
        if let Some(port) = lookup("PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Some(origins) = lookup("CORS_ALLOWED_ORIGINS") {
            self.server.allowed_origins = Some(
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            );
        }

        // Webhook 設定の上書き
        if let Some(policy) = lookup("WEBHOOK_DELIVERY_FAILURE") {
            match DeliveryFailurePolicy::parse(&policy) {
                Some(p) => self.webhook.delivery_failure = p,
                None => tracing::warn!(
                    "Ignoring unknown WEBHOOK_DELIVERY_FAILURE value: {}",
                    policy
                ),
            }
        }
    }

    /// Names of required Twilio settings that are empty
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.twilio.account_sid.is_empty() {
            missing.push("TWILIO_ACCOUNT_SID");
        }
        if self.twilio.auth_token.is_empty() {
            missing.push("TWILIO_AUTH_TOKEN");
        }
        if self.twilio.whatsapp_from.is_empty() {
            missing.push("TWILIO_WHATSAPP_FROM");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.twilio.api_base_url, "https://api.twilio.com");
        assert_eq!(config.twilio.timeout(), Duration::from_secs(30));
        assert_eq!(config.webhook.delivery_failure, DeliveryFailurePolicy::Log);
        assert!(config.server.allowed_origins.is_none());
        assert_eq!(
            config.missing_settings(),
            vec!["TWILIO_ACCOUNT_SID", "TWILIO_AUTH_TOKEN", "TWILIO_WHATSAPP_FROM"]
        );
    }

    #[test]
    fn test_from_lookup() {
        let config = Config::from_lookup(lookup_from(&[
            ("TWILIO_ACCOUNT_SID", "AC123"),
            ("TWILIO_AUTH_TOKEN", "secret"),
            ("TWILIO_WHATSAPP_FROM", "whatsapp:+14155238886"),
            ("PORT", "9090"),
            ("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test"),
            ("WEBHOOK_DELIVERY_FAILURE", "Surface"),
        ]));

        assert_eq!(config.twilio.account_sid, "AC123");
        assert_eq!(config.twilio.auth_token, "secret");
        assert_eq!(config.twilio.whatsapp_from, "whatsapp:+14155238886");
        assert_eq!(config.server.port, 9090);
        assert_eq!(
            config.server.allowed_origins,
            Some(vec!["http://a.test".to_string(), "http://b.test".to_string()])
        );
        assert_eq!(config.webhook.delivery_failure, DeliveryFailurePolicy::Surface);
        assert!(config.missing_settings().is_empty());
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "not-a-port"),
            ("WEBHOOK_DELIVERY_FAILURE", "retry"),
        ]));
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.webhook.delivery_failure, DeliveryFailurePolicy::Log);
    }

    #[test]
    fn test_expand_env_vars() {
        let lookup = lookup_from(&[("SID", "AC999")]);
        assert_eq!(Config::expand_env_vars("sid=${SID}", &lookup), "sid=AC999");
        assert_eq!(Config::expand_env_vars("x=${MISSING}y", &lookup), "x=y");
        assert_eq!(Config::expand_env_vars("plain $text", &lookup), "plain $text");
        assert_eq!(Config::expand_env_vars("open ${SID", &lookup), "open ${SID");
    }

    #[test]
    fn test_from_toml_str_with_env_override() {
        let toml = r#"
[twilio]
account_sid = "${SID}"
auth_token = "file-token"
whatsapp_from = "whatsapp:+10000000000"
timeout_secs = 5

[server]
port = 7000
allowed_origins = ["http://localhost:3000"]

[webhook]
delivery_failure = "surface"
"#;
        let config = Config::from_toml_str(
            toml,
            lookup_from(&[("SID", "AC-from-env"), ("TWILIO_AUTH_TOKEN", "env-token")]),
        )
        .unwrap();

        assert_eq!(config.twilio.account_sid, "AC-from-env");
        assert_eq!(config.twilio.auth_token, "env-token");
        assert_eq!(config.twilio.timeout_secs, 5);
        assert_eq!(config.twilio.api_base_url, "https://api.twilio.com");
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.webhook.delivery_failure, DeliveryFailurePolicy::Surface);
    }

    #[test]
    fn test_from_toml_str_rejects_bad_toml() {
        let result = Config::from_toml_str("[server\nport = 1", |_| None);
        assert!(matches!(result, Err(Error::Toml(_))));
    }

    #[test]
    fn test_unreadable_file_is_config_error() {
        let result = Config::from_toml_file("/nonexistent/clinic-bot.toml");
        match result {
            Err(Error::Config(msg)) => assert!(msg.contains("/nonexistent/clinic-bot.toml")),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
