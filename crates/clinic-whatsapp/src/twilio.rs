//! Twilio API client for WhatsApp

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use clinic_core::TwilioConfig;

use crate::error::{Result, WhatsAppError};
use crate::gateway::MessagingGateway;

/// Twilio API client
#[derive(Debug, Clone)]
pub struct TwilioClient {
    client: Client,
    account_sid: String,
    auth_token: String,
    from: String,
    base_url: String,
}

/// Incoming WhatsApp message from Twilio webhook
///
/// Twilio posts many more fields; only these are read.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IncomingMessage {
    pub from: String,
    pub body: String,
    #[serde(default)]
    pub message_sid: Option<String>,
}

/// Outgoing message payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendMessagePayload<'a> {
    from: &'a str,
    to: &'a str,
    body: &'a str,
}

#[derive(Deserialize)]
struct SendMessageResponse {
    sid: String,
}

/// Error body returned by the Twilio REST API
#[derive(Deserialize)]
struct TwilioErrorBody {
    #[serde(default)]
    code: Option<u32>,
    message: String,
}

impl TwilioClient {
    /// Create a new Twilio client
    pub fn new(account_sid: String, auth_token: String, from: String) -> Self {
        Self {
            client: Client::new(),
            account_sid,
            auth_token,
            from,
            base_url: "https://api.twilio.com".to_string(),
        }
    }

    /// Create a client from configuration, applying its timeout and base URL
    pub fn from_config(config: &TwilioConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from: config.whatsapp_from.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Override the API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sender address used for outgoing messages, as configured
    pub fn from_address(&self) -> &str {
        &self.from
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        )
    }
}

#[async_trait]
impl MessagingGateway for TwilioClient {
    /// Send a WhatsApp message, returning the Twilio message SID
    async fn send_message(&self, to: &str, body: &str) -> Result<String> {
        if self.account_sid.is_empty() || self.auth_token.is_empty() || self.from.is_empty() {
            return Err(WhatsAppError::CredentialsNotSet);
        }

        info!("Sending WhatsApp message to {}", to);

        let payload = SendMessagePayload {
            from: &self.from,
            to,
            body,
        };

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<TwilioErrorBody>(&text) {
                Ok(TwilioErrorBody {
                    code: Some(code),
                    message,
                }) => format!("{} (code {})", message, code),
                Ok(TwilioErrorBody { message, .. }) => message,
                Err(_) => text,
            };
            return Err(WhatsAppError::Api(format!(
                "Failed to send message: {} - {}",
                status, detail
            )));
        }

        let result: SendMessageResponse = response.json().await?;
        Ok(result.sid)
    }
}
