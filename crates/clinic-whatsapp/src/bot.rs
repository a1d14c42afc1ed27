//! WhatsApp bot wrapper

use std::net::SocketAddr;
use std::sync::Arc;

use clinic_core::{Config, ConversationManager};
use tracing::warn;

use crate::error::Result;
use crate::twilio::TwilioClient;
use crate::webhook::{WebhookServer, WebhookState};

/// WhatsApp booking bot: Twilio client, booking sessions and HTTP server
pub struct WhatsAppBot {
    twilio_client: Arc<TwilioClient>,
    conversations: Arc<ConversationManager>,
    config: Config,
}

impl WhatsAppBot {
    /// Create a new WhatsApp bot with in-memory sessions
    pub fn new(config: Config) -> Result<Self> {
        let missing = config.missing_settings();
        if !missing.is_empty() {
            warn!(
                "Twilio settings not configured: {}; replies will fail",
                missing.join(", ")
            );
        }

        let twilio_client = Arc::new(TwilioClient::from_config(&config.twilio)?);

        Ok(Self {
            twilio_client,
            conversations: Arc::new(ConversationManager::in_memory()),
            config,
        })
    }

    /// Build the webhook server for the configured port
    pub fn server(&self) -> WebhookServer {
        let addr: SocketAddr = ([0, 0, 0, 0], self.config.server.port).into();
        let state = WebhookState {
            gateway: self.twilio_client.clone(),
            conversations: Arc::clone(&self.conversations),
            delivery_failure: self.config.webhook.delivery_failure,
        };

        WebhookServer::new(addr, state)
            .with_allowed_origins(self.config.server.allowed_origins.clone())
    }

    /// Start the bot (webhook server)
    pub async fn start(self) -> Result<()> {
        self.server().start().await
    }

    /// Get the Twilio client for direct use
    pub fn twilio_client(&self) -> Arc<TwilioClient> {
        Arc::clone(&self.twilio_client)
    }
}
