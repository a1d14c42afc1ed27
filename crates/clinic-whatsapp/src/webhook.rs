//! Webhook server for receiving WhatsApp messages from Twilio

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use clinic_core::{ConversationManager, DeliveryFailurePolicy};

use crate::error::{Result, WhatsAppError};
use crate::gateway::MessagingGateway;
use crate::outbound::send_message;
use crate::twilio::IncomingMessage;

/// Acknowledgment body returned to Twilio
pub const WEBHOOK_ACK: &str = "OK";

/// Webhook server state
#[derive(Clone)]
pub struct WebhookState {
    pub gateway: Arc<dyn MessagingGateway>,
    pub conversations: Arc<ConversationManager>,
    pub delivery_failure: DeliveryFailurePolicy,
}

/// Webhook server
pub struct WebhookServer {
    addr: SocketAddr,
    state: WebhookState,
    allowed_origins: Option<Vec<String>>,
}

impl WebhookServer {
    /// Create a new webhook server
    pub fn new(addr: SocketAddr, state: WebhookState) -> Self {
        Self {
            addr,
            state,
            allowed_origins: None,
        }
    }

    /// Restrict CORS to the given origins instead of allowing any
    pub fn with_allowed_origins(mut self, origins: Option<Vec<String>>) -> Self {
        self.allowed_origins = origins;
        self
    }

    /// Build the router without binding a socket
    pub fn router(&self) -> Router {
        create_router(self.state.clone(), self.allowed_origins.as_deref())
    }

    /// Start the webhook server
    pub async fn start(self) -> Result<()> {
        info!("Starting WhatsApp webhook server on {}", self.addr);

        let app = self.router();

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| WhatsAppError::Config(e.to_string()))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| WhatsAppError::Http(e.to_string()))?;

        Ok(())
    }
}

/// Create the HTTP router: health check, inbound webhook and outbound send
pub fn create_router(state: WebhookState, allowed_origins: Option<&[String]>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/whatsapp-webhook", post(handle_webhook))
        .route("/send-message", post(send_message))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

fn cors_layer(allowed_origins: Option<&[String]>) -> CorsLayer {
    let Some(origins) = allowed_origins else {
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Health check endpoint
async fn health() -> &'static str {
    "OK"
}

/// Handle incoming WhatsApp webhook
///
/// The booking reply goes out through the gateway; Twilio only gets "OK".
async fn handle_webhook(
    State(state): State<Arc<WebhookState>>,
    Form(msg): Form<IncomingMessage>,
) -> Response {
    info!(
        "Received WhatsApp message from {} ({}): {}",
        msg.from,
        msg.message_sid.as_deref().unwrap_or("-"),
        msg.body
    );

    match process_message(&state, &msg).await {
        Ok(()) => (StatusCode::OK, WEBHOOK_ACK).into_response(),
        Err(WhatsAppError::Session(e)) => {
            error!("Session error for {}: {}", msg.from, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Session error").into_response()
        }
        Err(e) => {
            error!("Failed to send reply to {}: {}", msg.from, e);
            match state.delivery_failure {
                DeliveryFailurePolicy::Surface => (
                    StatusCode::BAD_GATEWAY,
                    format!("Reply delivery failed: {}", e),
                )
                    .into_response(),
                DeliveryFailurePolicy::Log => (StatusCode::OK, WEBHOOK_ACK).into_response(),
            }
        }
    }
}

/// Advance the sender's booking and send the reply back
///
/// The session is saved before the reply goes out.
async fn process_message(state: &WebhookState, msg: &IncomingMessage) -> Result<()> {
    let outcome = state
        .conversations
        .handle_message(&msg.from, &msg.body)
        .await?;
    state.gateway.send_message(&msg.from, &outcome.reply).await?;
    Ok(())
}
