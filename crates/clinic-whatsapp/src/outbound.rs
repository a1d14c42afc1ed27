//! Manual outbound message endpoint

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::WhatsAppError;
use crate::gateway::whatsapp_address;
use crate::webhook::WebhookState;

/// Send request payload
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// Destination phone number, without the transport prefix
    pub to: String,
    pub message: String,
}

/// Send response payload
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub success: bool,
    pub sid: String,
}

/// Error response payload
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Failure of the send endpoint
#[derive(Debug)]
pub enum SendMessageError {
    /// Malformed or incomplete request
    Validation(String),
    /// The gateway could not deliver the message
    Gateway(WhatsAppError),
}

impl IntoResponse for SendMessageError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            Self::Validation(detail) => (StatusCode::UNPROCESSABLE_ENTITY, detail),
            Self::Gateway(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };
        (status, Json(ErrorResponse { detail })).into_response()
    }
}

impl From<JsonRejection> for SendMessageError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// Relay a message to `whatsapp:<to>` through the gateway
pub async fn send_message(
    State(state): State<Arc<WebhookState>>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<Json<SendMessageResponse>, SendMessageError> {
    let Json(req) = payload?;

    let to = req.to.trim();
    if to.is_empty() {
        return Err(SendMessageError::Validation(
            "`to` must not be empty".to_string(),
        ));
    }

    let to = whatsapp_address(to);
    info!("Manual send to {}", to);

    let sid = state
        .gateway
        .send_message(&to, &req.message)
        .await
        .map_err(|e| {
            error!("Manual send to {} failed: {}", to, e);
            SendMessageError::Gateway(e)
        })?;

    Ok(Json(SendMessageResponse { success: true, sid }))
}
