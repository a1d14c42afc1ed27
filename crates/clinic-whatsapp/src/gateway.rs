//! Outbound messaging abstraction

use async_trait::async_trait;

use crate::error::Result;

/// Transport prefix Twilio uses for WhatsApp addresses
pub const WHATSAPP_PREFIX: &str = "whatsapp:";

/// Delivers text messages to a destination address
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Send `body` to `to` and return the provider's message id
    async fn send_message(&self, to: &str, body: &str) -> Result<String>;
}

/// `whatsapp:<number>` form of a phone number; already prefixed input is kept
pub fn whatsapp_address(number: &str) -> String {
    if number.starts_with(WHATSAPP_PREFIX) {
        number.to_string()
    } else {
        format!("{}{}", WHATSAPP_PREFIX, number)
    }
}
