//! clinic-whatsapp: WhatsApp booking bot via Twilio API
//!
//! Receives Twilio WhatsApp webhooks, runs them through the booking
//! conversation and sends replies back with the Twilio REST API. Also
//! exposes a manual send endpoint.

pub mod bot;
pub mod error;
pub mod gateway;
pub mod outbound;
pub mod twilio;
pub mod webhook;

pub use bot::WhatsAppBot;
pub use error::{Result, WhatsAppError};
pub use gateway::{whatsapp_address, MessagingGateway};
pub use twilio::TwilioClient;
pub use webhook::{create_router, WebhookServer, WebhookState};
