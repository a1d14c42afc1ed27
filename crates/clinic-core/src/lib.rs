//! clinic-core: Clinic Bot Core Library
//!
//! Appointment booking state machine, session storage and configuration
//! shared by the messaging front ends.

pub mod booking;
pub mod config;
pub mod error;
pub mod session;

pub use booking::{Session, Step, Transition};
pub use config::{Config, DeliveryFailurePolicy, ServerConfig, TwilioConfig, WebhookConfig};
pub use error::{Error, Result};
pub use session::{ConversationManager, InMemorySessionStore, SessionStore};
