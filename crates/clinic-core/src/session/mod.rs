//! Session management module
//!
//! Storage for booking sessions and the per-sender conversation manager.

mod manager;
mod store;

pub use manager::ConversationManager;
pub use store::{InMemorySessionStore, SessionStore};
