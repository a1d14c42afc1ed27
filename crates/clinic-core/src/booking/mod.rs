//! Appointment booking conversation
//!
//! Catalogs, per-sender state, and the pure transition function.

mod catalog;
mod transition;
mod types;

pub use catalog::{Catalog, DOCTORS, SLOTS};
pub use transition::{
    normalize, transition, Transition, BOOK_KEYWORDS, CANCELLED_REPLY, CANCEL_KEYWORD,
    CONFIRM_KEYWORD, FALLBACK_REPLY,
};
pub use types::{Session, Step};
