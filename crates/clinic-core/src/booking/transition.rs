//! Pure booking state transition
//!
//! Rules are checked in order and the first match wins. Restart keywords and
//! "cancel" apply in every step; catalog choices only in their own step.

use super::catalog::{DOCTORS, SLOTS};
use super::types::{Session, Step};

/// Messages that (re)start the booking flow
pub const BOOK_KEYWORDS: [&str; 3] = ["book appointment", "appointment", "book"];

pub const CONFIRM_KEYWORD: &str = "confirm";
pub const CANCEL_KEYWORD: &str = "cancel";

pub const CANCELLED_REPLY: &str =
    "❌ Your appointment process has been cancelled. Type 'Book' to start again.";
pub const FALLBACK_REPLY: &str =
    "I didn't understand that. Please type 'Book' to start booking an appointment.";

/// Result of a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub session: Session,
    pub reply: String,
}

impl Transition {
    fn new(step: Step, reply: impl Into<String>) -> Self {
        Self {
            session: Session::new(step),
            reply: reply.into(),
        }
    }
}

/// Trim and lowercase an inbound message body
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Compute the next session and the reply for a normalized message
pub fn transition(session: &Session, message: &str) -> Transition {
    if BOOK_KEYWORDS.contains(&message) {
        return Transition::new(Step::ChooseDoctor, doctor_menu());
    }

    match session.step() {
        Step::ChooseDoctor => {
            if let Some(doctor) = DOCTORS.get(message) {
                return Transition::new(
                    Step::ChooseTime {
                        doctor: doctor.to_string(),
                    },
                    slot_menu(doctor),
                );
            }
        }
        Step::ChooseTime { doctor } => {
            if let Some(time) = SLOTS.get(message) {
                return Transition::new(
                    Step::AwaitingConfirmation {
                        doctor: doctor.clone(),
                        time: time.to_string(),
                    },
                    summary(doctor, time),
                );
            }
        }
        Step::AwaitingConfirmation { doctor, time } if message == CONFIRM_KEYWORD => {
            let reply = confirmation(doctor, time);
            return Transition::new(
                Step::Done {
                    doctor: doctor.clone(),
                    time: time.clone(),
                },
                reply,
            );
        }
        _ => {}
    }

    if message == CANCEL_KEYWORD {
        return Transition::new(Step::Start, CANCELLED_REPLY);
    }

    Transition {
        session: session.clone(),
        reply: FALLBACK_REPLY.to_string(),
    }
}

fn doctor_menu() -> String {
    format!(
        "Great! Please choose a doctor:\n{}\n\nReply with {}.",
        DOCTORS.menu(),
        DOCTORS.choice_hint()
    )
}

fn slot_menu(doctor: &str) -> String {
    format!(
        "You've selected {}.\nAvailable slots:\n{}\n\nReply with the slot number to continue.",
        doctor,
        SLOTS.menu()
    )
}

fn summary(doctor: &str, time: &str) -> String {
    format!(
        "You chose:\nDoctor: {}\nTime: {}\n\nReply 'Confirm' to finalize or 'Cancel' to abort.",
        doctor, time
    )
}

fn confirmation(doctor: &str, time: &str) -> String {
    format!(
        "✅ Appointment confirmed with {} at {}.\nThank you! Reply 'Book' to schedule another.",
        doctor, time
    )
}
