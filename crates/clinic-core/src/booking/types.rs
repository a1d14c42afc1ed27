//! Booking conversation types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Position in the booking flow
///
/// Selections live on the variants that need them, so a doctor exists only
/// once one was chosen and a time only once a slot was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    #[default]
    Start,
    ChooseDoctor,
    ChooseTime {
        doctor: String,
    },
    AwaitingConfirmation {
        doctor: String,
        time: String,
    },
    Done {
        doctor: String,
        time: String,
    },
}

impl Step {
    /// Wire name of the step
    pub fn name(&self) -> &'static str {
        match self {
            Step::Start => "start",
            Step::ChooseDoctor => "choose_doctor",
            Step::ChooseTime { .. } => "choose_time",
            Step::AwaitingConfirmation { .. } => "awaiting_confirmation",
            Step::Done { .. } => "done",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Booking conversation state for one sender
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Session {
    #[serde(flatten)]
    step: Step,
}

impl Session {
    pub fn new(step: Step) -> Self {
        Self { step }
    }

    pub fn step(&self) -> &Step {
        &self.step
    }

    /// Selected doctor, if the flow has reached slot selection
    pub fn doctor(&self) -> Option<&str> {
        match &self.step {
            Step::ChooseTime { doctor }
            | Step::AwaitingConfirmation { doctor, .. }
            | Step::Done { doctor, .. } => Some(doctor),
            Step::Start | Step::ChooseDoctor => None,
        }
    }

    /// Selected slot, if the flow has reached confirmation
    pub fn time(&self) -> Option<&str> {
        match &self.step {
            Step::AwaitingConfirmation { time, .. } | Step::Done { time, .. } => Some(time),
            _ => None,
        }
    }
}
