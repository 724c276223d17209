//! Operator-facing output of the kiosk.
//!
//! The runtime reports announcements, chimes and visit history through a
//! [`Feedback`] implementation. [`TracingFeedback`] writes them to the log,
//! which is what the command-line kiosk uses.

use kiosk_core::time::{format_clock, format_duration};
use kiosk_core::{StudentId, VisitRecord};
use tracing::info;

use crate::state::SessionState;

/// Sink for what the kiosk shows and says.
pub trait Feedback {
    /// Accessibility announcement for the state just entered.
    fn announce(&mut self, text: &str);

    /// Short audible confirmation after a check-in.
    fn chime(&mut self);

    /// Recent visits of the student on screen.
    fn show_history(&mut self, student_id: &StudentId, visits: &[VisitRecord]);

    /// Called once per batch of state changes with the resulting state.
    fn state_changed(&mut self, _state: &SessionState) {}
}

/// Feedback written to the `tracing` log.
#[derive(Debug, Default)]
pub struct TracingFeedback;

impl Feedback for TracingFeedback {
    fn announce(&mut self, text: &str) {
        info!(target: "kiosk::announce", "{text}");
    }

    fn chime(&mut self) {
        info!(target: "kiosk::announce", "*chime*");
    }

    fn show_history(&mut self, student_id: &StudentId, visits: &[VisitRecord]) {
        info!(student_id = %student_id, count = visits.len(), "Recent visits");
        for visit in visits {
            let time_in = visit.time_in.map(format_clock).unwrap_or_else(|| "--:--".to_string());
            let time_out = visit.time_out.map(format_clock).unwrap_or_else(|| "--:--".to_string());
            let duration = visit
                .duration()
                .map(format_duration)
                .unwrap_or_else(|| "-".to_string());
            info!(
                purpose = visit.purpose.as_deref().unwrap_or("-"),
                "{time_in} - {time_out} ({duration})"
            );
        }
    }

    fn state_changed(&mut self, state: &SessionState) {
        match state.student() {
            Some(student) => info!(state = %state, student = %student.display_name(), "Screen updated"),
            None => info!(state = %state, "Screen updated"),
        }
    }
}
