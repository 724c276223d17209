//! Attendance session states.
//!
//! # States
//!
//! - `Idle`: waiting for a scan
//! - `Resolving`: the identifier was sent to the resolver, or an automatic
//!   check-out is in flight
//! - `AwaitingPurpose`: the student must pick a purpose before check-in
//! - `Restricted`: the student is not allowed in
//! - `Confirmed`: a check-in, check-out or plain identification completed
//!
//! # Valid Transitions
//!
//! ```text
//! Idle ──> Resolving ──> AwaitingPurpose ──> Confirmed ──> Idle
//!              │  │            │
//!              │  │            └──(cancel / failure)──> Idle
//!              │  └──> Confirmed (auto check-out, identification)
//!              ├──> Restricted ──> Idle
//!              └──(failure)──> Idle
//! ```
//!
//! A scan arriving in `Confirmed`, `Restricted` or `AwaitingPurpose` passes
//! through `Idle` before entering `Resolving` again.

use std::fmt;
use std::time::{Duration, Instant};

use chrono::Utc;
use kiosk_core::time::format_clock;
use kiosk_core::{AttendanceSession, CanonicalIdentifier, Purpose, Student};
use serde::{Deserialize, Serialize};

/// Discriminant of [`SessionState`], used for the transition table and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    Idle,
    Resolving,
    AwaitingPurpose,
    Restricted,
    Confirmed,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StateKind::Idle => "Idle",
            StateKind::Resolving => "Resolving",
            StateKind::AwaitingPurpose => "AwaitingPurpose",
            StateKind::Restricted => "Restricted",
            StateKind::Confirmed => "Confirmed",
        };
        write!(f, "{name}")
    }
}

impl StateKind {
    /// Check if moving from this state to `target` is allowed.
    ///
    /// # Examples
    ///
    /// ```
    /// use kiosk_session::StateKind;
    ///
    /// assert!(StateKind::Idle.can_transition_to(&StateKind::Resolving));
    /// assert!(!StateKind::Idle.can_transition_to(&StateKind::Confirmed));
    /// ```
    pub fn can_transition_to(&self, target: &StateKind) -> bool {
        matches!(
            (self, target),
            (StateKind::Idle, StateKind::Resolving)
                | (
                    StateKind::Resolving,
                    StateKind::Restricted
                        | StateKind::AwaitingPurpose
                        | StateKind::Confirmed
                        | StateKind::Idle
                )
                | (StateKind::AwaitingPurpose, StateKind::Confirmed | StateKind::Idle)
                | (StateKind::Confirmed, StateKind::Idle)
                | (StateKind::Restricted, StateKind::Idle)
        )
    }
}

/// What a `Confirmed` state confirms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// A new visit was opened.
    CheckedIn {
        student: Student,
        session: AttendanceSession,
        purpose: Purpose,
    },
    /// The student's open visit was closed.
    CheckedOut {
        student: Student,
        session: AttendanceSession,
    },
    /// The resolver recognised the student but asked for no action.
    Identified {
        student: Student,
        active_session: Option<AttendanceSession>,
    },
}

impl Confirmation {
    pub fn student(&self) -> &Student {
        match self {
            Confirmation::CheckedIn { student, .. }
            | Confirmation::CheckedOut { student, .. }
            | Confirmation::Identified { student, .. } => student,
        }
    }
}

/// Current state of the kiosk, with the data that state owns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Resolving {
        identifier: CanonicalIdentifier,
    },
    AwaitingPurpose {
        student: Student,
        active_session: Option<AttendanceSession>,
    },
    Restricted {
        student: Option<Student>,
    },
    Confirmed(Confirmation),
}

impl SessionState {
    pub fn kind(&self) -> StateKind {
        match self {
            SessionState::Idle => StateKind::Idle,
            SessionState::Resolving { .. } => StateKind::Resolving,
            SessionState::AwaitingPurpose { .. } => StateKind::AwaitingPurpose,
            SessionState::Restricted { .. } => StateKind::Restricted,
            SessionState::Confirmed(_) => StateKind::Confirmed,
        }
    }

    /// Student shown on screen in this state, if any.
    pub fn student(&self) -> Option<&Student> {
        match self {
            SessionState::AwaitingPurpose { student, .. } => Some(student),
            SessionState::Restricted { student } => student.as_ref(),
            SessionState::Confirmed(confirmation) => Some(confirmation.student()),
            SessionState::Idle | SessionState::Resolving { .. } => None,
        }
    }

    /// Accessibility announcement made when entering this state.
    pub fn announcement(&self) -> String {
        match self {
            SessionState::Idle => "Ready to scan.".to_string(),
            SessionState::Resolving { .. } => "Processing scan.".to_string(),
            SessionState::AwaitingPurpose { .. } => {
                "Please choose your purpose of visit.".to_string()
            }
            SessionState::Restricted { .. } => {
                "You are not allowed to enter the library.".to_string()
            }
            SessionState::Confirmed(Confirmation::CheckedIn {
                session, purpose, ..
            }) => {
                let at = format_clock(session.time_in.unwrap_or_else(Utc::now));
                let purpose = session.purpose.as_deref().unwrap_or(purpose.label());
                format!("Time In recorded at {at}. Purpose: {purpose}.")
            }
            SessionState::Confirmed(Confirmation::CheckedOut { session, .. }) => {
                let at = format_clock(session.time_out.unwrap_or_else(Utc::now));
                format!("Time Out recorded at {at}. Thank you for visiting the library.")
            }
            SessionState::Confirmed(Confirmation::Identified { student, .. }) => {
                format!("Student identified: {}.", student.display_name())
            }
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

/// A single recorded state transition.
///
/// The `timestamp` field is not serialized; `Instant` is process-specific.
/// On deserialization it is set to the time of deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: StateKind,
    pub to: StateKind,
    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl StateTransition {
    pub fn new(from: StateKind, to: StateKind) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}
