//! Attendance session logic for the kiosk.
//!
//! [`SessionMachine`] models what the station is doing with the current
//! student: resolving a scan, prompting for a visit purpose, or showing a
//! result. [`KioskRuntime`] connects it to a scanner, the attendance service
//! and an operator-facing [`Feedback`] sink.

pub mod effect;
pub mod feedback;
pub mod machine;
pub mod runtime;
pub mod state;

pub use effect::{Effect, ServiceCall, ServiceRequest, ServiceResponse, Ticket};
pub use feedback::{Feedback, TracingFeedback};
pub use machine::SessionMachine;
pub use runtime::{KioskRuntime, OperatorCommand, RuntimeHandle};
pub use state::{Confirmation, SessionState, StateKind, StateTransition};
