//! Side effects requested by the session machine.
//!
//! The machine never performs I/O. It queues [`Effect`]s which the runtime
//! drains and executes, then reports call outcomes back with the ticket the
//! call was issued under.

use std::fmt;

use kiosk_core::{
    AttendanceSession, CanonicalIdentifier, Purpose, ScanResolution, SessionId, StudentId,
};

/// Identifies one issued service call.
///
/// Tickets increase monotonically per machine; a response is applied only if
/// its ticket matches the call currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub(crate) fn first() -> Self {
        Ticket(1)
    }

    pub(crate) fn next(self) -> Self {
        Ticket(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A request to the attendance service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceRequest {
    Resolve(CanonicalIdentifier),
    CheckIn {
        student_id: StudentId,
        purpose: Purpose,
        device_id: String,
    },
    CheckOut {
        student_id: StudentId,
        session_id: SessionId,
    },
}

impl ServiceRequest {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            ServiceRequest::Resolve(_) => "resolve",
            ServiceRequest::CheckIn { .. } => "check_in",
            ServiceRequest::CheckOut { .. } => "check_out",
        }
    }
}

/// A service request tagged with its ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCall {
    pub ticket: Ticket,
    pub request: ServiceRequest,
}

/// Successful outcome of a [`ServiceCall`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceResponse {
    Resolved(ScanResolution),
    /// Session opened by a check-in or closed by a check-out.
    Session(AttendanceSession),
}

/// Work the runtime must perform on behalf of the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Call(ServiceCall),
    /// Accessibility announcement for the current state.
    Announce(String),
    /// Short audible confirmation after a check-in.
    Chime,
    /// Reload the recent visit history of a student.
    RefreshHistory(StudentId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tickets_increase() {
        let first = Ticket::first();
        let second = first.next();
        assert!(second > first);
        assert_eq!(second.value(), 2);
        assert_eq!(second.to_string(), "#2");
    }

    #[test]
    fn test_request_names() {
        let request = ServiceRequest::Resolve(CanonicalIdentifier::new("x").unwrap());
        assert_eq!(request.name(), "resolve");
    }
}
