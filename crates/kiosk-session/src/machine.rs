//! Attendance session state machine.
//!
//! The machine owns the kiosk's interaction state and enforces the
//! transition table in [`StateKind::can_transition_to`]. It is pure: every
//! service call, announcement and chime is queued as an [`Effect`] and
//! drained by the runtime, which reports call outcomes back through
//! [`SessionMachine::complete`].
//!
//! # Concurrency
//!
//! At most one service call is in flight. A scan arriving meanwhile is held
//! in a single pending slot (a newer scan replaces an older one) and is
//! resolved once the outstanding call settles. Every call carries a
//! [`Ticket`]; outcomes with any other ticket are stale and discarded.
//!
//! # Examples
//!
//! ```
//! use kiosk_core::CanonicalIdentifier;
//! use kiosk_session::{Effect, SessionMachine, StateKind};
//!
//! let mut machine = SessionMachine::new("kiosk-1");
//! machine.scan(CanonicalIdentifier::new("2023-0001").unwrap()).unwrap();
//! assert_eq!(machine.kind(), StateKind::Resolving);
//!
//! let effects: Vec<Effect> = machine.drain_effects().collect();
//! assert!(effects.iter().any(|e| matches!(e, Effect::Call(_))));
//! ```

use std::collections::VecDeque;

use kiosk_core::constants::MAX_HISTORY_SIZE;
use kiosk_core::{
    AttendanceSession, CanonicalIdentifier, Error, Liveness, Purpose, Result, ScanAction,
    ScanResolution, Student,
};
use tracing::{debug, info, warn};

use crate::effect::{Effect, ServiceCall, ServiceRequest, ServiceResponse, Ticket};
use crate::state::{Confirmation, SessionState, StateKind, StateTransition};

/// What an in-flight call was issued for.
#[derive(Debug, Clone)]
enum CallContext {
    Resolve,
    CheckIn { purpose: Purpose },
    CheckOut { student: Student },
}

#[derive(Debug, Clone)]
struct InFlight {
    ticket: Ticket,
    request: &'static str,
    context: CallContext,
}

/// State machine for one kiosk station.
#[derive(Debug)]
pub struct SessionMachine {
    state: SessionState,
    history: VecDeque<StateTransition>,
    effects: VecDeque<Effect>,
    in_flight: Option<InFlight>,
    pending_scan: Option<CanonicalIdentifier>,
    next_ticket: Ticket,
    device_id: String,
    liveness: Liveness,
}

impl SessionMachine {
    /// Create an idle machine for the given station.
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            state: SessionState::Idle,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
            effects: VecDeque::new(),
            in_flight: None,
            pending_scan: None,
            next_ticket: Ticket::first(),
            device_id: device_id.into(),
            liveness: Liveness::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn kind(&self) -> StateKind {
        self.state.kind()
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Recorded transitions, oldest first, at most `MAX_HISTORY_SIZE`.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Ticket of the call currently in flight.
    pub fn call_in_flight(&self) -> Option<Ticket> {
        self.in_flight.as_ref().map(|f| f.ticket)
    }

    pub fn pending_scan(&self) -> Option<&CanonicalIdentifier> {
        self.pending_scan.as_ref()
    }

    /// Liveness of this machine; retired by [`retire`](Self::retire).
    pub fn liveness(&self) -> &Liveness {
        &self.liveness
    }

    pub fn is_retired(&self) -> bool {
        !self.liveness.is_alive()
    }

    /// Drain queued effects in the order they were produced.
    pub fn drain_effects(&mut self) -> impl Iterator<Item = Effect> + '_ {
        self.effects.drain(..)
    }

    /// Handle a freshly scanned identifier.
    ///
    /// With no call in flight the scan is resolved at once, leaving any
    /// displayed result or purpose prompt through `Idle`. Otherwise it
    /// replaces the pending scan.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` only if the machine's state
    /// is inconsistent with the transition table.
    pub fn scan(&mut self, identifier: CanonicalIdentifier) -> Result<()> {
        if self.is_retired() {
            debug!(identifier = %identifier, "Scan ignored, machine retired");
            return Ok(());
        }
        if let Some(in_flight) = &self.in_flight {
            let ticket = in_flight.ticket;
            if let Some(replaced) = self.pending_scan.replace(identifier) {
                debug!(%ticket, replaced = %replaced, "Pending scan overwritten");
            } else {
                debug!(%ticket, "Scan held until call settles");
            }
            return Ok(());
        }
        self.start_resolution(identifier)
    }

    /// Confirm the visit purpose and issue the check-in.
    ///
    /// Ignored while a call is in flight.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` outside `AwaitingPurpose`.
    pub fn confirm_purpose(&mut self, purpose: Purpose) -> Result<()> {
        if self.is_retired() {
            return Ok(());
        }
        if let Some(in_flight) = &self.in_flight {
            warn!(ticket = %in_flight.ticket, purpose = %purpose, "Purpose ignored while call in flight");
            return Ok(());
        }
        let SessionState::AwaitingPurpose { student, .. } = &self.state else {
            return Err(Error::InvalidStateTransition {
                from: self.state.kind().to_string(),
                to: StateKind::Confirmed.to_string(),
            });
        };

        let request = ServiceRequest::CheckIn {
            student_id: student.id.clone(),
            purpose: purpose.clone(),
            device_id: self.device_id.clone(),
        };
        self.issue(request, CallContext::CheckIn { purpose });
        Ok(())
    }

    /// Abandon the purpose prompt, or dismiss a displayed result.
    ///
    /// Ignored while a call is in flight and in `Idle`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` only if the machine's state
    /// is inconsistent with the transition table.
    pub fn cancel(&mut self) -> Result<()> {
        if self.is_retired() {
            return Ok(());
        }
        if let Some(in_flight) = &self.in_flight {
            warn!(ticket = %in_flight.ticket, "Cancel ignored while call in flight");
            return Ok(());
        }
        if self.state.kind() != StateKind::Idle {
            self.transition_to(SessionState::Idle)?;
        }
        Ok(())
    }

    /// Apply the outcome of the call issued under `ticket`.
    ///
    /// Stale tickets and outcomes arriving after [`retire`](Self::retire)
    /// are discarded. A failed call is logged and the machine returns to
    /// `Idle` without retrying. A pending scan is dispatched afterwards.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` only if the machine's state
    /// is inconsistent with the transition table.
    pub fn complete(&mut self, ticket: Ticket, result: Result<ServiceResponse>) -> Result<()> {
        if self.is_retired() {
            debug!(%ticket, "Discarding call outcome, machine retired");
            return Ok(());
        }
        let Some(in_flight) = self.in_flight.take_if(|f| f.ticket == ticket) else {
            debug!(%ticket, "Discarding stale call outcome");
            return Ok(());
        };

        let outcome = result.and_then(|response| self.apply_response(in_flight.context, response));
        if let Err(e) = outcome {
            warn!(%ticket, request = in_flight.request, error = %e, "Service call failed");
            if self.state.kind() != StateKind::Idle {
                self.transition_to(SessionState::Idle)?;
            }
        }

        if let Some(next) = self.pending_scan.take() {
            debug!(identifier = %next, "Dispatching pending scan");
            self.start_resolution(next)?;
        }
        Ok(())
    }

    /// Retire the machine. Later scans, commands and outcomes are inert.
    pub fn retire(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            info!(ticket = %in_flight.ticket, "Abandoning in-flight call");
        }
        self.pending_scan = None;
        self.effects.clear();
        self.liveness.retire();
    }

    /// Transition to `next`, validating against the transition table.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the move is not allowed.
    fn transition_to(&mut self, next: SessionState) -> Result<StateTransition> {
        let from = self.state.kind();
        let to = next.kind();
        if !from.can_transition_to(&to) {
            return Err(Error::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let transition = StateTransition::new(from, to);
        info!(%from, %to, "State transition");
        self.effects.push_back(Effect::Announce(next.announcement()));
        self.state = next;
        self.add_to_history(transition.clone());
        Ok(transition)
    }

    fn add_to_history(&mut self, transition: StateTransition) {
        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }

    fn start_resolution(&mut self, identifier: CanonicalIdentifier) -> Result<()> {
        if self.state.kind() != StateKind::Idle {
            self.transition_to(SessionState::Idle)?;
        }
        self.transition_to(SessionState::Resolving {
            identifier: identifier.clone(),
        })?;
        self.issue(ServiceRequest::Resolve(identifier), CallContext::Resolve);
        Ok(())
    }

    fn issue(&mut self, request: ServiceRequest, context: CallContext) {
        let ticket = self.next_ticket;
        self.next_ticket = ticket.next();
        info!(%ticket, request = request.name(), "Issuing service call");
        self.in_flight = Some(InFlight {
            ticket,
            request: request.name(),
            context,
        });
        self.effects
            .push_back(Effect::Call(ServiceCall { ticket, request }));
    }

    fn apply_response(&mut self, context: CallContext, response: ServiceResponse) -> Result<()> {
        match (context, response) {
            (CallContext::Resolve, ServiceResponse::Resolved(resolution)) => {
                self.apply_resolution(resolution)
            }
            (CallContext::CheckIn { purpose }, ServiceResponse::Session(session)) => {
                self.confirm_check_in(purpose, session)
            }
            (CallContext::CheckOut { student }, ServiceResponse::Session(session)) => {
                let student_id = student.id.clone();
                self.transition_to(SessionState::Confirmed(Confirmation::CheckedOut {
                    student,
                    session,
                }))?;
                self.effects.push_back(Effect::RefreshHistory(student_id));
                Ok(())
            }
            (_, response) => Err(Error::MalformedResponse(format!(
                "unexpected response {response:?}"
            ))),
        }
    }

    fn apply_resolution(&mut self, resolution: ScanResolution) -> Result<()> {
        let action = resolution.action();
        let ScanResolution {
            allowed,
            student,
            active_session,
            ..
        } = resolution;

        if !allowed {
            self.transition_to(SessionState::Restricted { student })?;
            return Ok(());
        }

        match action {
            ScanAction::TimeIn => {
                let student = require_student(student, "check-in")?;
                self.transition_to(SessionState::AwaitingPurpose {
                    student,
                    active_session,
                })?;
            }
            ScanAction::TimeOut => {
                let student = require_student(student, "check-out")?;
                let Some(session) = active_session.filter(AttendanceSession::is_open) else {
                    return Err(Error::Rejected {
                        state: StateKind::Resolving.to_string(),
                        reason: "time-out requested without an active session".to_string(),
                    });
                };
                let request = ServiceRequest::CheckOut {
                    student_id: student.id.clone(),
                    session_id: session.id,
                };
                self.issue(request, CallContext::CheckOut { student });
            }
            ScanAction::None => {
                let student = require_student(student, "identification")?;
                let student_id = student.id.clone();
                self.transition_to(SessionState::Confirmed(Confirmation::Identified {
                    student,
                    active_session,
                }))?;
                self.effects.push_back(Effect::RefreshHistory(student_id));
            }
        }
        Ok(())
    }

    fn confirm_check_in(&mut self, purpose: Purpose, session: AttendanceSession) -> Result<()> {
        let SessionState::AwaitingPurpose { student, .. } = &self.state else {
            return Err(Error::Rejected {
                state: self.state.kind().to_string(),
                reason: "check-in completed outside the purpose prompt".to_string(),
            });
        };
        let student = student.clone();
        let student_id = student.id.clone();

        self.transition_to(SessionState::Confirmed(Confirmation::CheckedIn {
            student,
            session,
            purpose,
        }))?;
        self.effects.push_back(Effect::Chime);
        self.effects.push_back(Effect::RefreshHistory(student_id));
        Ok(())
    }
}

fn require_student(student: Option<Student>, action: &str) -> Result<Student> {
    student.ok_or_else(|| Error::MalformedResponse(format!("{action} resolved without a student")))
}
