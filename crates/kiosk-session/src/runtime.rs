//! Event loop driving one kiosk station.
//!
//! [`KioskRuntime`] multiplexes four inputs on a single task:
//!
//! - input events from the [`InputSource`], decoded into scans
//! - operator commands sent through a [`RuntimeHandle`]
//! - the outcome of the service call in flight
//! - the outcome of the latest visit history request
//!
//! After each input the machine's queued effects are executed. Because the
//! loop owns the machine, there is never more than one writer.
//!
//! # Shutdown
//!
//! [`RuntimeHandle::shutdown`] retires the machine. The loop exits at the
//! next poll and drops any call still in flight, so a late outcome is never
//! applied. When the input source disconnects, the loop finishes the call in
//! flight (and any scan it dispatches) before returning.

use std::sync::Arc;

use futures::future::{BoxFuture, OptionFuture};
use kiosk_client::AttendanceApi;
use kiosk_core::{Error, KioskConfig, Liveness, Purpose, Result, StudentId, VisitRecord};
use kiosk_scanner::{InputEvent, InputSource, KeystrokeDecoder, ScanCode, canonicalize};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::effect::{Effect, ServiceCall, ServiceRequest, ServiceResponse, Ticket};
use crate::feedback::Feedback;
use crate::machine::SessionMachine;

const COMMAND_CAPACITY: usize = 16;

type CallFuture = BoxFuture<'static, (Ticket, Result<ServiceResponse>)>;
type HistoryFuture = BoxFuture<'static, (StudentId, Result<Vec<VisitRecord>>)>;

/// Input from the kiosk operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    ConfirmPurpose(Purpose),
    Cancel,
}

/// Control handle for a running [`KioskRuntime`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    commands: mpsc::Sender<OperatorCommand>,
    liveness: Liveness,
}

impl RuntimeHandle {
    /// Confirm the visit purpose for the student on screen.
    ///
    /// # Errors
    ///
    /// Returns `Error::Disconnected` if the runtime has stopped.
    pub async fn confirm_purpose(&self, purpose: Purpose) -> Result<()> {
        self.send(OperatorCommand::ConfirmPurpose(purpose)).await
    }

    /// Dismiss the purpose prompt or the displayed result.
    ///
    /// # Errors
    ///
    /// Returns `Error::Disconnected` if the runtime has stopped.
    pub async fn cancel(&self) -> Result<()> {
        self.send(OperatorCommand::Cancel).await
    }

    /// Send a raw operator command.
    ///
    /// # Errors
    ///
    /// Returns `Error::Disconnected` if the runtime has stopped.
    pub async fn send(&self, command: OperatorCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| Error::Disconnected("kiosk runtime".to_string()))
    }

    /// Stop the runtime, discarding any call in flight.
    pub fn shutdown(&self) {
        self.liveness.retire();
    }

    pub fn is_running(&self) -> bool {
        self.liveness.is_alive() && !self.commands.is_closed()
    }
}

/// One kiosk station: scanner input, session machine and service client.
pub struct KioskRuntime<A, S, F> {
    api: Arc<A>,
    source: S,
    feedback: F,
    decoder: KeystrokeDecoder,
    machine: SessionMachine,
    commands: mpsc::Receiver<OperatorCommand>,
    history_limit: usize,
}

impl<A, S, F> KioskRuntime<A, S, F>
where
    A: AttendanceApi + 'static,
    S: InputSource,
    F: Feedback,
{
    pub fn new(api: Arc<A>, source: S, feedback: F, config: &KioskConfig) -> (Self, RuntimeHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        let machine = SessionMachine::new(config.kiosk.device_id.clone());
        let handle = RuntimeHandle {
            commands: tx,
            liveness: machine.liveness().clone(),
        };
        let runtime = Self {
            api,
            source,
            feedback,
            decoder: KeystrokeDecoder::with_gap_threshold(config.scanner.gap_threshold()),
            machine,
            commands: rx,
            history_limit: config.kiosk.history_limit,
        };
        (runtime, handle)
    }

    pub fn machine(&self) -> &SessionMachine {
        &self.machine
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    /// Run until shutdown, or until the source disconnects and the call in
    /// flight has settled. Returns the feedback sink.
    ///
    /// # Errors
    ///
    /// Returns an error only for a non-recoverable source failure.
    pub async fn run(mut self) -> Result<F> {
        let shutdown = self.machine.liveness().clone();
        let mut call: Option<CallFuture> = None;
        let mut history: Option<HistoryFuture> = None;
        let mut source_open = true;

        info!(
            source = self.source.name(),
            device_id = self.machine.device_id(),
            "Kiosk runtime started"
        );
        self.feedback
            .announce(&self.machine.state().announcement());

        loop {
            if !source_open && call.is_none() {
                info!("Input source closed, stopping");
                break;
            }

            tokio::select! {
                biased;

                () = shutdown.retired() => {
                    info!("Shutdown requested");
                    break;
                }

                Some((ticket, result)) = OptionFuture::from(call.as_mut()) => {
                    call = None;
                    if let Err(e) = self.machine.complete(ticket, result) {
                        error!(%ticket, error = %e, "Failed to apply call outcome");
                    }
                }

                Some((student_id, result)) = OptionFuture::from(history.as_mut()) => {
                    history = None;
                    match result {
                        Ok(visits) => self.feedback.show_history(&student_id, &visits),
                        Err(e) => warn!(student_id = %student_id, error = %e, "History refresh failed"),
                    }
                }

                event = self.source.next_event(), if source_open => {
                    match event {
                        Ok(event) => self.handle_event(event),
                        Err(e) if e.is_disconnected() => {
                            info!(source = self.source.name(), "Input source disconnected");
                            source_open = false;
                        }
                        Err(e) => {
                            error!(source = self.source.name(), error = %e, "Input source failed");
                            self.machine.retire();
                            return Err(e.into());
                        }
                    }
                }

                Some(command) = self.commands.recv() => {
                    self.handle_command(command);
                }

                else => break,
            }

            self.run_effects(&mut call, &mut history);
        }

        self.machine.retire();
        let stats = self.decoder.stats();
        info!(
            scans = stats.scans_emitted,
            fragments_discarded = stats.fragments_discarded,
            overflows = stats.overflows,
            "Kiosk runtime stopped"
        );
        Ok(self.feedback)
    }

    fn handle_event(&mut self, event: InputEvent) {
        if let Some(code) = self.decoder.feed(event) {
            self.handle_scan(code);
        }
    }

    fn handle_scan(&mut self, code: ScanCode) {
        let raw_len = code.len();
        let Some(identifier) = canonicalize(code) else {
            debug!(raw_len, "Scan empty after sanitization");
            return;
        };
        info!(identifier = %identifier, "Scan decoded");
        if let Err(e) = self.machine.scan(identifier) {
            error!(error = %e, "Scan rejected");
        }
    }

    fn handle_command(&mut self, command: OperatorCommand) {
        debug!(?command, "Operator command");
        let outcome = match command {
            OperatorCommand::ConfirmPurpose(purpose) => self.machine.confirm_purpose(purpose),
            OperatorCommand::Cancel => self.machine.cancel(),
        };
        if let Err(e) = outcome {
            warn!(error = %e, "Operator command rejected");
        }
    }

    fn run_effects(&mut self, call: &mut Option<CallFuture>, history: &mut Option<HistoryFuture>) {
        let effects: Vec<Effect> = self.machine.drain_effects().collect();
        let mut announced = false;

        for effect in effects {
            match effect {
                Effect::Call(service_call) => {
                    if matches!(service_call.request, ServiceRequest::Resolve(_))
                        && history.take().is_some()
                    {
                        debug!("Dropping history refresh for the previous student");
                    }
                    *call = Some(self.dispatch(service_call));
                }
                Effect::Announce(text) => {
                    self.feedback.announce(&text);
                    announced = true;
                }
                Effect::Chime => self.feedback.chime(),
                Effect::RefreshHistory(student_id) => {
                    *history = Some(self.fetch_history(student_id));
                }
            }
        }

        if announced {
            self.feedback.state_changed(self.machine.state());
        }
    }

    fn dispatch(&self, call: ServiceCall) -> CallFuture {
        let api = Arc::clone(&self.api);
        let ServiceCall { ticket, request } = call;
        debug!(%ticket, request = request.name(), "Dispatching service call");

        Box::pin(async move {
            let result = match request {
                ServiceRequest::Resolve(identifier) => api
                    .resolve_scan(identifier)
                    .await
                    .map(ServiceResponse::Resolved),
                ServiceRequest::CheckIn {
                    student_id,
                    purpose,
                    device_id,
                } => api
                    .check_in(student_id, purpose, device_id)
                    .await
                    .map(ServiceResponse::Session),
                ServiceRequest::CheckOut {
                    student_id,
                    session_id,
                } => api
                    .check_out(student_id, session_id)
                    .await
                    .map(ServiceResponse::Session),
            };
            (ticket, result)
        })
    }

    fn fetch_history(&self, student_id: StudentId) -> HistoryFuture {
        let api = Arc::clone(&self.api);
        let limit = self.history_limit;
        Box::pin(async move {
            let result = api.visit_history(student_id.clone(), limit).await;
            (student_id, result)
        })
    }
}
