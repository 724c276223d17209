//! Terminal wiring for `kiosk run`.
//!
//! Stdin carries both the scanner stream and operator lines. [`ConsoleSource`]
//! removes operator lines from the event stream and forwards them as
//! commands; everything else reaches the keystroke decoder untouched.
//! Operator lines are echoed, since the raw terminal does not echo input.
//! [`ConsoleFeedback`] prints the operator display on stdout.

use kiosk_core::{StudentId, VisitRecord};
use kiosk_feed::format_entry;
use kiosk_scanner::{InputEvent, InputSource, Key};
use kiosk_session::{Feedback, OperatorCommand, SessionState, StateKind, TracingFeedback};
use tokio::sync::mpsc;
use tracing::warn;

use crate::operator::{OPERATOR_PREFIX, parse_operator_line, purpose_menu};
use crate::terminal::{display, echo};

/// Input source that splits operator lines off another source.
#[derive(Debug)]
pub struct ConsoleSource<S> {
    inner: S,
    commands: mpsc::UnboundedSender<OperatorCommand>,
    operator_line: Option<String>,
    at_line_start: bool,
}

impl<S: InputSource> ConsoleSource<S> {
    /// Wrap `inner`; parsed operator commands are sent to `commands`.
    pub fn new(inner: S, commands: mpsc::UnboundedSender<OperatorCommand>) -> Self {
        Self {
            inner,
            commands,
            operator_line: None,
            at_line_start: true,
        }
    }

    fn finish_operator_line(&mut self) {
        let Some(line) = self.operator_line.take() else {
            return;
        };
        match parse_operator_line(&line) {
            Ok(command) => {
                if self.commands.send(command).is_err() {
                    warn!("Operator command dropped, runtime stopped");
                }
            }
            Err(e) => {
                warn!(error = %e, "Ignoring operator line");
                display(&format!(
                    "Unknown command ':{line}'. Purposes:\n{}\n  :cancel",
                    purpose_menu()
                ));
            }
        }
    }
}

impl<S: InputSource> InputSource for ConsoleSource<S> {
    async fn next_event(&mut self) -> kiosk_scanner::Result<InputEvent> {
        loop {
            let event = self.inner.next_event().await?;
            let key = match &event {
                InputEvent::Key { key, .. } => Some(key),
                InputEvent::Paste { .. } => None,
            };

            if let Some(line) = self.operator_line.as_mut() {
                match key {
                    Some(Key::Enter) => {
                        display("");
                        self.finish_operator_line();
                        self.at_line_start = true;
                    }
                    Some(Key::Char(c)) => {
                        line.push(*c);
                        echo(&c.to_string());
                    }
                    Some(Key::Other(name)) if name == "Backspace" => {
                        if line.pop().is_some() {
                            echo("\x08 \x08");
                        }
                    }
                    _ => {}
                }
                continue;
            }

            if self.at_line_start && key == Some(&Key::Char(OPERATOR_PREFIX)) {
                echo(&OPERATOR_PREFIX.to_string());
                self.operator_line = Some(String::new());
                continue;
            }

            self.at_line_start = matches!(key, Some(Key::Enter));
            return Ok(event);
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Operator display on stdout, mirrored to the log.
#[derive(Debug, Default)]
pub struct ConsoleFeedback {
    log: TracingFeedback,
}

impl Feedback for ConsoleFeedback {
    fn announce(&mut self, text: &str) {
        self.log.announce(text);
        display(text);
    }

    fn chime(&mut self) {
        self.log.chime();
        echo("\x07");
    }

    fn show_history(&mut self, student_id: &StudentId, visits: &[VisitRecord]) {
        self.log.show_history(student_id, visits);
        if visits.is_empty() {
            display("  No previous visits.");
            return;
        }
        display("  Recent visits:");
        for visit in visits {
            display(&format!("    {}", format_entry(visit)));
        }
    }

    fn state_changed(&mut self, state: &SessionState) {
        self.log.state_changed(state);
        if let Some(student) = state.student() {
            let number = student.student_no.as_deref().unwrap_or("-");
            display(&format!("  {} ({number})", student.display_name()));
        }
        if state.kind() == StateKind::AwaitingPurpose {
            display(&format!("{}\n  :cancel", purpose_menu()));
        }
    }
}
