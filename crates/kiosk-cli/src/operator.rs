//! Operator lines typed at the kiosk console.
//!
//! A line starting with `:` is an operator command rather than a scan:
//!
//! - `:1` … `:8` choose a visit purpose by menu position (`:8 <text>` for
//!   a free-text purpose)
//! - `:other <text>` chooses a free-text purpose
//! - `:cancel` (or `:c`) dismisses the prompt or the displayed result

use kiosk_core::{Error, Purpose, Result};
use kiosk_session::OperatorCommand;

/// Leading character that marks an operator line.
pub const OPERATOR_PREFIX: char = ':';

/// Parse the text of an operator line, without the leading `:`.
///
/// # Errors
///
/// Returns `Error::Rejected` for an unknown command or menu position.
pub fn parse_operator_line(line: &str) -> Result<OperatorCommand> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

    match word.to_ascii_lowercase().as_str() {
        "c" | "cancel" => Ok(OperatorCommand::Cancel),
        "other" | "others" => Ok(OperatorCommand::ConfirmPurpose(Purpose::Others(
            rest.trim().to_string(),
        ))),
        choice => {
            let position = choice.parse::<usize>().map_err(|_| Error::Rejected {
                state: "console".to_string(),
                reason: format!("unknown operator command ':{line}'"),
            })?;
            Purpose::from_choice(position, rest).map(OperatorCommand::ConfirmPurpose)
        }
    }
}

/// The purpose menu as shown to the operator.
pub fn purpose_menu() -> String {
    Purpose::CHOICES
        .iter()
        .enumerate()
        .map(|(i, label)| format!("  :{}  {label}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}
