//! Terminal modes and output for `kiosk run`.
//!
//! The kiosk reads the terminal in raw mode so every scanner keystroke
//! arrives as its own event. Raw mode also disables output newline
//! translation, so text written while it is active goes through
//! [`CrlfWriter`].

use std::io::{self, Write};

use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tracing::warn;

/// Raw mode with bracketed paste, restored on drop.
#[derive(Debug)]
pub struct RawTerminal {
    _private: (),
}

impl RawTerminal {
    /// Switch the controlling terminal to raw mode and enable bracketed
    /// paste.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the terminal cannot be configured, for
    /// example when there is no controlling terminal.
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        if let Err(e) = execute!(io::stdout(), EnableBracketedPaste) {
            if let Err(restore) = disable_raw_mode() {
                warn!(error = %restore, "Failed to leave raw mode");
            }
            return Err(e);
        }
        Ok(Self { _private: () })
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        if let Err(e) = execute!(io::stdout(), DisableBracketedPaste) {
            warn!(error = %e, "Failed to disable bracketed paste");
        }
        if let Err(e) = disable_raw_mode() {
            warn!(error = %e, "Failed to leave raw mode");
        }
    }
}

/// Writer that ends every line with `\r\n`.
#[derive(Debug)]
pub struct CrlfWriter<W> {
    inner: W,
}

impl<W: Write> CrlfWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write> Write for CrlfWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for chunk in buf.split_inclusive(|&b| b == b'\n') {
            match chunk.strip_suffix(b"\n") {
                Some(line) => {
                    self.inner.write_all(line)?;
                    self.inner.write_all(b"\r\n")?;
                }
                None => self.inner.write_all(chunk)?,
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Print `text` and a line break on stdout.
pub fn display(text: &str) {
    write_stdout(format_args!("{text}\n"));
}

/// Print `text` on stdout without a line break, flushed immediately.
pub fn echo(text: &str) {
    write_stdout(format_args!("{text}"));
}

fn write_stdout(args: std::fmt::Arguments<'_>) {
    let mut out = CrlfWriter::new(io::stdout().lock());
    if let Err(e) = out.write_fmt(args).and_then(|()| out.flush()) {
        warn!(error = %e, "Failed to write to the operator display");
    }
}
