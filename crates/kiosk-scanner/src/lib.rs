//! Scan pipeline for the attendance kiosk.
//!
//! Raw input events flow through three stages:
//!
//! ```text
//! InputSource ──> KeystrokeDecoder ──> sanitize ──> interpret ──> CanonicalIdentifier
//!   (events)        (ScanCode)          (String)
//! ```
//!
//! The decoder and both text stages are pure; only the sources perform I/O.

pub mod decoder;
pub mod error;
pub mod event;
pub mod interpret;
pub mod sanitize;
pub mod source;

pub use decoder::{DecoderStats, KeystrokeDecoder, ScanCode};
pub use error::{Result, SourceError};
pub use event::{InputEvent, Key, Modifier};
pub use interpret::{canonicalize, interpret};
pub use sanitize::sanitize;
pub use source::{InputSource, SyntheticSource, SyntheticSourceHandle, TerminalSource, next_scan};
