pub mod config;
pub mod constants;
pub mod error;
pub mod liveness;
pub mod time;
pub mod types;

pub use config::KioskConfig;
pub use error::{Error, Result};
pub use liveness::Liveness;
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
