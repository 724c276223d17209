//! Client for the remote attendance service.

pub mod api;
pub mod error;
pub mod http;

pub use api::AttendanceApi;
pub use error::ClientError;
pub use http::HttpAttendanceClient;
