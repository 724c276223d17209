//! HTTP implementation of [`AttendanceApi`].
//!
//! # Endpoints
//!
//! ```text
//! POST /api/attendance/scan          {qr}                           -> ScanResolution
//! POST /api/attendance/time-in       {studentId, purpose, deviceId} -> {session}
//! POST /api/attendance/time-out      {studentId, sessionId}         -> {session}
//! GET  /api/students/{id}/history                                   -> [visit] | {visits}
//! GET  /api/attendance/recent?page=&limit=                          -> RecentVisitsPage
//! ```
//!
//! The client is a thin transport: no retry, no caching. Every failure is
//! returned to the caller, which decides what to do with it.

use std::time::Duration;

use kiosk_core::constants::{PATH_RECENT, PATH_SCAN, PATH_STUDENTS, PATH_TIME_IN, PATH_TIME_OUT};
use kiosk_core::config::ServiceConfig;
use kiosk_core::{
    AttendanceSession, CanonicalIdentifier, Purpose, RecentVisitsPage, ScanResolution, SessionId,
    StudentId, VisitRecord,
};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::AttendanceApi;
use crate::error::ClientError;

#[derive(Debug, Serialize)]
struct ScanRequest<'a> {
    qr: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TimeInRequest<'a> {
    student_id: &'a str,
    purpose: &'a str,
    device_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TimeOutRequest<'a> {
    student_id: &'a str,
    session_id: &'a str,
}

/// Check-in and check-out answer either `{session: {...}}` or the bare session.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SessionResponse {
    Wrapped { session: AttendanceSession },
    Bare(AttendanceSession),
}

impl SessionResponse {
    fn into_session(self) -> AttendanceSession {
        match self {
            Self::Wrapped { session } | Self::Bare(session) => session,
        }
    }
}

/// History answers either a bare array or `{visits: [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HistoryResponse {
    List(Vec<VisitRecord>),
    Wrapped {
        #[serde(default)]
        visits: Vec<VisitRecord>,
    },
}

/// Attendance service client over HTTP/JSON.
///
/// # Example
///
/// ```no_run
/// use kiosk_client::{AttendanceApi, HttpAttendanceClient};
/// use kiosk_core::{CanonicalIdentifier, config::ServiceConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpAttendanceClient::new(&ServiceConfig::default())?;
/// let resolution = client
///     .resolve_scan(CanonicalIdentifier::new("2023-0001")?)
///     .await?;
/// println!("allowed: {}", resolution.allowed);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpAttendanceClient {
    http: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpAttendanceClient {
    /// Build a client for the configured service.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidUrl` if the base URL does not parse or
    /// cannot carry a path, and `ClientError::Transport` if the HTTP client
    /// cannot be initialized.
    pub fn new(config: &ServiceConfig) -> Result<Self, ClientError> {
        let raw = config.base_url.trim();
        let base_url = Url::parse(raw).map_err(|e| ClientError::invalid_url(raw, e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::invalid_url(raw, "URL cannot be a base"));
        }

        let timeout = config.timeout();
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Transport)?;

        debug!(base_url = %base_url, timeout_ms = timeout.as_millis() as u64, "Created attendance client");
        Ok(Self {
            http,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join path segments onto the base URL, percent-encoding each segment.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::invalid_url(self.base_url.as_str(), "URL cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn path_endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.endpoint(path.trim_start_matches('/').split('/'))
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.path_endpoint(path)?;
        debug!(%url, "POST");
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;
        self.read_json(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        debug!(%url, "GET");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;
        self.read_json(response).await
    }

    async fn read_json<T: DeserializeOwned>(&self, response: Response) -> Result<T, ClientError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_transport(e))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), body = %body, "Attendance service returned error status");
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    fn map_transport(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.timeout.as_millis() as u64)
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err)
        }
    }
}

impl AttendanceApi for HttpAttendanceClient {
    async fn resolve_scan(
        &self,
        identifier: CanonicalIdentifier,
    ) -> kiosk_core::Result<ScanResolution> {
        let request = ScanRequest {
            qr: identifier.as_str(),
        };
        let resolution: ScanResolution = self.post_json(PATH_SCAN, &request).await?;
        info!(
            allowed = resolution.allowed,
            action = ?resolution.action(),
            "Scan resolved"
        );
        Ok(resolution)
    }

    async fn check_in(
        &self,
        student_id: StudentId,
        purpose: Purpose,
        device_id: String,
    ) -> kiosk_core::Result<AttendanceSession> {
        let request = TimeInRequest {
            student_id: student_id.as_str(),
            purpose: purpose.label(),
            device_id: &device_id,
        };
        let response: SessionResponse = self.post_json(PATH_TIME_IN, &request).await?;
        let session = response.into_session();
        info!(student_id = %student_id, session_id = %session.id, "Check-in recorded");
        Ok(session)
    }

    async fn check_out(
        &self,
        student_id: StudentId,
        session_id: SessionId,
    ) -> kiosk_core::Result<AttendanceSession> {
        let request = TimeOutRequest {
            student_id: student_id.as_str(),
            session_id: session_id.as_str(),
        };
        let response: SessionResponse = self.post_json(PATH_TIME_OUT, &request).await?;
        let session = response.into_session();
        info!(student_id = %student_id, session_id = %session.id, "Check-out recorded");
        Ok(session)
    }

    async fn visit_history(
        &self,
        student_id: StudentId,
        limit: usize,
    ) -> kiosk_core::Result<Vec<VisitRecord>> {
        let base = PATH_STUDENTS.trim_start_matches('/').split('/');
        let url = self.endpoint(base.chain([student_id.as_str(), "history"]))?;
        let response: HistoryResponse = self.get_json(url).await?;

        let mut visits = match response {
            HistoryResponse::List(visits) | HistoryResponse::Wrapped { visits } => visits,
        };
        visits.truncate(limit);
        debug!(student_id = %student_id, count = visits.len(), "Fetched visit history");
        Ok(visits)
    }

    async fn recent_visits(&self, page: u32, limit: u32) -> kiosk_core::Result<RecentVisitsPage> {
        let mut url = self.path_endpoint(PATH_RECENT)?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string());
        let recent: RecentVisitsPage = self.get_json(url).await?;
        debug!(page, count = recent.visits.len(), "Fetched recent visits");
        Ok(recent)
    }
}
