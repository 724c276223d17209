//! Common test utilities for kiosk runtime integration tests.
//!
//! [`ScriptedApi`] is an in-memory attendance service with a fixed roster:
//!
//! | identifier  | outcome                                         |
//! |-------------|-------------------------------------------------|
//! | `2023-0142` | allowed, `TIME_IN`                              |
//! | `2023-0257` | allowed, `TIME_OUT` with open session `v257`    |
//! | `2023-0369` | allowed, no action                              |
//! | `banned`    | not allowed                                     |
//! | `slow`      | allowed, `TIME_IN`, after [`SLOW_DELAY`]         |
//! | anything else | `Error::Service` (student not found)          |
//!
//! Every call is recorded as a short string such as `resolve:2023-0142`.

#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use kiosk_client::AttendanceApi;
use kiosk_core::{
    AttendanceSession, CanonicalIdentifier, Error, KioskConfig, Purpose, RecentVisitsPage,
    Result, ScanAction, ScanResolution, SessionId, Student, StudentId, VisitRecord,
};
use kiosk_session::{Feedback, SessionState, StateKind};

/// Latency of every scripted call.
pub const CALL_DELAY: Duration = Duration::from_millis(20);

/// Latency of resolving the `slow` identifier.
pub const SLOW_DELAY: Duration = Duration::from_secs(10);

#[derive(Debug, Default)]
pub struct ScriptedApi {
    calls: Mutex<Vec<String>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn student(id: &str, first: &str, last: &str) -> Student {
    Student::new(StudentId::new(id).unwrap(), first, last)
}

pub fn open_session(id: &str) -> AttendanceSession {
    AttendanceSession {
        id: SessionId::new(id).unwrap(),
        purpose: None,
        time_in: Some(Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap()),
        time_out: None,
        device_id: Some("kiosk-1".to_string()),
    }
}

fn allowed(student: Student, action: Option<ScanAction>) -> ScanResolution {
    ScanResolution {
        allowed: true,
        action,
        student: Some(student),
        active_session: None,
    }
}

impl AttendanceApi for ScriptedApi {
    async fn resolve_scan(&self, identifier: CanonicalIdentifier) -> Result<ScanResolution> {
        self.record(format!("resolve:{identifier}"));
        let delay = if identifier.as_str() == "slow" {
            SLOW_DELAY
        } else {
            CALL_DELAY
        };
        tokio::time::sleep(delay).await;

        match identifier.as_str() {
            "2023-0142" | "slow" => Ok(allowed(
                student("s142", "Ana", "Reyes"),
                Some(ScanAction::TimeIn),
            )),
            "2023-0257" => Ok(ScanResolution {
                active_session: Some(open_session("v257")),
                ..allowed(student("s257", "Ben", "Cruz"), Some(ScanAction::TimeOut))
            }),
            "2023-0369" => Ok(allowed(student("s369", "Carla", "Santos"), None)),
            "banned" => Ok(ScanResolution {
                allowed: false,
                action: None,
                student: Some(student("s666", "Dan", "Lim")),
                active_session: None,
            }),
            other => Err(Error::Service(format!("404 Not Found: Student not found ({other})"))),
        }
    }

    async fn check_in(
        &self,
        student_id: StudentId,
        purpose: Purpose,
        device_id: String,
    ) -> Result<AttendanceSession> {
        self.record(format!("check_in:{student_id}:{purpose}:{device_id}"));
        tokio::time::sleep(CALL_DELAY).await;
        Ok(AttendanceSession {
            purpose: Some(purpose.label().to_string()),
            device_id: Some(device_id),
            ..open_session("v-new")
        })
    }

    async fn check_out(
        &self,
        student_id: StudentId,
        session_id: SessionId,
    ) -> Result<AttendanceSession> {
        self.record(format!("check_out:{student_id}:{session_id}"));
        tokio::time::sleep(CALL_DELAY).await;
        Ok(AttendanceSession {
            time_out: Some(Utc.with_ymd_and_hms(2025, 1, 10, 9, 30, 0).unwrap()),
            ..open_session(session_id.as_str())
        })
    }

    async fn visit_history(&self, student_id: StudentId, limit: usize) -> Result<Vec<VisitRecord>> {
        self.record(format!("history:{student_id}:{limit}"));
        tokio::time::sleep(CALL_DELAY).await;
        let visits = (0..3)
            .map(|i| VisitRecord::new(Utc.with_ymd_and_hms(2025, 1, 3 + i, 8, 0, 0).unwrap()))
            .take(limit)
            .collect();
        Ok(visits)
    }

    async fn recent_visits(&self, page: u32, limit: u32) -> Result<RecentVisitsPage> {
        self.record(format!("recent:{page}:{limit}"));
        Ok(RecentVisitsPage {
            visits: Vec::new(),
            page,
            limit,
            total: Some(0),
            total_pages: 0,
            has_more: false,
        })
    }
}

/// Everything the runtime reported, in order.
#[derive(Debug, Default)]
pub struct RecordingFeedback {
    pub announcements: Vec<String>,
    pub chimes: usize,
    pub histories: Vec<(StudentId, usize)>,
    pub states: Vec<StateKind>,
}

impl RecordingFeedback {
    pub fn last_announcement(&self) -> Option<&str> {
        self.announcements.last().map(String::as_str)
    }

    pub fn announced(&self, text: &str) -> bool {
        self.announcements.iter().any(|a| a.starts_with(text))
    }
}

impl Feedback for RecordingFeedback {
    fn announce(&mut self, text: &str) {
        self.announcements.push(text.to_string());
    }

    fn chime(&mut self) {
        self.chimes += 1;
    }

    fn show_history(&mut self, student_id: &StudentId, visits: &[VisitRecord]) {
        self.histories.push((student_id.clone(), visits.len()));
    }

    fn state_changed(&mut self, state: &SessionState) {
        self.states.push(state.kind());
    }
}

/// Default configuration with a short history limit.
pub fn test_config() -> KioskConfig {
    let mut config = KioskConfig::default();
    config.kiosk.history_limit = 2;
    config
}
