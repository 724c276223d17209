use crate::{Result, error::Error};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Student identity as assigned by the attendance service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(String);

impl StudentId {
    /// Create a student ID.
    ///
    /// # Errors
    /// Returns `Error::InvalidIdentifier` if the ID is blank.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::InvalidIdentifier("student id is empty".to_string()));
        }
        Ok(StudentId(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Attendance session identity as assigned by the attendance service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a session ID.
    ///
    /// # Errors
    /// Returns `Error::InvalidIdentifier` if the ID is blank.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::InvalidIdentifier("session id is empty".to_string()));
        }
        Ok(SessionId(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The value sent to the scan resolver.
///
/// Either a sanitized raw code or a field extracted from a structured
/// payload. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalIdentifier(String);

impl CanonicalIdentifier {
    /// Create a canonical identifier.
    ///
    /// # Errors
    /// Returns `Error::InvalidIdentifier` if the value is empty.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(Error::InvalidIdentifier(
                "canonical identifier is empty".to_string(),
            ));
        }
        Ok(CanonicalIdentifier(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for CanonicalIdentifier {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        CanonicalIdentifier::new(value)
    }
}

impl From<CanonicalIdentifier> for String {
    fn from(id: CanonicalIdentifier) -> Self {
        id.0
    }
}

impl fmt::Display for CanonicalIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Student record as returned by the attendance service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StudentWire")]
pub struct Student {
    pub id: StudentId,
    pub student_no: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub middle_initial: Option<String>,
    pub suffix: Option<String>,
    pub level: Option<String>,
    pub course: Option<String>,
}

/// Student as sent by the service, which may carry `_id`, `id`, or both.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudentWire {
    #[serde(default, rename = "_id")]
    object_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    student_no: Option<String>,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    middle_name: Option<String>,
    #[serde(default)]
    middle_initial: Option<String>,
    #[serde(default)]
    suffix: Option<String>,
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    course: Option<String>,
}

impl TryFrom<StudentWire> for Student {
    type Error = Error;

    fn try_from(wire: StudentWire) -> Result<Self> {
        let id = first_present_id(wire.object_id, wire.id)
            .ok_or_else(|| Error::InvalidIdentifier("student record has no id".to_string()))?;
        Ok(Self {
            id: StudentId::new(id)?,
            student_no: wire.student_no,
            first_name: wire.first_name,
            last_name: wire.last_name,
            middle_name: wire.middle_name,
            middle_initial: wire.middle_initial,
            suffix: wire.suffix,
            level: wire.level,
            course: wire.course,
        })
    }
}

/// `_id` wins over `id`; blank values count as absent.
fn first_present_id(object_id: Option<String>, id: Option<String>) -> Option<String> {
    object_id
        .into_iter()
        .chain(id)
        .find(|id| !id.trim().is_empty())
}

impl Student {
    /// Create a student with only the identity and name fields set.
    pub fn new(id: StudentId, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id,
            student_no: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            middle_name: None,
            middle_initial: None,
            suffix: None,
            level: None,
            course: None,
        }
    }

    #[must_use]
    pub fn with_student_no(mut self, student_no: impl Into<String>) -> Self {
        self.student_no = Some(student_no.into());
        self
    }

    /// Name formatted for display: `Last, First M. Suffix`.
    ///
    /// Falls back to whichever name part is present, then to the student
    /// number, then to `Unknown`.
    #[must_use]
    pub fn display_name(&self) -> String {
        let first = self.first_name.trim();
        let last = self.last_name.trim();

        if !first.is_empty() && !last.is_empty() {
            let mut name = format!("{last}, {first}");
            let initial = self
                .middle_initial
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .or(self.middle_name.as_deref())
                .and_then(|m| m.trim().chars().next());
            if let Some(initial) = initial {
                name.push(' ');
                name.push(initial);
                name.push('.');
            }
            if let Some(suffix) = self.suffix.as_deref().filter(|s| !s.trim().is_empty()) {
                name.push(' ');
                name.push_str(suffix.trim());
            }
            return name;
        }

        if !last.is_empty() {
            return last.to_string();
        }
        if !first.is_empty() {
            return first.to_string();
        }
        self.student_no
            .clone()
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

/// Reason for a visit, chosen by the operator before check-in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Purpose {
    Research,
    BorrowReturn,
    IndividualStudy,
    GroupStudy,
    ComputerUse,
    Printing,
    Consultation,
    /// Free-text purpose. Blank text is reported as `Others`.
    Others(String),
}

impl Purpose {
    /// Fixed choices in menu order. `Others` is always last.
    pub const CHOICES: [&'static str; 8] = [
        "Research",
        "Borrow/Return",
        "Individual Study",
        "Group Study",
        "Computer / Internet Use",
        "Printing / Photocopy",
        "Consultation",
        "Others",
    ];

    /// Select a purpose by its 1-based menu position.
    ///
    /// `other` is only used for the last choice (`Others`).
    ///
    /// # Errors
    /// Returns `Error::Rejected` if the position is outside the menu.
    pub fn from_choice(position: usize, other: &str) -> Result<Self> {
        match position {
            1 => Ok(Purpose::Research),
            2 => Ok(Purpose::BorrowReturn),
            3 => Ok(Purpose::IndividualStudy),
            4 => Ok(Purpose::GroupStudy),
            5 => Ok(Purpose::ComputerUse),
            6 => Ok(Purpose::Printing),
            7 => Ok(Purpose::Consultation),
            8 => Ok(Purpose::Others(other.trim().to_string())),
            _ => Err(Error::Rejected {
                state: "AwaitingPurpose".to_string(),
                reason: format!("purpose choice must be 1-{}, got {position}", Self::CHOICES.len()),
            }),
        }
    }

    /// Label sent to the attendance service.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Purpose::Research => Self::CHOICES[0],
            Purpose::BorrowReturn => Self::CHOICES[1],
            Purpose::IndividualStudy => Self::CHOICES[2],
            Purpose::GroupStudy => Self::CHOICES[3],
            Purpose::ComputerUse => Self::CHOICES[4],
            Purpose::Printing => Self::CHOICES[5],
            Purpose::Consultation => Self::CHOICES[6],
            Purpose::Others(text) if text.trim().is_empty() => Self::CHOICES[7],
            Purpose::Others(text) => text.trim(),
        }
    }
}

impl From<String> for Purpose {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Research" => Purpose::Research,
            "Borrow/Return" => Purpose::BorrowReturn,
            "Individual Study" => Purpose::IndividualStudy,
            "Group Study" => Purpose::GroupStudy,
            "Computer / Internet Use" => Purpose::ComputerUse,
            "Printing / Photocopy" => Purpose::Printing,
            "Consultation" => Purpose::Consultation,
            _ => Purpose::Others(label),
        }
    }
}

impl From<Purpose> for String {
    fn from(purpose: Purpose) -> Self {
        purpose.label().to_string()
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An open or closed visit, owned by the attendance service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SessionWire")]
pub struct AttendanceSession {
    pub id: SessionId,
    pub purpose: Option<String>,
    pub time_in: Option<DateTime<Utc>>,
    pub time_out: Option<DateTime<Utc>>,
    pub device_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionWire {
    #[serde(default, rename = "_id")]
    object_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    purpose: Option<String>,
    #[serde(flatten)]
    times: VisitTimes,
    #[serde(default)]
    device_id: Option<String>,
}

impl TryFrom<SessionWire> for AttendanceSession {
    type Error = Error;

    fn try_from(wire: SessionWire) -> Result<Self> {
        let id = first_present_id(wire.object_id, wire.id)
            .ok_or_else(|| Error::InvalidIdentifier("session record has no id".to_string()))?;
        Ok(Self {
            id: SessionId::new(id)?,
            purpose: wire.purpose,
            time_in: wire.times.time_in(),
            time_out: wire.times.time_out(),
            device_id: wire.device_id,
        })
    }
}

/// Visit timestamps under either naming the service uses.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VisitTimes {
    #[serde(default)]
    time_in: Option<DateTime<Utc>>,
    #[serde(default)]
    time_in_at: Option<DateTime<Utc>>,
    #[serde(default)]
    time_out: Option<DateTime<Utc>>,
    #[serde(default)]
    time_out_at: Option<DateTime<Utc>>,
}

impl VisitTimes {
    fn time_in(&self) -> Option<DateTime<Utc>> {
        self.time_in.or(self.time_in_at)
    }

    fn time_out(&self) -> Option<DateTime<Utc>> {
        self.time_out.or(self.time_out_at)
    }
}

impl AttendanceSession {
    /// Returns `true` while the visit has no time-out.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.time_out.is_none()
    }

    /// Length of a closed visit.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        match (self.time_in, self.time_out) {
            (Some(time_in), Some(time_out)) if time_out >= time_in => Some(time_out - time_in),
            _ => None,
        }
    }
}

/// Action the resolver asks the kiosk to take for a scanned student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanAction {
    #[serde(rename = "TIME_IN")]
    TimeIn,
    #[serde(rename = "TIME_OUT")]
    TimeOut,
    /// Any action this client does not know is treated as no action.
    #[serde(other)]
    None,
}

/// Result of resolving a canonical identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResolution {
    #[serde(default = "default_allowed")]
    pub allowed: bool,
    #[serde(default)]
    pub action: Option<ScanAction>,
    #[serde(default)]
    pub student: Option<Student>,
    #[serde(default)]
    pub active_session: Option<AttendanceSession>,
}

fn default_allowed() -> bool {
    true
}

impl ScanResolution {
    /// Requested action, `ScanAction::None` when absent.
    #[must_use]
    pub fn action(&self) -> ScanAction {
        self.action.unwrap_or(ScanAction::None)
    }
}

/// Whether a visit record represents an entry or an exit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisitKind {
    TimeIn,
    TimeOut,
}

impl fmt::Display for VisitKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VisitKind::TimeIn => write!(f, "IN"),
            VisitKind::TimeOut => write!(f, "OUT"),
        }
    }
}

/// A recent visit as reported by the polling endpoints.
///
/// Decoding never fails on the student: a missing, id-less or non-object
/// `student` makes the record anonymous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "VisitWire")]
pub struct VisitRecord {
    pub id: Option<String>,
    pub student: Option<Student>,
    pub purpose: Option<String>,
    pub time_in: Option<DateTime<Utc>>,
    pub time_out: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub device_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VisitWire {
    #[serde(default, rename = "_id")]
    object_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    student: Option<serde_json::Value>,
    #[serde(default)]
    purpose: Option<String>,
    #[serde(flatten)]
    times: VisitTimes,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    device_id: Option<String>,
}

impl From<VisitWire> for VisitRecord {
    fn from(wire: VisitWire) -> Self {
        let student = wire
            .student
            .and_then(|value| serde_json::from_value::<Student>(value).ok());
        Self {
            id: first_present_id(wire.object_id, wire.id),
            student,
            purpose: wire.purpose,
            time_in: wire.times.time_in(),
            time_out: wire.times.time_out(),
            status: wire.status,
            device_id: wire.device_id,
        }
    }
}

impl VisitRecord {
    /// Create an anonymous visit that started at `time_in`.
    pub fn new(time_in: DateTime<Utc>) -> Self {
        Self {
            id: None,
            student: None,
            purpose: None,
            time_in: Some(time_in),
            time_out: None,
            status: None,
            device_id: None,
        }
    }

    #[must_use]
    pub fn with_student(mut self, student: Student) -> Self {
        self.student = Some(student);
        self
    }

    #[must_use]
    pub fn with_time_out(mut self, time_out: DateTime<Utc>) -> Self {
        self.time_out = Some(time_out);
        self
    }

    #[must_use]
    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    /// Identity of the visiting student, `None` for unmatched scans.
    #[must_use]
    pub fn student_id(&self) -> Option<&StudentId> {
        self.student.as_ref().map(|s| &s.id)
    }

    #[must_use]
    pub fn kind(&self) -> VisitKind {
        if self.time_out.is_some() {
            VisitKind::TimeOut
        } else {
            VisitKind::TimeIn
        }
    }

    /// Most recent event of the visit: time-out if present, else time-in.
    #[must_use]
    pub fn latest_event(&self) -> Option<DateTime<Utc>> {
        self.time_out.or(self.time_in)
    }

    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        match (self.time_in, self.time_out) {
            (Some(time_in), Some(time_out)) if time_out >= time_in => Some(time_out - time_in),
            _ => None,
        }
    }

    /// Visitor name for display.
    #[must_use]
    pub fn visitor_name(&self) -> String {
        self.student
            .as_ref()
            .map(Student::display_name)
            .unwrap_or_else(|| "Unknown Visitor".to_string())
    }
}

/// One page of recent visits across all students.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentVisitsPage {
    #[serde(default)]
    pub visits: Vec<VisitRecord>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default = "default_page")]
    pub total_pages: u32,
    #[serde(default)]
    pub has_more: bool,
}

fn default_page() -> u32 {
    1
}
