//! The attendance service contract.
//!
//! Methods return `Send` futures declared with RPITIT so that callers can
//! box them and drive them from a `select!` loop without `async_trait`.

use std::future::Future;

use kiosk_core::{
    AttendanceSession, CanonicalIdentifier, Purpose, RecentVisitsPage, Result, ScanResolution,
    SessionId, StudentId, VisitRecord,
};

/// Operations offered by the remote attendance service.
///
/// Arguments are taken by value so that returned futures do not borrow
/// from the caller.
pub trait AttendanceApi: Send + Sync {
    /// Resolve a canonical identifier to a student and the action to take.
    fn resolve_scan(
        &self,
        identifier: CanonicalIdentifier,
    ) -> impl Future<Output = Result<ScanResolution>> + Send;

    /// Open a new visit for the student.
    fn check_in(
        &self,
        student_id: StudentId,
        purpose: Purpose,
        device_id: String,
    ) -> impl Future<Output = Result<AttendanceSession>> + Send;

    /// Close the student's open visit.
    fn check_out(
        &self,
        student_id: StudentId,
        session_id: SessionId,
    ) -> impl Future<Output = Result<AttendanceSession>> + Send;

    /// Past visits of one student, most recent first, at most `limit`.
    fn visit_history(
        &self,
        student_id: StudentId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<VisitRecord>>> + Send;

    /// One page of recent visits across all students.
    fn recent_visits(
        &self,
        page: u32,
        limit: u32,
    ) -> impl Future<Output = Result<RecentVisitsPage>> + Send;
}
