//! Deduplication and ordering of polled visit records.
//!
//! The recent-visits endpoint reports every entry and exit event, so an
//! active student can appear several times in one snapshot. The live feed
//! shows each identified student once, at their most recent event.
//!
//! # Examples
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use kiosk_core::{Student, StudentId, VisitRecord};
//! use kiosk_feed::dedupe;
//!
//! let at = |h| Utc.with_ymd_and_hms(2025, 1, 10, h, 0, 0).unwrap();
//! let ana = Student::new(StudentId::new("s1").unwrap(), "Ana", "Reyes");
//!
//! let feed = dedupe(vec![
//!     VisitRecord::new(at(10)).with_student(ana.clone()),
//!     VisitRecord::new(at(9)).with_student(ana),
//!     VisitRecord::new(at(8)),
//! ]);
//! assert_eq!(feed.len(), 2);
//! ```

use std::cmp::Reverse;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use kiosk_core::time::{format_clock, format_duration};
use kiosk_core::{RecentVisitsPage, StudentId, VisitKind, VisitRecord};
use serde::Serialize;

/// Keep the first record of each identified student, in input order.
///
/// Records without a student identity are always kept. The input is
/// expected newest-first, so the record kept is the student's latest.
pub fn dedupe(records: Vec<VisitRecord>) -> Vec<VisitRecord> {
    let mut seen: HashSet<StudentId> = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| match record.student_id() {
            Some(id) => seen.insert(id.clone()),
            None => true,
        })
        .collect()
}

/// Sort newest-first by latest event: time-out if present, else time-in.
///
/// The sort is stable. Records with neither timestamp sort last.
pub fn sort_by_latest_event(records: &mut [VisitRecord]) {
    records.sort_by_key(|record| Reverse(record.latest_event()));
}

/// One deduplicated live feed snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveFeed {
    pub entries: Vec<VisitRecord>,
    /// Total visits reported by the service, when provided.
    pub total: Option<u64>,
    pub refreshed_at: DateTime<Utc>,
}

impl LiveFeed {
    /// Build a snapshot from a polled page: order by latest event, then
    /// dedupe.
    pub fn from_page(page: RecentVisitsPage, refreshed_at: DateTime<Utc>) -> Self {
        let mut visits = page.visits;
        sort_by_latest_event(&mut visits);
        Self {
            entries: dedupe(visits),
            total: page.total,
            refreshed_at,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose latest event is an entry (still inside).
    pub fn time_ins(&self) -> impl Iterator<Item = &VisitRecord> {
        self.entries
            .iter()
            .filter(|record| record.kind() == VisitKind::TimeIn)
    }

    /// Entries whose latest event is an exit.
    pub fn time_outs(&self) -> impl Iterator<Item = &VisitRecord> {
        self.entries
            .iter()
            .filter(|record| record.kind() == VisitKind::TimeOut)
    }

    /// One display line per entry.
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(format_entry).collect()
    }
}

/// Format a feed entry: `HH:MM  IN   Reyes, Ana  Research`, with the visit
/// duration appended for exits.
pub fn format_entry(record: &VisitRecord) -> String {
    let at = record
        .latest_event()
        .map(format_clock)
        .unwrap_or_else(|| "--:--".to_string());
    let kind = record.kind().to_string();
    let mut line = format!("{at}  {kind:<4} {}", record.visitor_name());
    if let Some(purpose) = record.purpose.as_deref().filter(|p| !p.trim().is_empty()) {
        line.push_str("  ");
        line.push_str(purpose.trim());
    }
    if let Some(duration) = record.duration() {
        line.push_str(&format!("  ({})", format_duration(duration)));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use kiosk_core::Student;
    use rstest::rstest;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, 8, minute, 0).unwrap()
    }

    fn visit(student: Option<&str>, minute: u32) -> VisitRecord {
        let record = VisitRecord::new(at(minute));
        match student {
            Some(id) => record.with_student(Student::new(StudentId::new(id).unwrap(), "F", "L")),
            None => record,
        }
    }

    fn shape(records: &[VisitRecord]) -> Vec<(Option<&str>, u32)> {
        use chrono::Timelike;
        records
            .iter()
            .map(|r| {
                (
                    r.student_id().map(StudentId::as_str),
                    r.time_in.unwrap().minute(),
                )
            })
            .collect()
    }

    #[test]
    fn test_dedupe_keeps_first_identified_and_all_anonymous() {
        let records = vec![
            visit(Some("123"), 10),
            visit(Some("123"), 5),
            visit(None, 8),
            visit(None, 3),
        ];
        let kept = dedupe(records);
        assert_eq!(
            shape(&kept),
            vec![(Some("123"), 10), (None, 8), (None, 3)]
        );
    }

    #[rstest]
    #[case(vec![], vec![])]
    #[case(vec![(None, 1), (None, 1)], vec![(None, 1), (None, 1)])]
    #[case(
        vec![(Some("a"), 9), (Some("b"), 8), (Some("a"), 7), (Some("b"), 6)],
        vec![(Some("a"), 9), (Some("b"), 8)]
    )]
    #[case(
        vec![(None, 9), (Some("a"), 8), (None, 7), (Some("a"), 6)],
        vec![(None, 9), (Some("a"), 8), (None, 7)]
    )]
    fn test_dedupe_cases(
        #[case] input: Vec<(Option<&str>, u32)>,
        #[case] expected: Vec<(Option<&str>, u32)>,
    ) {
        let records = input.into_iter().map(|(s, m)| visit(s, m)).collect();
        assert_eq!(shape(&dedupe(records)), expected);
    }

    #[test]
    fn test_dedupe_is_idempotent() {
        let records = vec![visit(Some("a"), 3), visit(Some("a"), 2), visit(None, 1)];
        let once = dedupe(records);
        let twice = dedupe(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_sort_prefers_time_out() {
        let mut records = vec![
            visit(Some("early"), 1).with_time_out(at(50)),
            visit(Some("late"), 30),
            VisitRecord {
                time_in: None,
                ..visit(Some("none"), 0)
            },
        ];
        sort_by_latest_event(&mut records);
        let order: Vec<&str> = records
            .iter()
            .map(|r| r.student_id().unwrap().as_str())
            .collect();
        assert_eq!(order, vec!["early", "late", "none"]);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let mut records = vec![visit(Some("first"), 5), visit(Some("second"), 5)];
        sort_by_latest_event(&mut records);
        assert_eq!(records[0].student_id().unwrap().as_str(), "first");
    }

    #[test]
    fn test_live_feed_from_page_sorts_then_dedupes() {
        // Service order is by time-in; the exit at 8:40 is the latest event.
        let page = RecentVisitsPage {
            visits: vec![
                visit(Some("a"), 30),
                visit(Some("a"), 10).with_time_out(at(40)),
                visit(None, 20),
            ],
            page: 1,
            limit: 12,
            total: Some(3),
            total_pages: 1,
            has_more: false,
        };
        let feed = LiveFeed::from_page(page, at(45));

        assert_eq!(feed.len(), 2);
        assert_eq!(feed.total, Some(3));
        assert_eq!(feed.entries[0].time_out, Some(at(40)));
        assert_eq!(feed.time_outs().count(), 1);
        assert_eq!(feed.time_ins().count(), 1);
    }

    #[test]
    fn test_live_feed_keeps_records_without_student_identity() {
        let json = r#"{
            "visits": [
                {"_id": "v1", "student": {"_id": "abc", "id": "abc", "firstName": "Ana", "lastName": "Reyes"},
                 "timeInAt": "2025-01-10T08:30:00Z"},
                {"_id": "v2", "student": {"firstName": "Walk", "lastName": "In"}, "timeInAt": "2025-01-10T08:20:00Z"},
                {"_id": "v3", "student": "65a1b2c3", "timeInAt": "2025-01-10T08:15:00Z"},
                {"_id": "v4", "student": {"id": "abc"}, "timeInAt": "2025-01-10T08:10:00Z"}
            ],
            "total": 4
        }"#;
        let page: RecentVisitsPage = serde_json::from_str(json).unwrap();
        let feed = LiveFeed::from_page(page, at(45));

        let ids: Vec<_> = feed.entries.iter().map(|r| r.id.as_deref().unwrap()).collect();
        assert_eq!(ids, vec!["v1", "v2", "v3"]);
        assert_eq!(feed.entries[1].visitor_name(), "Unknown Visitor");
    }

    #[test]
    fn test_format_entry() {
        let record = visit(Some("a"), 0)
            .with_time_out(at(45))
            .with_purpose("Research");
        let line = format_entry(&record);
        assert!(line.contains("OUT  L, F  Research  (45m 0s)"), "{line}");

        let anonymous = format_entry(&visit(None, 5));
        assert!(anonymous.contains("IN   Unknown Visitor"), "{anonymous}");
    }
}
