//! crates/attendance_core/src/attendance.rs
//!
//! The attendance ledger: the at-most-once marking of hour-slots and the
//! per-student presence tallies derived from the stored day records.

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{AttendanceDay, HourEntry, StudentPresence};
use crate::error::{not_found_as, CoreError, CoreResult};
use crate::ports::{PortError, RecordStore};
use crate::stats::percentage;

/// Everything needed to mark one hour-slot.
#[derive(Debug, Clone)]
pub struct MarkRequest {
    pub class_id: String,
    pub date: NaiveDate,
    pub hour: String,
    pub subject: String,
    pub lecturer_id: Uuid,
    pub student_data: Vec<StudentPresence>,
}

/// One line of a student's attendance history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceLine {
    #[serde(rename = "classID")]
    pub class_id: String,
    pub date: NaiveDate,
    pub day: String,
    pub hour: String,
    pub subject: String,
    #[serde(rename = "isPresent")]
    pub is_present: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallAttendance {
    #[serde(rename = "totalHours")]
    pub total_hours: usize,
    #[serde(rename = "attendedHours")]
    pub attended_hours: usize,
    #[serde(rename = "attendancePercentage")]
    pub attendance_percentage: f64,
    #[serde(rename = "attendanceRecords")]
    pub attendance_records: Vec<AttendanceLine>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SubjectAttendance {
    #[serde(rename = "totalClasses")]
    pub total_classes: usize,
    #[serde(rename = "attendedClasses")]
    pub attended_classes: usize,
    #[serde(rename = "attendancePercentage")]
    pub attendance_percentage: f64,
}

/// Counts the hours a student appears in, and attended, among the entries
/// accepted by `filter`.
pub fn tally_presence<F>(days: &[AttendanceDay], rollnumber: &str, filter: F) -> SubjectAttendance
where
    F: Fn(&HourEntry) -> bool,
{
    let (total, attended) = days
        .iter()
        .flat_map(|day| day.hour_wise_attendance.iter())
        .filter(|entry| filter(*entry))
        .filter_map(|entry| entry.presence_of(rollnumber))
        .fold((0usize, 0usize), |(total, attended), present| {
            (total + 1, attended + usize::from(present))
        });

    SubjectAttendance {
        total_classes: total,
        attended_classes: attended,
        attendance_percentage: percentage(attended as f64, total as f64),
    }
}

#[derive(Clone)]
pub struct AttendanceLedger {
    store: Arc<dyn RecordStore>,
}

impl AttendanceLedger {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Whether (class, date, hour) already holds a marked entry.
    pub async fn check_marked(&self, class_id: &str, date: NaiveDate, hour: &str) -> CoreResult<bool> {
        Ok(self
            .store
            .find_attendance_day(class_id, date)
            .await?
            .is_some_and(|day| day.is_marked(hour)))
    }

    /// Marks one hour-slot, creating the day record on first use.
    ///
    /// Fails with `AlreadyMarked` without writing anything if the hour is
    /// already marked, including when a concurrent caller marks it first.
    pub async fn mark_attendance(&self, request: MarkRequest) -> CoreResult<AttendanceDay> {
        if request.hour.trim().is_empty() {
            return Err(CoreError::InvalidInput("hour must not be empty".to_string()));
        }
        self.store
            .get_class(&request.class_id)
            .await
            .map_err(|e| not_found_as(e, CoreError::ClassNotFound(request.class_id.clone())))?;

        let entry = HourEntry {
            hour: request.hour.clone(),
            updated: true,
            subject: request.subject.clone(),
            lecturer_id: request.lecturer_id,
            student_data: request.student_data,
        };

        match self
            .store
            .append_attendance_hour(&request.class_id, request.date, &entry)
            .await
        {
            Ok(day) => {
                info!(
                    "Marked attendance for {} on {} hour {} ({} students)",
                    request.class_id,
                    request.date,
                    request.hour,
                    entry.student_data.len()
                );
                Ok(day)
            }
            Err(PortError::Conflict(reason)) => {
                warn!(
                    "Rejected attendance for {} on {} hour {}: {}",
                    request.class_id, request.date, request.hour, reason
                );
                Err(CoreError::AlreadyMarked {
                    class_id: request.class_id,
                    date: request.date,
                    hour: request.hour,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Day records the student appears in, ordered by date.
    pub async fn student_days(&self, rollnumber: &str) -> CoreResult<Vec<AttendanceDay>> {
        Ok(self.store.list_attendance_for_student(rollnumber).await?)
    }

    /// Hour entries of a class taught by `lecturer_id` for `subject`.
    pub async fn class_hours(
        &self,
        class_id: &str,
        lecturer_id: Uuid,
        subject: &str,
    ) -> CoreResult<Vec<HourEntry>> {
        let days = self.store.list_attendance_for_class(class_id).await?;
        Ok(days
            .into_iter()
            .flat_map(|day| day.hour_wise_attendance)
            .filter(|entry| entry.lecturer_id == lecturer_id && entry.subject == subject)
            .collect())
    }

    /// Attendance across every marked hour the student appears in.
    pub async fn student_overall_attendance(&self, rollnumber: &str) -> CoreResult<OverallAttendance> {
        let days = self.student_days(rollnumber).await?;

        let attendance_records: Vec<AttendanceLine> = days
            .iter()
            .flat_map(|day| {
                day.hour_wise_attendance.iter().filter_map(move |entry| {
                    entry.presence_of(rollnumber).map(|is_present| AttendanceLine {
                        class_id: day.class_id.clone(),
                        date: day.date,
                        day: day.day.clone(),
                        hour: entry.hour.clone(),
                        subject: entry.subject.clone(),
                        is_present,
                    })
                })
            })
            .collect();

        let total_hours = attendance_records.len();
        let attended_hours = attendance_records.iter().filter(|l| l.is_present).count();

        Ok(OverallAttendance {
            total_hours,
            attended_hours,
            attendance_percentage: percentage(attended_hours as f64, total_hours as f64),
            attendance_records,
        })
    }

    /// Attendance for one subject of the student's class.
    ///
    /// Only subjects with a subject assignment are reported; others fail with
    /// `AssignmentNotFound`.
    pub async fn student_subject_attendance(
        &self,
        rollnumber: &str,
        subject: &str,
    ) -> CoreResult<SubjectAttendance> {
        let student = self
            .store
            .get_student(rollnumber)
            .await
            .map_err(|e| not_found_as(e, CoreError::StudentNotFound(rollnumber.to_string())))?;

        if self
            .store
            .find_assignment_by_subject(&student.class_id, subject)
            .await?
            .is_none()
        {
            return Err(CoreError::AssignmentNotFound(format!(
                "{}/{}",
                student.class_id, subject
            )));
        }

        let days = self.student_days(rollnumber).await?;
        Ok(tally_presence(&days, rollnumber, |entry| entry.subject == subject))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::memory::MemoryStore;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    fn request(hour: &str, lecturer_id: Uuid, present: &[(&str, bool)]) -> MarkRequest {
        MarkRequest {
            class_id: "CS101".to_string(),
            date: date(),
            hour: hour.to_string(),
            subject: "Math".to_string(),
            lecturer_id,
            student_data: fixtures::presence(present),
        }
    }

    #[tokio::test]
    async fn second_mark_of_same_hour_is_rejected_without_mutation() {
        let store = Arc::new(MemoryStore::new());
        fixtures::seed_class(&store, "CS101", &["Math", "Phy"]).await;
        let ledger = AttendanceLedger::new(store.clone());
        let lecturer = Uuid::new_v4();

        assert!(!ledger.check_marked("CS101", date(), "1").await.unwrap());
        ledger
            .mark_attendance(request("1", lecturer, &[("1", true), ("2", false)]))
            .await
            .unwrap();
        assert!(ledger.check_marked("CS101", date(), "1").await.unwrap());

        let err = ledger
            .mark_attendance(request("1", lecturer, &[("1", false), ("2", false)]))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AlreadyMarked { .. }));

        let day = store.find_attendance_day("CS101", date()).await.unwrap().unwrap();
        assert_eq!(day.hour_wise_attendance.len(), 1);
        assert_eq!(day.total_hours, 1);
        assert_eq!(day.hour_wise_attendance[0].presentees(), 1);
    }

    #[tokio::test]
    async fn total_hours_tracks_entries_across_marks() {
        let store = Arc::new(MemoryStore::new());
        fixtures::seed_class(&store, "CS101", &["Math"]).await;
        let ledger = AttendanceLedger::new(store.clone());
        let lecturer = Uuid::new_v4();

        for hour in ["1", "2", "4"] {
            let day = ledger
                .mark_attendance(request(hour, lecturer, &[("1", true)]))
                .await
                .unwrap();
            assert_eq!(day.total_hours, day.hour_wise_attendance.len());
        }
        let day = store.find_attendance_day("CS101", date()).await.unwrap().unwrap();
        assert_eq!(day.total_hours, 3);
        assert_eq!(day.day, "Wednesday");
    }

    #[tokio::test]
    async fn concurrent_marks_of_one_hour_store_a_single_entry() {
        let store = Arc::new(MemoryStore::new());
        fixtures::seed_class(&store, "CS101", &["Math"]).await;
        let ledger = AttendanceLedger::new(store.clone());
        let lecturer = Uuid::new_v4();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.mark_attendance(request("3", lecturer, &[("1", true)])).await
            }));
        }
        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(CoreError::AlreadyMarked { .. }) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(succeeded, 1);
        let day = store.find_attendance_day("CS101", date()).await.unwrap().unwrap();
        assert_eq!(day.hour_wise_attendance.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_marks_of_different_hours_all_succeed() {
        let store = Arc::new(MemoryStore::new());
        fixtures::seed_class(&store, "CS101", &["Math"]).await;
        let ledger = AttendanceLedger::new(store.clone());
        let lecturer = Uuid::new_v4();
        let barrier = Arc::new(tokio::sync::Barrier::new(64));

        let mut handles = Vec::new();
        for hour in 1..=64 {
            let ledger = ledger.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                ledger
                    .mark_attendance(request(&hour.to_string(), lecturer, &[("1", true)]))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let day = store.find_attendance_day("CS101", date()).await.unwrap().unwrap();
        assert_eq!(day.hour_wise_attendance.len(), 64);
        assert_eq!(day.total_hours, 64);
        for hour in 1..=64 {
            assert!(day.is_marked(&hour.to_string()));
        }
    }

    #[tokio::test]
    async fn marking_an_unknown_class_fails() {
        let ledger = AttendanceLedger::new(Arc::new(MemoryStore::new()));
        let err = ledger
            .mark_attendance(request("1", Uuid::new_v4(), &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ClassNotFound(_)));
    }

    #[tokio::test]
    async fn student_without_hours_reports_zero_percent() {
        let ledger = AttendanceLedger::new(Arc::new(MemoryStore::new()));
        let overall = ledger.student_overall_attendance("404").await.unwrap();
        assert_eq!(overall.total_hours, 0);
        assert_eq!(overall.attended_hours, 0);
        assert_eq!(overall.attendance_percentage, 0.0);
        assert!(overall.attendance_records.is_empty());
    }

    #[tokio::test]
    async fn overall_and_subject_attendance_count_presence() {
        let store = Arc::new(MemoryStore::new());
        fixtures::seed_class(&store, "CS101", &["Math", "Phy"]).await;
        let lecturer = fixtures::seed_lecturer(&store, "meera", &["CS101"]).await;
        fixtures::seed_student(&store, "1", "CS101").await;
        fixtures::assign(&store, "CS101", "Math", &lecturer).await;
        let ledger = AttendanceLedger::new(store.clone());

        let id = lecturer.lecturer_id;
        ledger.mark_attendance(request("1", id, &[("1", true)])).await.unwrap();
        ledger.mark_attendance(request("2", id, &[("1", false)])).await.unwrap();
        ledger
            .mark_attendance(MarkRequest {
                subject: "Phy".to_string(),
                ..request("3", id, &[("1", true)])
            })
            .await
            .unwrap();

        let overall = ledger.student_overall_attendance("1").await.unwrap();
        assert_eq!((overall.total_hours, overall.attended_hours), (3, 2));
        assert_eq!(overall.attendance_percentage, 66.67);

        let math = ledger.student_subject_attendance("1", "Math").await.unwrap();
        assert_eq!((math.total_classes, math.attended_classes), (2, 1));
        assert_eq!(math.attendance_percentage, 50.0);

        // Phy has hours but nobody is assigned to teach it.
        let err = ledger.student_subject_attendance("1", "Phy").await.unwrap_err();
        assert!(matches!(err, CoreError::AssignmentNotFound(_)));
    }
}
