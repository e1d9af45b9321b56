//! crates/attendance_core/src/insights.rs
//!
//! Read-only dashboard views joining the attendance ledger, the marks ledger
//! and the subject assignment resolver:
//!
//! - per lecturer, one summary for each class they teach,
//! - per (class, lecturer), a per-student breakdown,
//! - per student, attendance for each assigned subject of their class.
//!
//! The views read several records without isolation; they are best-effort
//! snapshots.

use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::assignments::SubjectAssignmentResolver;
use crate::attendance::{tally_presence, AttendanceLedger, SubjectAttendance};
use crate::domain::{HourEntry, SubjectMarks};
use crate::error::{not_found_as, CoreError, CoreResult};
use crate::marks::MarksLedger;
use crate::ports::RecordStore;
use crate::stats::{percentage, ratio, round2, BelowThreshold, BelowThresholdShare};

//=========================================================================================
// View Types
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LecturerInsight {
    #[serde(rename = "classID")]
    pub class_id: String,
    pub subject: String,
    pub student_count: usize,
    pub total_hours: usize,
    pub total_presentees: usize,
    pub avg_presentees: f64,
    pub presentee_percentage: f64,
    pub below_threshold: BelowThreshold,
    pub below_threshold_percentage: BelowThresholdShare,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    #[serde(rename = "classID")]
    pub class_id: String,
    pub branch: String,
    pub semester: u32,
    pub subject: String,
    pub lecturer_name: String,
    pub total_hours: usize,
    pub student_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentInsight {
    #[serde(rename = "student_id")]
    pub student_id: Uuid,
    pub rollnumber: String,
    pub name: String,
    pub attended_hours: usize,
    pub attendance_percentage: f64,
    pub marks: SubjectMarks,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInsight {
    pub class_info: ClassInfo,
    pub student_data: Vec<StudentInsight>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentSubjectInsight {
    pub subject: String,
    /// Lecturer name as snapshotted on the assignment.
    pub lecturer: String,
    #[serde(flatten)]
    pub attendance: SubjectAttendance,
}

//=========================================================================================
// Aggregator
//=========================================================================================

#[derive(Clone)]
pub struct InsightAggregator {
    store: Arc<dyn RecordStore>,
    attendance: AttendanceLedger,
    marks: MarksLedger,
    resolver: SubjectAssignmentResolver,
}

impl InsightAggregator {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            attendance: AttendanceLedger::new(store.clone()),
            marks: MarksLedger::new(store.clone()),
            resolver: SubjectAssignmentResolver::new(store.clone()),
            store,
        }
    }

    /// One summary per class the lecturer teaches and holds an assignment in.
    pub async fn lecturer_insights(&self, lecturer_id: Uuid) -> CoreResult<Vec<LecturerInsight>> {
        let lecturer = self
            .store
            .get_lecturer(lecturer_id)
            .await
            .map_err(|e| not_found_as(e, CoreError::LecturerNotFound(lecturer_id.to_string())))?;

        let mut insights = Vec::with_capacity(lecturer.classes_taught.len());
        for class_id in &lecturer.classes_taught {
            let Some(assignment) = self.resolver.resolve_lecturer(class_id, lecturer_id).await?
            else {
                debug!("Lecturer {} has no subject in {}", lecturer_id, class_id);
                continue;
            };

            let entries = self
                .attendance
                .class_hours(class_id, lecturer_id, &assignment.subject)
                .await?;
            let marks: Vec<SubjectMarks> = self
                .marks
                .subject_marks(class_id, &assignment.subject)
                .await?
                .into_iter()
                .map(|row| row.marks)
                .collect();

            let student_count = marks.len();
            let total_hours = entries.len();
            let total_presentees: usize = entries.iter().map(HourEntry::presentees).sum();
            let below_threshold = BelowThreshold::count(&marks);

            insights.push(LecturerInsight {
                class_id: class_id.clone(),
                subject: assignment.subject,
                student_count,
                total_hours,
                total_presentees,
                avg_presentees: round2(ratio(total_presentees as f64, total_hours as f64)),
                presentee_percentage: percentage(
                    total_presentees as f64,
                    (total_hours * student_count) as f64,
                ),
                below_threshold,
                below_threshold_percentage: below_threshold.share_of(student_count),
            });
        }
        Ok(insights)
    }

    /// Per-student attendance and marks for the subject the lecturer teaches
    /// in the class, sorted by roll number.
    pub async fn class_insight(&self, class_id: &str, lecturer_id: Uuid) -> CoreResult<ClassInsight> {
        let class = self
            .store
            .get_class(class_id)
            .await
            .map_err(|e| not_found_as(e, CoreError::ClassNotFound(class_id.to_string())))?;
        let assignment = self
            .resolver
            .resolve_lecturer(class_id, lecturer_id)
            .await?
            .ok_or_else(|| CoreError::AssignmentNotFound(format!("{}/{}", class_id, lecturer_id)))?;

        let entries = self
            .attendance
            .class_hours(class_id, lecturer_id, &assignment.subject)
            .await?;
        let total_hours = entries.len();

        let mut student_data: Vec<StudentInsight> = self
            .marks
            .subject_marks(class_id, &assignment.subject)
            .await?
            .into_iter()
            .map(|row| {
                let attended_hours = entries
                    .iter()
                    .filter(|entry| entry.presence_of(&row.rollnumber) == Some(true))
                    .count();
                StudentInsight {
                    student_id: row.student_id,
                    attendance_percentage: percentage(attended_hours as f64, total_hours as f64),
                    attended_hours,
                    rollnumber: row.rollnumber,
                    name: row.name,
                    marks: row.marks,
                }
            })
            .collect();
        student_data.sort_by(|a, b| a.rollnumber.cmp(&b.rollnumber));

        Ok(ClassInsight {
            class_info: ClassInfo {
                class_id: class.class_id,
                branch: class.branch,
                semester: class.semester,
                subject: assignment.subject,
                lecturer_name: assignment.lecturer_name,
                total_hours,
                student_count: student_data.len(),
            },
            student_data,
        })
    }

    /// Attendance per assigned subject of the student's class, in the
    /// class's subject order. Unassigned subjects are left out.
    pub async fn student_subject_insights(&self, rollnumber: &str) -> CoreResult<Vec<StudentSubjectInsight>> {
        let student = self
            .store
            .get_student(rollnumber)
            .await
            .map_err(|e| not_found_as(e, CoreError::StudentNotFound(rollnumber.to_string())))?;
        let class = self
            .store
            .get_class(&student.class_id)
            .await
            .map_err(|e| not_found_as(e, CoreError::ClassNotFound(student.class_id.clone())))?;
        let days = self.attendance.student_days(rollnumber).await?;

        let mut insights = Vec::with_capacity(class.subjects.len());
        for subject in &class.subjects {
            let Some(assignment) = self.resolver.resolve_subject(&class.class_id, subject).await?
            else {
                continue;
            };
            insights.push(StudentSubjectInsight {
                subject: subject.clone(),
                lecturer: assignment.lecturer_name,
                attendance: tally_presence(&days, rollnumber, |entry| entry.subject == *subject),
            });
        }
        Ok(insights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::MarkRequest;
    use crate::domain::Lecturer;
    use crate::fixtures;
    use crate::memory::MemoryStore;
    use chrono::NaiveDate;

    struct Setup {
        store: Arc<MemoryStore>,
        lecturer: Lecturer,
    }

    /// CS101 (Math, Phy) with students 1..=3; Math is taught by "meera".
    async fn setup() -> Setup {
        let store = Arc::new(MemoryStore::new());
        fixtures::seed_class(&store, "CS101", &["Math", "Phy"]).await;
        for roll in ["3", "1", "2"] {
            fixtures::seed_student(&store, roll, "CS101").await;
        }
        let lecturer = fixtures::seed_lecturer(&store, "meera", &["CS101", "EE200"]).await;
        fixtures::assign(&store, "CS101", "Math", &lecturer).await;
        Setup { store, lecturer }
    }

    async fn mark(setup: &Setup, hour: &str, present: &[(&str, bool)]) {
        AttendanceLedger::new(setup.store.clone())
            .mark_attendance(MarkRequest {
                class_id: "CS101".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                hour: hour.to_string(),
                subject: "Math".to_string(),
                lecturer_id: setup.lecturer.lecturer_id,
                student_data: fixtures::presence(present),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn lecturer_insight_counts_presentees_for_a_marked_hour() {
        let setup = setup().await;
        mark(&setup, "1", &[("1", true), ("2", true), ("3", false)]).await;

        let aggregator = InsightAggregator::new(setup.store.clone());
        let insights = aggregator
            .lecturer_insights(setup.lecturer.lecturer_id)
            .await
            .unwrap();

        // EE200 has no assignment for this lecturer and is skipped.
        assert_eq!(insights.len(), 1);
        let cs101 = &insights[0];
        assert_eq!(cs101.subject, "Math");
        assert_eq!(cs101.total_hours, 1);
        assert_eq!(cs101.total_presentees, 2);
        assert_eq!(cs101.student_count, 3);
        assert_eq!(cs101.avg_presentees, 2.0);
        assert_eq!(cs101.presentee_percentage, 66.67);
        // Nobody has marks yet, so everyone is below threshold.
        assert_eq!(cs101.below_threshold.cie1, 3);
        assert_eq!(cs101.below_threshold_percentage.overall, 100.0);
    }

    #[tokio::test]
    async fn lecturer_insight_without_hours_reports_zero_ratios() {
        let setup = setup().await;
        let insights = InsightAggregator::new(setup.store.clone())
            .lecturer_insights(setup.lecturer.lecturer_id)
            .await
            .unwrap();

        let cs101 = &insights[0];
        assert_eq!(cs101.total_hours, 0);
        assert_eq!(cs101.avg_presentees, 0.0);
        assert_eq!(cs101.presentee_percentage, 0.0);
    }

    #[tokio::test]
    async fn unknown_lecturer_is_not_found() {
        let setup = setup().await;
        let err = InsightAggregator::new(setup.store.clone())
            .lecturer_insights(Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::LecturerNotFound(_)));
    }

    #[tokio::test]
    async fn class_insight_lists_students_by_roll_number_with_marks() {
        let setup = setup().await;
        mark(&setup, "1", &[("1", true), ("2", false), ("3", true)]).await;
        mark(&setup, "2", &[("1", true), ("2", false), ("3", false)]).await;
        let student_two = setup.store.get_student("2").await.unwrap();
        fixtures::give_marks(
            &setup.store,
            &student_two,
            SubjectMarks {
                subject: "Math".to_string(),
                cie1: 41.0,
                cie2: 38.0,
                assignment: 9.0,
            },
        )
        .await;

        let insight = InsightAggregator::new(setup.store.clone())
            .class_insight("CS101", setup.lecturer.lecturer_id)
            .await
            .unwrap();

        assert_eq!(insight.class_info.total_hours, 2);
        assert_eq!(insight.class_info.lecturer_name, setup.lecturer.name);
        let rolls: Vec<_> = insight.student_data.iter().map(|s| s.rollnumber.as_str()).collect();
        assert_eq!(rolls, ["1", "2", "3"]);

        let attended: Vec<_> = insight.student_data.iter().map(|s| s.attended_hours).collect();
        assert_eq!(attended, [2, 0, 1]);
        assert_eq!(insight.student_data[2].attendance_percentage, 50.0);
        assert_eq!(insight.student_data[1].marks.cie1, 41.0);
        assert_eq!(insight.student_data[0].marks, SubjectMarks::zeroed("Math"));
    }

    #[tokio::test]
    async fn class_insight_requires_an_assignment() {
        let setup = setup().await;
        let other = fixtures::seed_lecturer(&setup.store, "ravi", &["CS101"]).await;
        let err = InsightAggregator::new(setup.store.clone())
            .class_insight("CS101", other.lecturer_id)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AssignmentNotFound(_)));
    }

    #[tokio::test]
    async fn student_insights_cover_assigned_subjects_only() {
        let setup = setup().await;
        mark(&setup, "1", &[("1", true), ("2", true), ("3", true)]).await;
        mark(&setup, "2", &[("1", false), ("2", true), ("3", true)]).await;

        let insights = InsightAggregator::new(setup.store.clone())
            .student_subject_insights("1")
            .await
            .unwrap();

        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].subject, "Math");
        assert_eq!(insights[0].lecturer, setup.lecturer.name);
        assert_eq!(insights[0].attendance.total_classes, 2);
        assert_eq!(insights[0].attendance.attended_classes, 1);
        assert_eq!(insights[0].attendance.attendance_percentage, 50.0);

        let json = serde_json::to_value(&insights[0]).unwrap();
        assert_eq!(json["totalClasses"], 2);
        assert_eq!(json["lecturer"], setup.lecturer.name.as_str());
    }
}
