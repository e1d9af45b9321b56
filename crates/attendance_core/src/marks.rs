//! crates/attendance_core/src/marks.rs
//!
//! The marks ledger: one CIE1/CIE2/Assignment entry per (student, subject).

use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::{MarksRecord, SubjectMarks};
use crate::error::{not_found_as, CoreError, CoreResult};
use crate::ports::RecordStore;

/// A student of a class together with their marks for one subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentMarks {
    pub student_id: Uuid,
    pub rollnumber: String,
    pub name: String,
    pub marks: SubjectMarks,
}

#[derive(Clone)]
pub struct MarksLedger {
    store: Arc<dyn RecordStore>,
}

impl MarksLedger {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Marks of every student of the class for `subject`, in roll number order.
    ///
    /// A student without a marks record, or without an entry for the subject,
    /// gets an all-zero entry.
    pub async fn subject_marks(&self, class_id: &str, subject: &str) -> CoreResult<Vec<StudentMarks>> {
        let students = self.store.list_students_in_class(class_id).await?;

        let mut rows = Vec::with_capacity(students.len());
        for student in students {
            let marks = self
                .store
                .find_marks(student.student_id)
                .await?
                .and_then(|record| record.for_subject(subject).cloned())
                .unwrap_or_else(|| SubjectMarks::zeroed(subject));
            rows.push(StudentMarks {
                student_id: student.student_id,
                rollnumber: student.rollnumber,
                name: student.name,
                marks,
            });
        }
        Ok(rows)
    }

    /// Creates or replaces the student's entry for `entry.subject`.
    pub async fn upsert_marks(&self, student_id: Uuid, entry: SubjectMarks) -> CoreResult<MarksRecord> {
        if entry.subject.trim().is_empty() {
            return Err(CoreError::InvalidInput("subject must not be empty".to_string()));
        }
        for (component, score) in [
            ("CIE1", entry.cie1),
            ("CIE2", entry.cie2),
            ("Assignment", entry.assignment),
        ] {
            if !score.is_finite() || score < 0.0 {
                return Err(CoreError::InvalidInput(format!(
                    "{} must be a non-negative number",
                    component
                )));
            }
        }

        self.store
            .get_student_by_id(student_id)
            .await
            .map_err(|e| not_found_as(e, CoreError::StudentNotFound(student_id.to_string())))?;

        let record = self.store.upsert_subject_marks(student_id, &entry).await?;
        info!("Updated {} marks for student {}", entry.subject, student_id);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::memory::MemoryStore;

    fn marks(subject: &str, cie1: f64, cie2: f64, assignment: f64) -> SubjectMarks {
        SubjectMarks {
            subject: subject.to_string(),
            cie1,
            cie2,
            assignment,
        }
    }

    #[tokio::test]
    async fn missing_marks_read_as_zero() {
        let store = Arc::new(MemoryStore::new());
        fixtures::seed_class(&store, "CS101", &["Math"]).await;
        let student = fixtures::seed_student(&store, "1", "CS101").await;
        let ledger = MarksLedger::new(store.clone());

        let rows = ledger.subject_marks("CS101", "Math").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].student_id, student.student_id);
        assert_eq!(rows[0].marks, SubjectMarks::zeroed("Math"));
    }

    #[tokio::test]
    async fn repeated_upserts_keep_one_entry_with_latest_values() {
        let store = Arc::new(MemoryStore::new());
        fixtures::seed_class(&store, "CS101", &["Math", "Phy"]).await;
        let student = fixtures::seed_student(&store, "1", "CS101").await;
        let ledger = MarksLedger::new(store.clone());

        ledger
            .upsert_marks(student.student_id, marks("Math", 10.0, 12.0, 5.0))
            .await
            .unwrap();
        ledger
            .upsert_marks(student.student_id, marks("Phy", 30.0, 31.0, 7.0))
            .await
            .unwrap();
        let record = ledger
            .upsert_marks(student.student_id, marks("Math", 44.0, 40.0, 9.0))
            .await
            .unwrap();

        let math: Vec<_> = record.marks.iter().filter(|m| m.subject == "Math").collect();
        assert_eq!(math.len(), 1);
        assert_eq!(math[0].cie1, 44.0);
        assert_eq!(record.marks.len(), 2);

        let rows = ledger.subject_marks("CS101", "Math").await.unwrap();
        assert_eq!(rows[0].marks.assignment, 9.0);
    }

    #[tokio::test]
    async fn upsert_rejects_unknown_student_and_bad_scores() {
        let store = Arc::new(MemoryStore::new());
        fixtures::seed_class(&store, "CS101", &["Math"]).await;
        let student = fixtures::seed_student(&store, "1", "CS101").await;
        let ledger = MarksLedger::new(store.clone());

        let err = ledger
            .upsert_marks(Uuid::new_v4(), marks("Math", 1.0, 1.0, 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::StudentNotFound(_)));

        let err = ledger
            .upsert_marks(student.student_id, marks("Math", -1.0, 1.0, 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
        assert!(store.find_marks(student.student_id).await.unwrap().is_none());
    }
}
