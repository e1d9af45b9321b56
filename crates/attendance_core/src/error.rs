//! crates/attendance_core/src/error.rs
//!
//! Domain errors returned by the ledgers, the resolver and the aggregator.

use chrono::NaiveDate;

use crate::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Class {0} not found")]
    ClassNotFound(String),
    #[error("Student {0} not found")]
    StudentNotFound(String),
    #[error("Lecturer {0} not found")]
    LecturerNotFound(String),
    #[error("No subject assignment found for {0}")]
    AssignmentNotFound(String),
    #[error("Subject {subject} is not taught in class {class_id}")]
    SubjectNotInClass { class_id: String, subject: String },
    #[error("Attendance already marked for class {class_id} on {date}, hour {hour}")]
    AlreadyMarked {
        class_id: String,
        date: NaiveDate,
        hour: String,
    },
    #[error("Subject {subject} of class {class_id} is already assigned")]
    DuplicateAssignment { class_id: String, subject: String },
    #[error("{0} already exists")]
    DuplicateRecord(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Storage failure: {0}")]
    Storage(#[from] PortError),
}

impl CoreError {
    /// True for the "referenced record does not exist" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::ClassNotFound(_)
                | CoreError::StudentNotFound(_)
                | CoreError::LecturerNotFound(_)
                | CoreError::AssignmentNotFound(_)
        )
    }
}

/// A convenience type alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Maps a store `NotFound` to the given domain error; anything else stays a
/// storage failure.
pub(crate) fn not_found_as(err: PortError, mapped: CoreError) -> CoreError {
    match err {
        PortError::NotFound(_) => mapped,
        other => CoreError::Storage(other),
    }
}
