//! crates/attendance_core/src/ports.rs
//!
//! Defines the record store contract used by the core logic.
//! The ledgers, the resolver and the aggregator only ever talk to a
//! `RecordStore`, so the same rules run against PostgreSQL in production and
//! against the in-memory store in tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{
    AttendanceDay, Class, HourEntry, Lecturer, MarksRecord, Student, SubjectAssignment,
    SubjectMarks,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all store operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A unique key or compare-and-swap guard rejected the write.
    #[error("Conflicting write: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Record Store Port
//=========================================================================================

#[async_trait]
pub trait RecordStore: Send + Sync {
    // --- Classes ---
    /// Fails with `Conflict` if the class ID is taken.
    async fn create_class(&self, class: &Class) -> PortResult<()>;

    async fn get_class(&self, class_id: &str) -> PortResult<Class>;

    async fn list_classes(&self) -> PortResult<Vec<Class>>;

    // --- Students ---
    /// Fails with `Conflict` if the roll number is taken.
    async fn create_student(&self, student: &Student) -> PortResult<()>;

    async fn get_student(&self, rollnumber: &str) -> PortResult<Student>;

    async fn get_student_by_id(&self, student_id: Uuid) -> PortResult<Student>;

    /// Students of a class, sorted by roll number.
    async fn list_students_in_class(&self, class_id: &str) -> PortResult<Vec<Student>>;

    // --- Lecturers ---
    /// Fails with `Conflict` if the username is taken.
    async fn create_lecturer(&self, lecturer: &Lecturer) -> PortResult<()>;

    async fn get_lecturer(&self, lecturer_id: Uuid) -> PortResult<Lecturer>;

    async fn get_lecturer_by_username(&self, username: &str) -> PortResult<Lecturer>;

    async fn list_lecturers(&self) -> PortResult<Vec<Lecturer>>;

    // --- Subject Assignments ---
    /// Fails with `Conflict` if (class, subject) is already assigned.
    async fn insert_assignment(&self, assignment: &SubjectAssignment) -> PortResult<()>;

    async fn find_assignment_by_subject(
        &self,
        class_id: &str,
        subject: &str,
    ) -> PortResult<Option<SubjectAssignment>>;

    async fn find_assignment_by_lecturer(
        &self,
        class_id: &str,
        lecturer_id: Uuid,
    ) -> PortResult<Option<SubjectAssignment>>;

    async fn list_assignments(&self) -> PortResult<Vec<SubjectAssignment>>;

    // --- Attendance ---
    async fn find_attendance_day(
        &self,
        class_id: &str,
        date: NaiveDate,
    ) -> PortResult<Option<AttendanceDay>>;

    /// Appends one marked hour to the (class, date) record, creating the
    /// record on first use, and bumps its `total_hours`. The check and the
    /// append are a single atomic step, so writers of different hours never
    /// interfere.
    ///
    /// Fails with `Conflict` without writing if the hour is already marked.
    async fn append_attendance_hour(
        &self,
        class_id: &str,
        date: NaiveDate,
        entry: &HourEntry,
    ) -> PortResult<AttendanceDay>;

    /// All day records of a class, ordered by date.
    async fn list_attendance_for_class(&self, class_id: &str) -> PortResult<Vec<AttendanceDay>>;

    /// All day records holding at least one entry for the roll number,
    /// ordered by date.
    async fn list_attendance_for_student(&self, rollnumber: &str)
        -> PortResult<Vec<AttendanceDay>>;

    // --- Marks ---
    async fn find_marks(&self, student_id: Uuid) -> PortResult<Option<MarksRecord>>;

    /// Atomically creates the student's record if needed and replaces or
    /// appends the entry for `entry.subject`.
    async fn upsert_subject_marks(
        &self,
        student_id: Uuid,
        entry: &SubjectMarks,
    ) -> PortResult<MarksRecord>;

    // --- Lifecycle ---
    /// Releases connections at shutdown.
    async fn close(&self) {}
}
