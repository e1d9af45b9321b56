//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `RecordStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Unique keys are enforced by the schema. Marking an hour runs in one
//! transaction that locks the day row, and the (class, date, hour) primary key
//! rejects a second entry for the same hour.

use async_trait::async_trait;
use attendance_core::domain::{
    day_name, AttendanceDay, Class, HourEntry, Lecturer, MarksRecord, Student, StudentPresence,
    SubjectAssignment, SubjectMarks, TimeTableDay,
};
use attendance_core::ports::{PortError, PortResult, RecordStore};
use chrono::{Datelike, NaiveDate};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `RecordStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Unique-key violations become `Conflict`, everything else is unexpected.
fn write_error(e: sqlx::Error, what: &str) -> PortError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PortError::Conflict(format!("{} already exists", what))
        }
        _ => unexpected(e),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ClassRecord {
    class_id: String,
    branch: String,
    semester: i32,
    subjects: Vec<String>,
    time_table: Json<Vec<TimeTableDay>>,
}
impl ClassRecord {
    fn to_domain(self) -> Class {
        Class {
            class_id: self.class_id,
            branch: self.branch,
            semester: self.semester.max(0) as u32,
            subjects: self.subjects,
            time_table: self.time_table.0,
        }
    }
}

#[derive(FromRow)]
struct StudentRecord {
    student_id: Uuid,
    rollnumber: String,
    name: String,
    password_hash: String,
    class_id: String,
}
impl StudentRecord {
    fn to_domain(self) -> Student {
        Student {
            student_id: self.student_id,
            rollnumber: self.rollnumber,
            name: self.name,
            class_id: self.class_id,
            password_hash: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct LecturerRecord {
    lecturer_id: Uuid,
    username: String,
    name: String,
    password_hash: String,
    classes_taught: Vec<String>,
}
impl LecturerRecord {
    fn to_domain(self) -> Lecturer {
        Lecturer {
            lecturer_id: self.lecturer_id,
            username: self.username,
            name: self.name,
            classes_taught: self.classes_taught,
            password_hash: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct AssignmentRecord {
    class_id: String,
    subject: String,
    lecturer_id: Uuid,
    lecturer_name: String,
}
impl AssignmentRecord {
    fn to_domain(self) -> SubjectAssignment {
        SubjectAssignment {
            class_id: self.class_id,
            subject: self.subject,
            lecturer_id: self.lecturer_id,
            lecturer_name: self.lecturer_name,
        }
    }
}

#[derive(FromRow)]
struct DayRecord {
    class_id: String,
    date: NaiveDate,
    day: String,
    total_hours: i32,
}

#[derive(FromRow)]
struct HourRecord {
    class_id: String,
    date: NaiveDate,
    hour: String,
    updated: bool,
    subject: String,
    lecturer_id: Uuid,
    student_data: Json<Vec<StudentPresence>>,
}
impl HourRecord {
    fn to_domain(self) -> HourEntry {
        HourEntry {
            hour: self.hour,
            updated: self.updated,
            subject: self.subject,
            lecturer_id: self.lecturer_id,
            student_data: self.student_data.0,
        }
    }
}

#[derive(FromRow)]
struct MarksRow {
    subject: String,
    cie1: f64,
    cie2: f64,
    assignment: f64,
}
impl MarksRow {
    fn to_domain(self) -> SubjectMarks {
        SubjectMarks {
            subject: self.subject,
            cie1: self.cie1,
            cie2: self.cie2,
            assignment: self.assignment,
        }
    }
}

/// Joins day rows with their hour rows. `hours` must be ordered by position.
fn assemble_days(days: Vec<DayRecord>, hours: Vec<HourRecord>) -> Vec<AttendanceDay> {
    let mut by_day: HashMap<(String, NaiveDate), Vec<HourEntry>> = HashMap::new();
    for record in hours {
        by_day
            .entry((record.class_id.clone(), record.date))
            .or_default()
            .push(record.to_domain());
    }

    days.into_iter()
        .map(|record| {
            let hour_wise_attendance = by_day
                .remove(&(record.class_id.clone(), record.date))
                .unwrap_or_default();
            AttendanceDay {
                class_id: record.class_id,
                day: record.day,
                date: record.date,
                total_hours: record.total_hours.max(0) as usize,
                hour_wise_attendance,
            }
        })
        .collect()
}

const CLASS_COLUMNS: &str = "class_id, branch, semester, subjects, time_table";
const STUDENT_COLUMNS: &str = "student_id, rollnumber, name, password_hash, class_id";
const LECTURER_COLUMNS: &str = "lecturer_id, username, name, password_hash, classes_taught";
const HOUR_COLUMNS: &str =
    "h.class_id, h.date, h.hour, h.updated, h.subject, h.lecturer_id, h.student_data";

//=========================================================================================
// `RecordStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl RecordStore for DbAdapter {
    async fn create_class(&self, class: &Class) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO classes (class_id, branch, semester, subjects, time_table) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&class.class_id)
        .bind(&class.branch)
        .bind(class.semester as i32)
        .bind(&class.subjects)
        .bind(Json(&class.time_table))
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &format!("Class {}", class.class_id)))?;
        Ok(())
    }

    async fn get_class(&self, class_id: &str) -> PortResult<Class> {
        let record = sqlx::query_as::<_, ClassRecord>(&format!(
            "SELECT {} FROM classes WHERE class_id = $1",
            CLASS_COLUMNS
        ))
        .bind(class_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Class {} not found", class_id)))?;
        Ok(record.to_domain())
    }

    async fn list_classes(&self) -> PortResult<Vec<Class>> {
        let records = sqlx::query_as::<_, ClassRecord>(&format!(
            "SELECT {} FROM classes ORDER BY class_id",
            CLASS_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_student(&self, student: &Student) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO students (student_id, rollnumber, name, password_hash, class_id) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(student.student_id)
        .bind(&student.rollnumber)
        .bind(&student.name)
        .bind(&student.password_hash)
        .bind(&student.class_id)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &format!("Student {}", student.rollnumber)))?;
        Ok(())
    }

    async fn get_student(&self, rollnumber: &str) -> PortResult<Student> {
        let record = sqlx::query_as::<_, StudentRecord>(&format!(
            "SELECT {} FROM students WHERE rollnumber = $1",
            STUDENT_COLUMNS
        ))
        .bind(rollnumber)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Student {} not found", rollnumber)))?;
        Ok(record.to_domain())
    }

    async fn get_student_by_id(&self, student_id: Uuid) -> PortResult<Student> {
        let record = sqlx::query_as::<_, StudentRecord>(&format!(
            "SELECT {} FROM students WHERE student_id = $1",
            STUDENT_COLUMNS
        ))
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Student {} not found", student_id)))?;
        Ok(record.to_domain())
    }

    async fn list_students_in_class(&self, class_id: &str) -> PortResult<Vec<Student>> {
        let records = sqlx::query_as::<_, StudentRecord>(&format!(
            "SELECT {} FROM students WHERE class_id = $1 ORDER BY rollnumber",
            STUDENT_COLUMNS
        ))
        .bind(class_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_lecturer(&self, lecturer: &Lecturer) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO lecturers (lecturer_id, username, name, password_hash, classes_taught) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(lecturer.lecturer_id)
        .bind(&lecturer.username)
        .bind(&lecturer.name)
        .bind(&lecturer.password_hash)
        .bind(&lecturer.classes_taught)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &format!("Lecturer {}", lecturer.username)))?;
        Ok(())
    }

    async fn get_lecturer(&self, lecturer_id: Uuid) -> PortResult<Lecturer> {
        let record = sqlx::query_as::<_, LecturerRecord>(&format!(
            "SELECT {} FROM lecturers WHERE lecturer_id = $1",
            LECTURER_COLUMNS
        ))
        .bind(lecturer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Lecturer {} not found", lecturer_id)))?;
        Ok(record.to_domain())
    }

    async fn get_lecturer_by_username(&self, username: &str) -> PortResult<Lecturer> {
        let record = sqlx::query_as::<_, LecturerRecord>(&format!(
            "SELECT {} FROM lecturers WHERE username = $1",
            LECTURER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Lecturer {} not found", username)))?;
        Ok(record.to_domain())
    }

    async fn list_lecturers(&self) -> PortResult<Vec<Lecturer>> {
        let records = sqlx::query_as::<_, LecturerRecord>(&format!(
            "SELECT {} FROM lecturers ORDER BY username",
            LECTURER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn insert_assignment(&self, assignment: &SubjectAssignment) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO subject_assignments (class_id, subject, lecturer_id, lecturer_name) VALUES ($1, $2, $3, $4)",
        )
        .bind(&assignment.class_id)
        .bind(&assignment.subject)
        .bind(assignment.lecturer_id)
        .bind(&assignment.lecturer_name)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            write_error(
                e,
                &format!("Assignment {}/{}", assignment.class_id, assignment.subject),
            )
        })?;
        Ok(())
    }

    async fn find_assignment_by_subject(
        &self,
        class_id: &str,
        subject: &str,
    ) -> PortResult<Option<SubjectAssignment>> {
        let record = sqlx::query_as::<_, AssignmentRecord>(
            "SELECT class_id, subject, lecturer_id, lecturer_name FROM subject_assignments WHERE class_id = $1 AND subject = $2",
        )
        .bind(class_id)
        .bind(subject)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn find_assignment_by_lecturer(
        &self,
        class_id: &str,
        lecturer_id: Uuid,
    ) -> PortResult<Option<SubjectAssignment>> {
        let record = sqlx::query_as::<_, AssignmentRecord>(
            "SELECT class_id, subject, lecturer_id, lecturer_name FROM subject_assignments WHERE class_id = $1 AND lecturer_id = $2 ORDER BY subject LIMIT 1",
        )
        .bind(class_id)
        .bind(lecturer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn list_assignments(&self) -> PortResult<Vec<SubjectAssignment>> {
        let records = sqlx::query_as::<_, AssignmentRecord>(
            "SELECT class_id, subject, lecturer_id, lecturer_name FROM subject_assignments ORDER BY class_id, subject",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn find_attendance_day(
        &self,
        class_id: &str,
        date: NaiveDate,
    ) -> PortResult<Option<AttendanceDay>> {
        let day = sqlx::query_as::<_, DayRecord>(
            "SELECT class_id, date, day, total_hours FROM attendance_days WHERE class_id = $1 AND date = $2",
        )
        .bind(class_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        let Some(day) = day else {
            return Ok(None);
        };

        let hours = sqlx::query_as::<_, HourRecord>(&format!(
            "SELECT {} FROM attendance_hours h WHERE h.class_id = $1 AND h.date = $2 ORDER BY h.position",
            HOUR_COLUMNS
        ))
        .bind(class_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(assemble_days(vec![day], hours).pop())
    }

    async fn append_attendance_hour(
        &self,
        class_id: &str,
        date: NaiveDate,
        entry: &HourEntry,
    ) -> PortResult<AttendanceDay> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        sqlx::query(
            "INSERT INTO attendance_days (class_id, date, day, total_hours) VALUES ($1, $2, $3, 0) ON CONFLICT (class_id, date) DO NOTHING",
        )
        .bind(class_id)
        .bind(date)
        .bind(day_name(date.weekday()))
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        // The row lock orders writers of the same day so positions stay dense.
        let (position,): (i32,) = sqlx::query_as(
            "SELECT total_hours FROM attendance_days WHERE class_id = $1 AND date = $2 FOR UPDATE",
        )
        .bind(class_id)
        .bind(date)
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        sqlx::query(
            "INSERT INTO attendance_hours (class_id, date, hour, position, updated, subject, lecturer_id, student_data) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(class_id)
        .bind(date)
        .bind(&entry.hour)
        .bind(position)
        .bind(entry.updated)
        .bind(&entry.subject)
        .bind(entry.lecturer_id)
        .bind(Json(&entry.student_data))
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, &format!("Hour {} of {} on {}", entry.hour, class_id, date)))?;

        sqlx::query(
            "UPDATE attendance_days SET total_hours = total_hours + 1 WHERE class_id = $1 AND date = $2",
        )
        .bind(class_id)
        .bind(date)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;

        self.find_attendance_day(class_id, date)
            .await?
            .ok_or_else(|| {
                PortError::Unexpected(format!("attendance for {} on {} vanished after insert", class_id, date))
            })
    }

    async fn list_attendance_for_class(&self, class_id: &str) -> PortResult<Vec<AttendanceDay>> {
        let days = sqlx::query_as::<_, DayRecord>(
            "SELECT class_id, date, day, total_hours FROM attendance_days WHERE class_id = $1 ORDER BY date",
        )
        .bind(class_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let hours = sqlx::query_as::<_, HourRecord>(&format!(
            "SELECT {} FROM attendance_hours h WHERE h.class_id = $1 ORDER BY h.date, h.position",
            HOUR_COLUMNS
        ))
        .bind(class_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(assemble_days(days, hours))
    }

    async fn list_attendance_for_student(
        &self,
        rollnumber: &str,
    ) -> PortResult<Vec<AttendanceDay>> {
        let containment = Json(serde_json::json!([{ "rollnumber": rollnumber }]));

        let days = sqlx::query_as::<_, DayRecord>(
            "SELECT d.class_id, d.date, d.day, d.total_hours FROM attendance_days d \
             WHERE EXISTS (SELECT 1 FROM attendance_hours h \
                           WHERE h.class_id = d.class_id AND h.date = d.date AND h.student_data @> $1) \
             ORDER BY d.date, d.class_id",
        )
        .bind(&containment)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let hours = sqlx::query_as::<_, HourRecord>(&format!(
            "SELECT {} FROM attendance_hours h \
             WHERE (h.class_id, h.date) IN (SELECT class_id, date FROM attendance_hours WHERE student_data @> $1) \
             ORDER BY h.class_id, h.date, h.position",
            HOUR_COLUMNS
        ))
        .bind(&containment)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(assemble_days(days, hours))
    }

    async fn find_marks(&self, student_id: Uuid) -> PortResult<Option<MarksRecord>> {
        let rows = sqlx::query_as::<_, MarksRow>(
            "SELECT subject, cie1, cie2, assignment FROM marks WHERE student_id = $1 ORDER BY created_at, subject",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(MarksRecord {
            student_id,
            marks: rows.into_iter().map(|r| r.to_domain()).collect(),
        }))
    }

    async fn upsert_subject_marks(
        &self,
        student_id: Uuid,
        entry: &SubjectMarks,
    ) -> PortResult<MarksRecord> {
        sqlx::query(
            "INSERT INTO marks (student_id, subject, cie1, cie2, assignment) VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (student_id, subject) \
             DO UPDATE SET cie1 = EXCLUDED.cie1, cie2 = EXCLUDED.cie2, assignment = EXCLUDED.assignment",
        )
        .bind(student_id)
        .bind(&entry.subject)
        .bind(entry.cie1)
        .bind(entry.cie2)
        .bind(entry.assignment)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        self.find_marks(student_id)
            .await?
            .ok_or_else(|| PortError::Unexpected(format!("marks for {} vanished after upsert", student_id)))
    }

    async fn close(&self) {
        info!("Closing database pool...");
        self.pool.close().await;
    }
}
