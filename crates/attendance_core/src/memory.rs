//! crates/attendance_core/src/memory.rs
//!
//! An in-memory `RecordStore`, used for local runs (`STORE_BACKEND=memory`)
//! and as the store behind the test suites. It enforces the same unique keys
//! and the one-entry-per-hour rule of the PostgreSQL adapter.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{
    AttendanceDay, Class, HourEntry, Lecturer, MarksRecord, Student, SubjectAssignment,
    SubjectMarks,
};
use crate::ports::{PortError, PortResult, RecordStore};

#[derive(Default)]
pub struct MemoryStore {
    classes: Mutex<BTreeMap<String, Class>>,
    /// Keyed by roll number.
    students: Mutex<BTreeMap<String, Student>>,
    lecturers: Mutex<HashMap<Uuid, Lecturer>>,
    assignments: Mutex<BTreeMap<(String, String), SubjectAssignment>>,
    attendance: Mutex<BTreeMap<(String, NaiveDate), AttendanceDay>>,
    marks: Mutex<HashMap<Uuid, MarksRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create_class(&self, class: &Class) -> PortResult<()> {
        let mut classes = self.classes.lock().await;
        if classes.contains_key(&class.class_id) {
            return Err(PortError::Conflict(format!("class {}", class.class_id)));
        }
        classes.insert(class.class_id.clone(), class.clone());
        Ok(())
    }

    async fn get_class(&self, class_id: &str) -> PortResult<Class> {
        self.classes
            .lock()
            .await
            .get(class_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Class {} not found", class_id)))
    }

    async fn list_classes(&self) -> PortResult<Vec<Class>> {
        Ok(self.classes.lock().await.values().cloned().collect())
    }

    async fn create_student(&self, student: &Student) -> PortResult<()> {
        let mut students = self.students.lock().await;
        if students.contains_key(&student.rollnumber) {
            return Err(PortError::Conflict(format!("student {}", student.rollnumber)));
        }
        students.insert(student.rollnumber.clone(), student.clone());
        Ok(())
    }

    async fn get_student(&self, rollnumber: &str) -> PortResult<Student> {
        self.students
            .lock()
            .await
            .get(rollnumber)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Student {} not found", rollnumber)))
    }

    async fn get_student_by_id(&self, student_id: Uuid) -> PortResult<Student> {
        self.students
            .lock()
            .await
            .values()
            .find(|s| s.student_id == student_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Student {} not found", student_id)))
    }

    async fn list_students_in_class(&self, class_id: &str) -> PortResult<Vec<Student>> {
        // BTreeMap iteration is already in roll number order.
        Ok(self
            .students
            .lock()
            .await
            .values()
            .filter(|s| s.class_id == class_id)
            .cloned()
            .collect())
    }

    async fn create_lecturer(&self, lecturer: &Lecturer) -> PortResult<()> {
        let mut lecturers = self.lecturers.lock().await;
        if lecturers
            .values()
            .any(|l| l.username == lecturer.username || l.lecturer_id == lecturer.lecturer_id)
        {
            return Err(PortError::Conflict(format!("lecturer {}", lecturer.username)));
        }
        lecturers.insert(lecturer.lecturer_id, lecturer.clone());
        Ok(())
    }

    async fn get_lecturer(&self, lecturer_id: Uuid) -> PortResult<Lecturer> {
        self.lecturers
            .lock()
            .await
            .get(&lecturer_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Lecturer {} not found", lecturer_id)))
    }

    async fn get_lecturer_by_username(&self, username: &str) -> PortResult<Lecturer> {
        self.lecturers
            .lock()
            .await
            .values()
            .find(|l| l.username == username)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Lecturer {} not found", username)))
    }

    async fn list_lecturers(&self) -> PortResult<Vec<Lecturer>> {
        let mut lecturers: Vec<Lecturer> = self.lecturers.lock().await.values().cloned().collect();
        lecturers.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(lecturers)
    }

    async fn insert_assignment(&self, assignment: &SubjectAssignment) -> PortResult<()> {
        let key = (assignment.class_id.clone(), assignment.subject.clone());
        let mut assignments = self.assignments.lock().await;
        if assignments.contains_key(&key) {
            return Err(PortError::Conflict(format!(
                "assignment {}/{}",
                assignment.class_id, assignment.subject
            )));
        }
        assignments.insert(key, assignment.clone());
        Ok(())
    }

    async fn find_assignment_by_subject(
        &self,
        class_id: &str,
        subject: &str,
    ) -> PortResult<Option<SubjectAssignment>> {
        Ok(self
            .assignments
            .lock()
            .await
            .get(&(class_id.to_string(), subject.to_string()))
            .cloned())
    }

    async fn find_assignment_by_lecturer(
        &self,
        class_id: &str,
        lecturer_id: Uuid,
    ) -> PortResult<Option<SubjectAssignment>> {
        Ok(self
            .assignments
            .lock()
            .await
            .values()
            .find(|a| a.class_id == class_id && a.lecturer_id == lecturer_id)
            .cloned())
    }

    async fn list_assignments(&self) -> PortResult<Vec<SubjectAssignment>> {
        Ok(self.assignments.lock().await.values().cloned().collect())
    }

    async fn find_attendance_day(
        &self,
        class_id: &str,
        date: NaiveDate,
    ) -> PortResult<Option<AttendanceDay>> {
        Ok(self
            .attendance
            .lock()
            .await
            .get(&(class_id.to_string(), date))
            .cloned())
    }

    async fn append_attendance_hour(
        &self,
        class_id: &str,
        date: NaiveDate,
        entry: &HourEntry,
    ) -> PortResult<AttendanceDay> {
        // One lock covers the marked check and the append.
        let mut attendance = self.attendance.lock().await;
        let day = attendance
            .entry((class_id.to_string(), date))
            .or_insert_with(|| AttendanceDay::new(class_id, date));
        day.record_hour(entry.clone())
            .map_err(|e| PortError::Conflict(e.to_string()))?;
        Ok(day.clone())
    }

    async fn list_attendance_for_class(&self, class_id: &str) -> PortResult<Vec<AttendanceDay>> {
        Ok(self
            .attendance
            .lock()
            .await
            .values()
            .filter(|d| d.class_id == class_id)
            .cloned()
            .collect())
    }

    async fn list_attendance_for_student(
        &self,
        rollnumber: &str,
    ) -> PortResult<Vec<AttendanceDay>> {
        let mut days: Vec<AttendanceDay> = self
            .attendance
            .lock()
            .await
            .values()
            .filter(|d| {
                d.hour_wise_attendance
                    .iter()
                    .any(|entry| entry.presence_of(rollnumber).is_some())
            })
            .cloned()
            .collect();
        days.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.class_id.cmp(&b.class_id)));
        Ok(days)
    }

    async fn find_marks(&self, student_id: Uuid) -> PortResult<Option<MarksRecord>> {
        Ok(self.marks.lock().await.get(&student_id).cloned())
    }

    async fn upsert_subject_marks(
        &self,
        student_id: Uuid,
        entry: &SubjectMarks,
    ) -> PortResult<MarksRecord> {
        let mut marks = self.marks.lock().await;
        let record = marks
            .entry(student_id)
            .or_insert_with(|| MarksRecord::new(student_id));
        record.upsert(entry.clone());
        Ok(record.clone())
    }
}
