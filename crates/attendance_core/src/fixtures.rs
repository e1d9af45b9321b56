//! Seeding helpers shared by the unit tests.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Class, Lecturer, Student, StudentPresence, SubjectAssignment, SubjectMarks};
use crate::memory::MemoryStore;
use crate::ports::RecordStore;

pub async fn seed_class(store: &Arc<MemoryStore>, class_id: &str, subjects: &[&str]) -> Class {
    let class = Class {
        class_id: class_id.to_string(),
        branch: "CSE".to_string(),
        semester: 3,
        subjects: subjects.iter().map(|s| s.to_string()).collect(),
        time_table: Vec::new(),
    };
    store.create_class(&class).await.expect("seed class");
    class
}

pub async fn seed_student(store: &Arc<MemoryStore>, rollnumber: &str, class_id: &str) -> Student {
    let student = Student {
        student_id: Uuid::new_v4(),
        rollnumber: rollnumber.to_string(),
        name: format!("Student {}", rollnumber),
        class_id: class_id.to_string(),
        password_hash: String::new(),
    };
    store.create_student(&student).await.expect("seed student");
    student
}

pub async fn seed_lecturer(store: &Arc<MemoryStore>, username: &str, classes: &[&str]) -> Lecturer {
    let lecturer = Lecturer {
        lecturer_id: Uuid::new_v4(),
        username: username.to_string(),
        name: format!("Prof. {}", username),
        classes_taught: classes.iter().map(|c| c.to_string()).collect(),
        password_hash: String::new(),
    };
    store.create_lecturer(&lecturer).await.expect("seed lecturer");
    lecturer
}

pub async fn assign(store: &Arc<MemoryStore>, class_id: &str, subject: &str, lecturer: &Lecturer) {
    store
        .insert_assignment(&SubjectAssignment {
            class_id: class_id.to_string(),
            subject: subject.to_string(),
            lecturer_id: lecturer.lecturer_id,
            lecturer_name: lecturer.name.clone(),
        })
        .await
        .expect("seed assignment");
}

pub async fn give_marks(store: &Arc<MemoryStore>, student: &Student, marks: SubjectMarks) {
    store
        .upsert_subject_marks(student.student_id, &marks)
        .await
        .expect("seed marks");
}

pub fn presence(rows: &[(&str, bool)]) -> Vec<StudentPresence> {
    rows.iter()
        .map(|(rollnumber, is_present)| StudentPresence {
            rollnumber: rollnumber.to_string(),
            is_present: *is_present,
        })
        .collect()
}
