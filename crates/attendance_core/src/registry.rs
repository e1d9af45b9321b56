//! crates/attendance_core/src/registry.rs
//!
//! Creation and listing of classes, students and lecturers. Passwords arrive
//! already hashed; hashing belongs to the web layer.

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::{Class, Lecturer, Student, TimeTableDay};
use crate::error::{not_found_as, CoreError, CoreResult};
use crate::ports::{PortError, RecordStore};

/// A class as submitted for creation.
#[derive(Debug, Clone)]
pub struct NewClass {
    pub class_id: String,
    pub branch: String,
    pub semester: u32,
    pub subjects: Vec<String>,
    pub time_table: Vec<TimeTableDay>,
}

#[derive(Debug, Clone)]
pub struct NewStudent {
    pub rollnumber: String,
    pub name: String,
    pub class_id: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewLecturer {
    pub username: String,
    pub name: String,
    pub classes_taught: Vec<String>,
    pub password_hash: String,
}

fn required(field: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

fn duplicate_or_storage(err: PortError, what: String) -> CoreError {
    match err {
        PortError::Conflict(_) => CoreError::DuplicateRecord(what),
        other => CoreError::Storage(other),
    }
}

#[derive(Clone)]
pub struct Registry {
    store: Arc<dyn RecordStore>,
}

impl Registry {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn add_class(&self, new: NewClass) -> CoreResult<Class> {
        required("classID", &new.class_id)?;
        required("branch", &new.branch)?;
        if new.semester == 0 {
            return Err(CoreError::InvalidInput("semester is required".to_string()));
        }
        if new.subjects.is_empty() {
            return Err(CoreError::InvalidInput("at least one subject is required".to_string()));
        }
        if new.subjects.iter().any(|s| s.trim().is_empty()) {
            return Err(CoreError::InvalidInput("subject names must not be blank".to_string()));
        }
        if new.time_table.iter().any(|row| row.day.trim().is_empty()) {
            return Err(CoreError::InvalidInput(
                "invalid timeTable format: every row needs a day".to_string(),
            ));
        }

        let class = Class {
            class_id: new.class_id,
            branch: new.branch,
            semester: new.semester,
            subjects: new.subjects,
            time_table: new.time_table,
        };
        self.store
            .create_class(&class)
            .await
            .map_err(|e| duplicate_or_storage(e, format!("Class {}", class.class_id)))?;
        info!("Added class {}", class.class_id);
        Ok(class)
    }

    pub async fn add_student(&self, new: NewStudent) -> CoreResult<Student> {
        required("rollnumber", &new.rollnumber)?;
        required("name", &new.name)?;
        self.store
            .get_class(&new.class_id)
            .await
            .map_err(|e| not_found_as(e, CoreError::ClassNotFound(new.class_id.clone())))?;

        let student = Student {
            student_id: Uuid::new_v4(),
            rollnumber: new.rollnumber,
            name: new.name,
            class_id: new.class_id,
            password_hash: new.password_hash,
        };
        self.store
            .create_student(&student)
            .await
            .map_err(|e| duplicate_or_storage(e, format!("Student {}", student.rollnumber)))?;
        info!("Added student {} to {}", student.rollnumber, student.class_id);
        Ok(student)
    }

    pub async fn add_lecturer(&self, new: NewLecturer) -> CoreResult<Lecturer> {
        required("username", &new.username)?;
        required("name", &new.name)?;

        let lecturer = Lecturer {
            lecturer_id: Uuid::new_v4(),
            username: new.username,
            name: new.name,
            classes_taught: new.classes_taught,
            password_hash: new.password_hash,
        };
        self.store
            .create_lecturer(&lecturer)
            .await
            .map_err(|e| duplicate_or_storage(e, format!("Lecturer {}", lecturer.username)))?;
        info!("Added lecturer {} ({})", lecturer.username, lecturer.lecturer_id);
        Ok(lecturer)
    }

    pub async fn classes(&self) -> CoreResult<Vec<Class>> {
        Ok(self.store.list_classes().await?)
    }

    pub async fn class(&self, class_id: &str) -> CoreResult<Class> {
        self.store
            .get_class(class_id)
            .await
            .map_err(|e| not_found_as(e, CoreError::ClassNotFound(class_id.to_string())))
    }

    pub async fn students_in_class(&self, class_id: &str) -> CoreResult<Vec<Student>> {
        Ok(self.store.list_students_in_class(class_id).await?)
    }

    pub async fn student(&self, rollnumber: &str) -> CoreResult<Student> {
        self.store
            .get_student(rollnumber)
            .await
            .map_err(|e| not_found_as(e, CoreError::StudentNotFound(rollnumber.to_string())))
    }

    pub async fn lecturers(&self) -> CoreResult<Vec<Lecturer>> {
        Ok(self.store.list_lecturers().await?)
    }

    pub async fn lecturer_by_username(&self, username: &str) -> CoreResult<Lecturer> {
        self.store
            .get_lecturer_by_username(username)
            .await
            .map_err(|e| not_found_as(e, CoreError::LecturerNotFound(username.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn cs101() -> NewClass {
        NewClass {
            class_id: "CS101".to_string(),
            branch: "CSE".to_string(),
            semester: 3,
            subjects: vec!["Math".to_string(), "Phy".to_string()],
            time_table: Vec::new(),
        }
    }

    #[tokio::test]
    async fn class_requires_subjects_and_unique_id() {
        let registry = Registry::new(Arc::new(MemoryStore::new()));

        let err = registry
            .add_class(NewClass {
                subjects: Vec::new(),
                ..cs101()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));

        registry.add_class(cs101()).await.unwrap();
        let err = registry.add_class(cs101()).await.unwrap_err();
        assert!(matches!(err, CoreError::DuplicateRecord(_)));
        assert_eq!(registry.classes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn a_blank_subject_among_real_ones_is_rejected() {
        let registry = Registry::new(Arc::new(MemoryStore::new()));

        let err = registry
            .add_class(NewClass {
                subjects: vec!["DBMS".to_string(), "  ".to_string()],
                ..cs101()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(ref m) if m.contains("blank")));
        assert!(registry.classes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn student_must_reference_an_existing_class() {
        let registry = Registry::new(Arc::new(MemoryStore::new()));
        let new_student = NewStudent {
            rollnumber: "1".to_string(),
            name: "Asha".to_string(),
            class_id: "CS101".to_string(),
            password_hash: "x".to_string(),
        };

        let err = registry.add_student(new_student.clone()).await.unwrap_err();
        assert!(matches!(err, CoreError::ClassNotFound(_)));

        registry.add_class(cs101()).await.unwrap();
        let student = registry.add_student(new_student.clone()).await.unwrap();
        assert_eq!(registry.student("1").await.unwrap().student_id, student.student_id);

        let err = registry.add_student(new_student).await.unwrap_err();
        assert!(matches!(err, CoreError::DuplicateRecord(_)));
    }

    #[tokio::test]
    async fn lecturer_usernames_are_unique() {
        let registry = Registry::new(Arc::new(MemoryStore::new()));
        let new_lecturer = NewLecturer {
            username: "meera".to_string(),
            name: "Meera".to_string(),
            classes_taught: vec!["CS101".to_string()],
            password_hash: "x".to_string(),
        };
        let lecturer = registry.add_lecturer(new_lecturer.clone()).await.unwrap();
        assert_eq!(
            registry.lecturer_by_username("meera").await.unwrap().lecturer_id,
            lecturer.lecturer_id
        );
        assert!(matches!(
            registry.add_lecturer(new_lecturer).await.unwrap_err(),
            CoreError::DuplicateRecord(_)
        ));
        assert!(matches!(
            registry.lecturer_by_username("ravi").await.unwrap_err(),
            CoreError::LecturerNotFound(_)
        ));
    }
}
