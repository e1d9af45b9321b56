//! crates/attendance_core/src/assignments.rs
//!
//! The subject assignment resolver: binds (class, subject) to exactly one
//! lecturer and answers lookups in both directions.

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::SubjectAssignment;
use crate::error::{not_found_as, CoreError, CoreResult};
use crate::ports::{PortError, RecordStore};

#[derive(Clone)]
pub struct SubjectAssignmentResolver {
    store: Arc<dyn RecordStore>,
}

impl SubjectAssignmentResolver {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Assigns `subject` of `class_id` to a lecturer.
    ///
    /// Checks run in order: class exists, subject belongs to the class,
    /// lecturer exists. The lecturer's current name is snapshotted into the
    /// assignment.
    pub async fn assign(
        &self,
        class_id: &str,
        subject: &str,
        lecturer_id: Uuid,
    ) -> CoreResult<SubjectAssignment> {
        let class = self
            .store
            .get_class(class_id)
            .await
            .map_err(|e| not_found_as(e, CoreError::ClassNotFound(class_id.to_string())))?;

        if !class.has_subject(subject) {
            warn!("Subject {} is not part of class {}", subject, class_id);
            return Err(CoreError::SubjectNotInClass {
                class_id: class_id.to_string(),
                subject: subject.to_string(),
            });
        }

        let lecturer = self
            .store
            .get_lecturer(lecturer_id)
            .await
            .map_err(|e| not_found_as(e, CoreError::LecturerNotFound(lecturer_id.to_string())))?;

        let assignment = SubjectAssignment {
            class_id: class_id.to_string(),
            subject: subject.to_string(),
            lecturer_id,
            lecturer_name: lecturer.name,
        };

        match self.store.insert_assignment(&assignment).await {
            Ok(()) => {
                info!(
                    "Assigned {} of {} to lecturer {}",
                    subject, class_id, lecturer_id
                );
                Ok(assignment)
            }
            Err(PortError::Conflict(_)) => Err(CoreError::DuplicateAssignment {
                class_id: class_id.to_string(),
                subject: subject.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn resolve_subject(
        &self,
        class_id: &str,
        subject: &str,
    ) -> CoreResult<Option<SubjectAssignment>> {
        Ok(self.store.find_assignment_by_subject(class_id, subject).await?)
    }

    pub async fn resolve_lecturer(
        &self,
        class_id: &str,
        lecturer_id: Uuid,
    ) -> CoreResult<Option<SubjectAssignment>> {
        Ok(self
            .store
            .find_assignment_by_lecturer(class_id, lecturer_id)
            .await?)
    }

    pub async fn list(&self) -> CoreResult<Vec<SubjectAssignment>> {
        Ok(self.store.list_assignments().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn assignment_failures_follow_the_validation_order() {
        let store = Arc::new(MemoryStore::new());
        fixtures::seed_class(&store, "CS101", &["Math", "Phy"]).await;
        let lecturer = fixtures::seed_lecturer(&store, "meera", &["CS101"]).await;
        let resolver = SubjectAssignmentResolver::new(store.clone());

        let err = resolver.assign("CS101", "Math", Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, CoreError::LecturerNotFound(_)));

        let err = resolver
            .assign("CS101", "Chem", lecturer.lecturer_id)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::SubjectNotInClass { .. }));

        let err = resolver
            .assign("EE200", "Math", lecturer.lecturer_id)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ClassNotFound(_)));

        let first = resolver.assign("CS101", "Math", lecturer.lecturer_id).await.unwrap();
        assert_eq!(first.lecturer_name, lecturer.name);

        let other = fixtures::seed_lecturer(&store, "ravi", &["CS101"]).await;
        let err = resolver
            .assign("CS101", "Math", other.lecturer_id)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateAssignment { .. }));
    }

    #[tokio::test]
    async fn resolves_in_both_directions() {
        let store = Arc::new(MemoryStore::new());
        fixtures::seed_class(&store, "CS101", &["Math", "Phy"]).await;
        let lecturer = fixtures::seed_lecturer(&store, "meera", &["CS101"]).await;
        let resolver = SubjectAssignmentResolver::new(store.clone());
        resolver.assign("CS101", "Phy", lecturer.lecturer_id).await.unwrap();

        let by_subject = resolver.resolve_subject("CS101", "Phy").await.unwrap().unwrap();
        assert_eq!(by_subject.lecturer_id, lecturer.lecturer_id);

        let by_lecturer = resolver
            .resolve_lecturer("CS101", lecturer.lecturer_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_lecturer.subject, "Phy");

        assert!(resolver.resolve_subject("CS101", "Math").await.unwrap().is_none());
        assert_eq!(resolver.list().await.unwrap().len(), 1);
    }
}
