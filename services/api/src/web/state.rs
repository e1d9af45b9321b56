//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use attendance_core::assignments::SubjectAssignmentResolver;
use attendance_core::attendance::AttendanceLedger;
use attendance_core::insights::InsightAggregator;
use attendance_core::marks::MarksLedger;
use attendance_core::ports::RecordStore;
use attendance_core::registry::Registry;
use attendance_core::schedule::Schedule;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// The ledgers hold no state of their own; each accessor hands out a view over
/// the one injected store.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub fn attendance(&self) -> AttendanceLedger {
        AttendanceLedger::new(self.store.clone())
    }

    pub fn marks(&self) -> MarksLedger {
        MarksLedger::new(self.store.clone())
    }

    pub fn assignments(&self) -> SubjectAssignmentResolver {
        SubjectAssignmentResolver::new(self.store.clone())
    }

    pub fn insights(&self) -> InsightAggregator {
        InsightAggregator::new(self.store.clone())
    }

    pub fn registry(&self) -> Registry {
        Registry::new(self.store.clone())
    }

    pub fn schedule(&self) -> Schedule {
        Schedule::new(self.store.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use attendance_core::attendance::MarkRequest;
    use attendance_core::registry::NewClass;
    use chrono::NaiveDate;
    use uuid::Uuid;

    #[tokio::test]
    async fn cloned_states_share_one_store() {
        let state = AppState::new(Arc::new(MemoryStore::new()));
        let handler_copy = state.clone();

        state
            .registry()
            .add_class(NewClass {
                class_id: "CS101".to_string(),
                branch: "CSE".to_string(),
                semester: 3,
                subjects: vec!["DBMS".to_string()],
                time_table: Vec::new(),
            })
            .await
            .unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        handler_copy
            .attendance()
            .mark_attendance(MarkRequest {
                class_id: "CS101".to_string(),
                date,
                hour: "1".to_string(),
                subject: "DBMS".to_string(),
                lecturer_id: Uuid::new_v4(),
                student_data: Vec::new(),
            })
            .await
            .unwrap();

        assert!(state.attendance().check_marked("CS101", date, "1").await.unwrap());
    }
}
