//! crates/attendance_core/src/schedule.rs
//!
//! Timetable lookups.
//!
//! A date selects the timetable row at `weekday_from_sunday - 1`, so Monday
//! reads row 0 and Sunday has no row. Stored timetables and existing clients
//! rely on this convention; keep it as is.

use chrono::{Datelike, NaiveDate};
use std::sync::Arc;

use crate::domain::Class;
use crate::error::{not_found_as, CoreError, CoreResult};
use crate::ports::RecordStore;

/// Index of the timetable row used for `date`, or `None` on Sundays.
pub fn timetable_index(date: NaiveDate) -> Option<usize> {
    (date.weekday().num_days_from_sunday() as usize).checked_sub(1)
}

/// Hour labels on `date` whose scheduled subject is `subject`, in timetable order.
pub fn hours_for_subject(class: &Class, date: NaiveDate, subject: &str) -> CoreResult<Vec<String>> {
    let row = timetable_index(date)
        .and_then(|index| class.time_table.get(index))
        .ok_or_else(|| {
            CoreError::InvalidInput(format!(
                "class {} has no timetable entry for {}",
                class.class_id, date
            ))
        })?;

    Ok(row
        .hours
        .iter()
        .filter(|slot| slot.subject == subject)
        .map(|slot| slot.hour.clone())
        .collect())
}

#[derive(Clone)]
pub struct Schedule {
    store: Arc<dyn RecordStore>,
}

impl Schedule {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn subject_hours(
        &self,
        class_id: &str,
        date: NaiveDate,
        subject: &str,
    ) -> CoreResult<Vec<String>> {
        let class = self
            .store
            .get_class(class_id)
            .await
            .map_err(|e| not_found_as(e, CoreError::ClassNotFound(class_id.to_string())))?;
        hours_for_subject(&class, date, subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HourSlot, TimeTableDay};

    fn row(day: &str, hours: &[(&str, &str)]) -> TimeTableDay {
        TimeTableDay {
            day: day.to_string(),
            hours: hours
                .iter()
                .map(|(hour, subject)| HourSlot {
                    hour: hour.to_string(),
                    subject: subject.to_string(),
                })
                .collect(),
        }
    }

    fn class() -> Class {
        Class {
            class_id: "CS101".to_string(),
            branch: "CSE".to_string(),
            semester: 3,
            subjects: vec!["Math".to_string(), "Phy".to_string()],
            time_table: vec![
                row("Monday", &[("1", "Math"), ("2", "Phy"), ("3", "Math")]),
                row("Tuesday", &[("1", "Phy")]),
            ],
        }
    }

    #[test]
    fn monday_reads_the_first_row() {
        let monday = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        assert_eq!(timetable_index(monday), Some(0));
        assert_eq!(hours_for_subject(&class(), monday, "Math").unwrap(), ["1", "3"]);
        assert!(hours_for_subject(&class(), monday, "Chem").unwrap().is_empty());
    }

    #[test]
    fn sunday_and_missing_rows_are_rejected() {
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        assert_eq!(timetable_index(sunday), None);
        assert!(matches!(
            hours_for_subject(&class(), sunday, "Math"),
            Err(CoreError::InvalidInput(_))
        ));

        let wednesday = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert!(hours_for_subject(&class(), wednesday, "Math").is_err());
    }
}
