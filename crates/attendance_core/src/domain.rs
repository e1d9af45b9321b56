//! crates/attendance_core/src/domain.rs
//!
//! Defines the core records of the attendance system: classes with their
//! timetables, students, lecturers, subject assignments, per-day attendance
//! and per-student marks.
//!
//! The serde field names follow the persisted document layout (`classID`,
//! `hourWiseAttendance`, `CIE1`, ...) so records stay wire-compatible with
//! existing clients and stored data.

use chrono::{DateTime, Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

//=========================================================================================
// Classes and Timetables
//=========================================================================================

/// A class (a cohort of students for one branch and semester).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    #[serde(rename = "classID")]
    pub class_id: String,
    pub branch: String,
    pub semester: u32,
    /// The authoritative set of subjects that assignments may reference.
    pub subjects: Vec<String>,
    #[serde(rename = "timeTable", default)]
    pub time_table: Vec<TimeTableDay>,
}

impl Class {
    pub fn has_subject(&self, subject: &str) -> bool {
        self.subjects.iter().any(|s| s == subject)
    }
}

/// One timetable row: a day name and its hour-label → subject mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeTableDay {
    pub day: String,
    #[serde(with = "hour_map", default)]
    pub hours: Vec<HourSlot>,
}

/// A single scheduled hour within a timetable row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourSlot {
    pub hour: String,
    pub subject: String,
}

/// Hours are stored as a JSON object keyed by hour label. The object order
/// is the teaching order, so it is kept as an ordered list in memory.
mod hour_map {
    use super::HourSlot;
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(slots: &[HourSlot], serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(slots.len()))?;
        for slot in slots {
            map.serialize_entry(&slot.hour, &slot.subject)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<HourSlot>, D::Error> {
        struct SlotVisitor;

        impl<'de> Visitor<'de> for SlotVisitor {
            type Value = Vec<HourSlot>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of hour labels to subject names")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut slots = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((hour, subject)) = access.next_entry::<String, String>()? {
                    slots.push(HourSlot { hour, subject });
                }
                Ok(slots)
            }
        }

        deserializer.deserialize_map(SlotVisitor)
    }
}

//=========================================================================================
// People
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: Uuid,
    pub rollnumber: String,
    pub name: String,
    /// Reference to `Class::class_id`.
    #[serde(rename = "class")]
    pub class_id: String,
    // Only used internally for login - never sent to clients.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lecturer {
    pub lecturer_id: Uuid,
    pub username: String,
    pub name: String,
    #[serde(rename = "classesTaught", default)]
    pub classes_taught: Vec<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}

/// Binds one lecturer to one (class, subject) pair.
///
/// `lecturer_name` is a snapshot taken when the assignment is created. Renaming
/// a lecturer later does not update existing assignments, so it must not be
/// read as a live join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectAssignment {
    #[serde(rename = "classID")]
    pub class_id: String,
    pub subject: String,
    pub lecturer_id: Uuid,
    pub lecturer_name: String,
}

//=========================================================================================
// Attendance
//=========================================================================================

/// Presence of one student during one marked hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentPresence {
    pub rollnumber: String,
    #[serde(rename = "isPresent")]
    pub is_present: bool,
}

/// A marked hour-slot within a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourEntry {
    pub hour: String,
    pub updated: bool,
    pub subject: String,
    pub lecturer_id: Uuid,
    pub student_data: Vec<StudentPresence>,
}

impl HourEntry {
    pub fn presence_of(&self, rollnumber: &str) -> Option<bool> {
        self.student_data
            .iter()
            .find(|p| p.rollnumber == rollnumber)
            .map(|p| p.is_present)
    }

    pub fn presentees(&self) -> usize {
        self.student_data.iter().filter(|p| p.is_present).count()
    }
}

/// The attendance record of one class for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceDay {
    #[serde(rename = "classID")]
    pub class_id: String,
    pub day: String,
    pub date: NaiveDate,
    #[serde(rename = "hourWiseAttendance")]
    pub hour_wise_attendance: Vec<HourEntry>,
    /// Always equal to `hour_wise_attendance.len()`.
    #[serde(rename = "totalHours")]
    pub total_hours: usize,
}

impl AttendanceDay {
    /// Creates an empty record, deriving the day name from the date.
    pub fn new(class_id: &str, date: NaiveDate) -> Self {
        Self {
            class_id: class_id.to_string(),
            day: day_name(date.weekday()).to_string(),
            date,
            hour_wise_attendance: Vec::new(),
            total_hours: 0,
        }
    }

    pub fn is_marked(&self, hour: &str) -> bool {
        self.hour_wise_attendance
            .iter()
            .any(|entry| entry.hour == hour && entry.updated)
    }

    /// Appends a marked hour and recomputes `total_hours`.
    pub fn record_hour(&mut self, entry: HourEntry) -> CoreResult<()> {
        if self.is_marked(&entry.hour) {
            return Err(CoreError::AlreadyMarked {
                class_id: self.class_id.clone(),
                date: self.date,
                hour: entry.hour,
            });
        }
        self.hour_wise_attendance.push(entry);
        self.total_hours = self.hour_wise_attendance.len();
        Ok(())
    }
}

//=========================================================================================
// Marks
//=========================================================================================

/// The three internal-evaluation components for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectMarks {
    pub subject: String,
    #[serde(rename = "CIE1", default)]
    pub cie1: f64,
    #[serde(rename = "CIE2", default)]
    pub cie2: f64,
    #[serde(rename = "Assignment", default)]
    pub assignment: f64,
}

impl SubjectMarks {
    /// The value reported when a student has no marks for a subject yet.
    pub fn zeroed(subject: &str) -> Self {
        Self {
            subject: subject.to_string(),
            cie1: 0.0,
            cie2: 0.0,
            assignment: 0.0,
        }
    }
}

/// All marks of one student, at most one entry per subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarksRecord {
    #[serde(rename = "student")]
    pub student_id: Uuid,
    pub marks: Vec<SubjectMarks>,
}

impl MarksRecord {
    pub fn new(student_id: Uuid) -> Self {
        Self {
            student_id,
            marks: Vec::new(),
        }
    }

    pub fn for_subject(&self, subject: &str) -> Option<&SubjectMarks> {
        self.marks.iter().find(|m| m.subject == subject)
    }

    /// Replaces the entry for `entry.subject`, or appends it if absent.
    pub fn upsert(&mut self, entry: SubjectMarks) {
        match self.marks.iter_mut().find(|m| m.subject == entry.subject) {
            Some(existing) => *existing = entry,
            None => self.marks.push(entry),
        }
    }
}

//=========================================================================================
// Dates
//=========================================================================================

/// Full English day name, as stored in `AttendanceDay::day`.
pub fn day_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sun => "Sunday",
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
    }
}

/// Parses a client-supplied date. Accepts `YYYY-MM-DD` and full RFC 3339
/// timestamps (the date part is kept).
pub fn parse_date(raw: &str) -> CoreResult<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| CoreError::InvalidInput(format!("'{}' is not a valid date", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(hour: &str) -> HourEntry {
        HourEntry {
            hour: hour.to_string(),
            updated: true,
            subject: "Math".to_string(),
            lecturer_id: Uuid::nil(),
            student_data: vec![],
        }
    }

    #[test]
    fn new_day_derives_weekday_name() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(AttendanceDay::new("CS101", date).day, "Wednesday");
    }

    #[test]
    fn record_hour_keeps_total_in_step_and_rejects_repeats() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let mut day = AttendanceDay::new("CS101", date);
        day.record_hour(entry("1")).unwrap();
        day.record_hour(entry("2")).unwrap();
        assert_eq!(day.total_hours, 2);

        let err = day.record_hour(entry("1")).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyMarked { .. }));
        assert_eq!(day.total_hours, 2);
        assert_eq!(day.hour_wise_attendance.len(), 2);
    }

    #[test]
    fn upsert_replaces_existing_subject() {
        let mut record = MarksRecord::new(Uuid::new_v4());
        record.upsert(SubjectMarks { cie1: 10.0, ..SubjectMarks::zeroed("Math") });
        record.upsert(SubjectMarks::zeroed("Phy"));
        record.upsert(SubjectMarks { cie1: 42.0, ..SubjectMarks::zeroed("Math") });

        assert_eq!(record.marks.len(), 2);
        assert_eq!(record.for_subject("Math").unwrap().cie1, 42.0);
    }

    #[test]
    fn timetable_hours_keep_their_order() {
        let json = r#"{"day":"Monday","hours":{"1":"Math","2":"Phy","10":"Math"}}"#;
        let row: TimeTableDay = serde_json::from_str(json).unwrap();
        let labels: Vec<_> = row.hours.iter().map(|s| s.hour.as_str()).collect();
        assert_eq!(labels, ["1", "2", "10"]);
        assert_eq!(serde_json::to_string(&row).unwrap(), json);
    }

    #[test]
    fn parse_date_accepts_plain_and_timestamp_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(parse_date("2024-01-10").unwrap(), expected);
        assert_eq!(parse_date("2024-01-10T00:00:00Z").unwrap(), expected);
        assert!(matches!(parse_date("10/01/2024"), Err(CoreError::InvalidInput(_))));
    }
}
