//! services/api/src/web/attendance.rs
//!
//! Attendance endpoints: the marked-guard, hour marking, the timetable lookup
//! and a student's own attendance views.

use crate::error::{reject, reject_write, Rejection};
use crate::web::rest::SuccessResponse;
use crate::web::extract::{JsonBody, PathParams, QueryParams};
use crate::web::state::AppState;
use attendance_core::attendance::{AttendanceLine, MarkRequest, OverallAttendance};
use attendance_core::domain::{parse_date, StudentPresence};
use attendance_core::insights::StudentSubjectInsight;
use axum::{
    extract::State,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CheckQuery {
    #[serde(rename = "classID")]
    pub class_id: String,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp.
    pub date: String,
    pub hour: String,
}

#[derive(Serialize, ToSchema)]
pub struct CheckResponse {
    pub updated: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct PresenceEntry {
    pub rollnumber: String,
    #[serde(rename = "isPresent")]
    pub is_present: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct MarkAttendanceRequest {
    #[serde(rename = "classID")]
    pub class_id: String,
    pub date: String,
    pub hour: String,
    pub subject: String,
    pub lecturer_id: Uuid,
    pub student_data: Vec<PresenceEntry>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScheduleQuery {
    #[serde(rename = "classID")]
    pub class_id: String,
    pub date: String,
    pub subject: String,
}

#[derive(Serialize, ToSchema)]
pub struct ScheduleResponse {
    pub hours: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceRecordResponse {
    #[serde(rename = "classID")]
    pub class_id: String,
    pub date: NaiveDate,
    pub day: String,
    pub hour: String,
    pub subject: String,
    #[serde(rename = "isPresent")]
    pub is_present: bool,
}

impl From<AttendanceLine> for AttendanceRecordResponse {
    fn from(line: AttendanceLine) -> Self {
        Self {
            class_id: line.class_id,
            date: line.date,
            day: line.day,
            hour: line.hour,
            subject: line.subject,
            is_present: line.is_present,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentAttendanceResponse {
    pub total_hours: usize,
    pub attended_hours: usize,
    pub attendance_percentage: f64,
    pub attendance_records: Vec<AttendanceRecordResponse>,
}

impl From<OverallAttendance> for StudentAttendanceResponse {
    fn from(overall: OverallAttendance) -> Self {
        Self {
            total_hours: overall.total_hours,
            attended_hours: overall.attended_hours,
            attendance_percentage: overall.attendance_percentage,
            attendance_records: overall
                .attendance_records
                .into_iter()
                .map(AttendanceRecordResponse::from)
                .collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAttendanceResponse {
    pub subject: String,
    pub lecturer: String,
    pub total_classes: usize,
    pub attended_classes: usize,
    pub attendance_percentage: f64,
}

impl From<StudentSubjectInsight> for SubjectAttendanceResponse {
    fn from(insight: StudentSubjectInsight) -> Self {
        Self {
            subject: insight.subject,
            lecturer: insight.lecturer,
            total_classes: insight.attendance.total_classes,
            attended_classes: insight.attendance.attended_classes,
            attendance_percentage: insight.attendance.attendance_percentage,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/attendance/check - Whether an hour-slot is already marked
#[utoipa::path(
    get,
    path = "/api/attendance/check",
    params(CheckQuery),
    responses(
        (status = 200, description = "Marked-guard state", body = CheckResponse),
        (status = 400, description = "Malformed date", body = crate::error::ErrorBody)
    )
)]
pub async fn check_attendance_handler(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<CheckQuery>,
) -> Result<Json<CheckResponse>, Rejection> {
    let date = parse_date(&query.date).map_err(reject)?;
    let updated = state
        .attendance()
        .check_marked(&query.class_id, date, &query.hour)
        .await
        .map_err(reject)?;
    Ok(Json(CheckResponse { updated }))
}

/// POST /api/attendance/mark - Mark one hour-slot for a class
#[utoipa::path(
    post,
    path = "/api/attendance/mark",
    request_body = MarkAttendanceRequest,
    responses(
        (status = 200, description = "Attendance recorded", body = SuccessResponse),
        (status = 400, description = "Already marked, unknown class or malformed input", body = crate::error::ErrorBody),
        (status = 500, description = "Storage failure", body = crate::error::ErrorBody)
    )
)]
pub async fn mark_attendance_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<MarkAttendanceRequest>,
) -> Result<Json<SuccessResponse>, Rejection> {
    let date = parse_date(&req.date).map_err(reject_write)?;
    let request = MarkRequest {
        class_id: req.class_id,
        date,
        hour: req.hour,
        subject: req.subject,
        lecturer_id: req.lecturer_id,
        student_data: req
            .student_data
            .into_iter()
            .map(|p| StudentPresence {
                rollnumber: p.rollnumber,
                is_present: p.is_present,
            })
            .collect(),
    };

    state
        .attendance()
        .mark_attendance(request)
        .await
        .map_err(reject_write)?;
    Ok(Json(SuccessResponse::ok()))
}

/// GET /api/class/schedule - Hour labels scheduled for a subject on a date
#[utoipa::path(
    get,
    path = "/api/class/schedule",
    params(ScheduleQuery),
    responses(
        (status = 200, description = "Matching hour labels", body = ScheduleResponse),
        (status = 400, description = "Malformed date or no timetable row for that day", body = crate::error::ErrorBody),
        (status = 404, description = "Class not found", body = crate::error::ErrorBody)
    )
)]
pub async fn class_schedule_handler(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<ScheduleQuery>,
) -> Result<Json<ScheduleResponse>, Rejection> {
    let date = parse_date(&query.date).map_err(reject)?;
    let hours = state
        .schedule()
        .subject_hours(&query.class_id, date, &query.subject)
        .await
        .map_err(reject)?;
    Ok(Json(ScheduleResponse { hours }))
}

/// GET /api/student-attendance/{roll_number} - A student's overall attendance
#[utoipa::path(
    get,
    path = "/api/student-attendance/{roll_number}",
    params(("roll_number" = String, Path, description = "The student's roll number.")),
    responses(
        (status = 200, description = "Overall attendance", body = StudentAttendanceResponse),
        (status = 500, description = "Storage failure", body = crate::error::ErrorBody)
    )
)]
pub async fn student_attendance_handler(
    State(state): State<Arc<AppState>>,
    PathParams(roll_number): PathParams<String>,
) -> Result<Json<StudentAttendanceResponse>, Rejection> {
    let overall = state
        .attendance()
        .student_overall_attendance(&roll_number)
        .await
        .map_err(reject)?;
    Ok(Json(overall.into()))
}

/// GET /api/student-subject-attendance/{roll_number} - Attendance per assigned subject
#[utoipa::path(
    get,
    path = "/api/student-subject-attendance/{roll_number}",
    params(("roll_number" = String, Path, description = "The student's roll number.")),
    responses(
        (status = 200, description = "Attendance per subject", body = [SubjectAttendanceResponse]),
        (status = 404, description = "Student or class not found", body = crate::error::ErrorBody)
    )
)]
pub async fn student_subject_attendance_handler(
    State(state): State<Arc<AppState>>,
    PathParams(roll_number): PathParams<String>,
) -> Result<Json<Vec<SubjectAttendanceResponse>>, Rejection> {
    let insights = state
        .insights()
        .student_subject_insights(&roll_number)
        .await
        .map_err(reject)?;
    Ok(Json(insights.into_iter().map(SubjectAttendanceResponse::from).collect()))
}
