//! services/api/src/web/rest.rs
//!
//! Assembles the REST router and the master OpenAPI document.

use crate::web::state::AppState;
use crate::web::{attendance, auth, insights, marks, registry};
use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        attendance::check_attendance_handler,
        attendance::mark_attendance_handler,
        attendance::class_schedule_handler,
        attendance::student_attendance_handler,
        attendance::student_subject_attendance_handler,
        marks::subject_marks_handler,
        marks::update_marks_handler,
        insights::lecturer_insights_handler,
        insights::class_insight_handler,
        registry::list_classes_handler,
        registry::get_class_handler,
        registry::add_class_handler,
        registry::add_student_handler,
        registry::class_students_handler,
        registry::add_lecturer_handler,
        registry::list_lecturers_handler,
        registry::get_lecturer_handler,
        registry::list_assignments_handler,
        registry::assign_subject_handler,
        registry::find_assignment_handler,
        auth::lecturer_login_handler,
        auth::student_login_handler,
    ),
    components(
        schemas(
            SuccessResponse,
            crate::error::ErrorBody,
            attendance::CheckResponse,
            attendance::PresenceEntry,
            attendance::MarkAttendanceRequest,
            attendance::ScheduleResponse,
            attendance::AttendanceRecordResponse,
            attendance::StudentAttendanceResponse,
            attendance::SubjectAttendanceResponse,
            marks::MarksEntry,
            marks::StudentMarksResponse,
            marks::UpdateMarksRequest,
            insights::BelowThresholdCounts,
            insights::BelowThresholdPercentages,
            insights::LecturerInsightResponse,
            insights::ClassInfoResponse,
            insights::StudentInsightResponse,
            insights::ClassInsightResponse,
            registry::ClassResponse,
            registry::AddClassRequest,
            registry::AddStudentRequest,
            registry::StudentResponse,
            registry::AddLecturerRequest,
            registry::LecturerResponse,
            registry::LecturerSummary,
            registry::AssignSubjectRequest,
            registry::AssignmentResponse,
            auth::LecturerLoginRequest,
            auth::LecturerLoginResponse,
            auth::StudentLoginRequest,
            auth::StudentLoginResponse,
        )
    ),
    tags(
        (name = "Attendance API", description = "Hour-wise attendance, marks and lecturer insights for classes.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Shared Payloads
//=========================================================================================

/// The body returned by writes that have nothing else to report.
#[derive(Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// GET /healthz - Liveness check
#[utoipa::path(
    get,
    path = "/healthz",
    responses((status = 200, description = "The service is up", body = SuccessResponse))
)]
pub async fn health_handler() -> Json<SuccessResponse> {
    Json(SuccessResponse::ok())
}

//=========================================================================================
// Router
//=========================================================================================

/// Every REST route, bound to the shared state. Cross-cutting layers (CORS,
/// Swagger UI) are added by the binary.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        // Attendance
        .route("/api/attendance/check", get(attendance::check_attendance_handler))
        .route("/api/attendance/mark", post(attendance::mark_attendance_handler))
        .route("/api/class/schedule", get(attendance::class_schedule_handler))
        .route(
            "/api/student-attendance/{roll_number}",
            get(attendance::student_attendance_handler),
        )
        .route(
            "/api/student-subject-attendance/{roll_number}",
            get(attendance::student_subject_attendance_handler),
        )
        // Marks
        .route("/api/marks/update", post(marks::update_marks_handler))
        .route("/api/marks/{class_id}/{subject}", get(marks::subject_marks_handler))
        // Insights
        .route(
            "/api/insights/general/{lecturer_id}",
            get(insights::lecturer_insights_handler),
        )
        .route(
            "/api/insights/class/{class_id}/{lecturer_id}",
            get(insights::class_insight_handler),
        )
        // Registry
        .route("/api/classes", get(registry::list_classes_handler))
        .route("/api/classes/{class_id}", get(registry::get_class_handler))
        .route("/add-class", post(registry::add_class_handler))
        .route("/api/add-student", post(registry::add_student_handler))
        .route("/api/students/{class_id}", get(registry::class_students_handler))
        .route("/api/add-lecturer", post(registry::add_lecturer_handler))
        .route("/api/lecturers", get(registry::list_lecturers_handler))
        .route("/api/lecturer/{username}", get(registry::get_lecturer_handler))
        .route(
            "/api/subject-assignments",
            get(registry::list_assignments_handler).post(registry::assign_subject_handler),
        )
        .route(
            "/api/subject-assignments/find",
            get(registry::find_assignment_handler),
        )
        // Logins
        .route("/lecturer-login", post(auth::lecturer_login_handler))
        .route("/login", post(auth::student_login_handler))
        .with_state(state)
}
