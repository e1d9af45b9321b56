//! services/api/src/web/marks.rs
//!
//! Marks endpoints: per-subject class listings and upserts.

use crate::error::{reject, reject_write, Rejection};
use crate::web::rest::SuccessResponse;
use crate::web::extract::{JsonBody, PathParams};
use crate::web::state::AppState;
use attendance_core::domain::SubjectMarks;
use attendance_core::marks::StudentMarks;
use axum::{
    extract::State,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct MarksEntry {
    pub subject: String,
    #[serde(rename = "CIE1")]
    pub cie1: f64,
    #[serde(rename = "CIE2")]
    pub cie2: f64,
    #[serde(rename = "Assignment")]
    pub assignment: f64,
}

impl From<SubjectMarks> for MarksEntry {
    fn from(marks: SubjectMarks) -> Self {
        Self {
            subject: marks.subject,
            cie1: marks.cie1,
            cie2: marks.cie2,
            assignment: marks.assignment,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct StudentMarksResponse {
    pub student_id: Uuid,
    pub rollnumber: String,
    pub name: String,
    pub marks: MarksEntry,
}

impl From<StudentMarks> for StudentMarksResponse {
    fn from(row: StudentMarks) -> Self {
        Self {
            student_id: row.student_id,
            rollnumber: row.rollnumber,
            name: row.name,
            marks: row.marks.into(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateMarksRequest {
    pub student_id: Uuid,
    pub subject: String,
    #[serde(rename = "CIE1", default)]
    pub cie1: f64,
    #[serde(rename = "CIE2", default)]
    pub cie2: f64,
    #[serde(rename = "Assignment", default)]
    pub assignment: f64,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/marks/{class_id}/{subject} - Marks of every student in a class for a subject
#[utoipa::path(
    get,
    path = "/api/marks/{class_id}/{subject}",
    params(
        ("class_id" = String, Path, description = "The class ID."),
        ("subject" = String, Path, description = "The subject name.")
    ),
    responses(
        (status = 200, description = "Marks per student; missing marks read as zero", body = [StudentMarksResponse]),
        (status = 500, description = "Storage failure", body = crate::error::ErrorBody)
    )
)]
pub async fn subject_marks_handler(
    State(state): State<Arc<AppState>>,
    PathParams((class_id, subject)): PathParams<(String, String)>,
) -> Result<Json<Vec<StudentMarksResponse>>, Rejection> {
    let rows = state
        .marks()
        .subject_marks(&class_id, &subject)
        .await
        .map_err(reject)?;
    Ok(Json(rows.into_iter().map(StudentMarksResponse::from).collect()))
}

/// POST /api/marks/update - Create or replace a student's marks for a subject
#[utoipa::path(
    post,
    path = "/api/marks/update",
    request_body = UpdateMarksRequest,
    responses(
        (status = 200, description = "Marks stored", body = SuccessResponse),
        (status = 400, description = "Unknown student or invalid scores", body = crate::error::ErrorBody)
    )
)]
pub async fn update_marks_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<UpdateMarksRequest>,
) -> Result<Json<SuccessResponse>, Rejection> {
    let entry = SubjectMarks {
        subject: req.subject,
        cie1: req.cie1,
        cie2: req.cie2,
        assignment: req.assignment,
    };
    state
        .marks()
        .upsert_marks(req.student_id, entry)
        .await
        .map_err(reject_write)?;
    Ok(Json(SuccessResponse::ok()))
}
