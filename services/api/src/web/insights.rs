//! services/api/src/web/insights.rs
//!
//! Lecturer dashboard insights.

use crate::error::{reject, Rejection};
use crate::web::marks::MarksEntry;
use crate::web::extract::PathParams;
use crate::web::state::AppState;
use attendance_core::insights::{ClassInsight, LecturerInsight};
use attendance_core::stats::{BelowThreshold, BelowThresholdShare};
use axum::{
    extract::State,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct BelowThresholdCounts {
    pub cie1: usize,
    pub cie2: usize,
    pub overall: usize,
}

impl From<BelowThreshold> for BelowThresholdCounts {
    fn from(counts: BelowThreshold) -> Self {
        Self {
            cie1: counts.cie1,
            cie2: counts.cie2,
            overall: counts.overall,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct BelowThresholdPercentages {
    pub cie1: f64,
    pub cie2: f64,
    pub overall: f64,
}

impl From<BelowThresholdShare> for BelowThresholdPercentages {
    fn from(share: BelowThresholdShare) -> Self {
        Self {
            cie1: share.cie1,
            cie2: share.cie2,
            overall: share.overall,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LecturerInsightResponse {
    #[serde(rename = "classID")]
    pub class_id: String,
    pub subject: String,
    pub student_count: usize,
    pub total_hours: usize,
    pub total_presentees: usize,
    pub avg_presentees: f64,
    pub presentee_percentage: f64,
    pub below_threshold: BelowThresholdCounts,
    pub below_threshold_percentage: BelowThresholdPercentages,
}

impl From<LecturerInsight> for LecturerInsightResponse {
    fn from(insight: LecturerInsight) -> Self {
        Self {
            class_id: insight.class_id,
            subject: insight.subject,
            student_count: insight.student_count,
            total_hours: insight.total_hours,
            total_presentees: insight.total_presentees,
            avg_presentees: insight.avg_presentees,
            presentee_percentage: insight.presentee_percentage,
            below_threshold: insight.below_threshold.into(),
            below_threshold_percentage: insight.below_threshold_percentage.into(),
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfoResponse {
    #[serde(rename = "classID")]
    pub class_id: String,
    pub branch: String,
    pub semester: u32,
    pub subject: String,
    pub lecturer_name: String,
    pub total_hours: usize,
    pub student_count: usize,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentInsightResponse {
    #[serde(rename = "student_id")]
    pub student_id: Uuid,
    pub rollnumber: String,
    pub name: String,
    pub attended_hours: usize,
    pub attendance_percentage: f64,
    pub marks: MarksEntry,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassInsightResponse {
    pub class_info: ClassInfoResponse,
    pub student_data: Vec<StudentInsightResponse>,
}

impl From<ClassInsight> for ClassInsightResponse {
    fn from(insight: ClassInsight) -> Self {
        let info = insight.class_info;
        Self {
            class_info: ClassInfoResponse {
                class_id: info.class_id,
                branch: info.branch,
                semester: info.semester,
                subject: info.subject,
                lecturer_name: info.lecturer_name,
                total_hours: info.total_hours,
                student_count: info.student_count,
            },
            student_data: insight
                .student_data
                .into_iter()
                .map(|s| StudentInsightResponse {
                    student_id: s.student_id,
                    rollnumber: s.rollnumber,
                    name: s.name,
                    attended_hours: s.attended_hours,
                    attendance_percentage: s.attendance_percentage,
                    marks: s.marks.into(),
                })
                .collect(),
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/insights/general/{lecturer_id} - One summary per class the lecturer teaches
#[utoipa::path(
    get,
    path = "/api/insights/general/{lecturer_id}",
    params(("lecturer_id" = Uuid, Path, description = "The lecturer's ID.")),
    responses(
        (status = 200, description = "Per-class summaries", body = [LecturerInsightResponse]),
        (status = 404, description = "Lecturer not found", body = crate::error::ErrorBody)
    )
)]
pub async fn lecturer_insights_handler(
    State(state): State<Arc<AppState>>,
    PathParams(lecturer_id): PathParams<Uuid>,
) -> Result<Json<Vec<LecturerInsightResponse>>, Rejection> {
    let insights = state
        .insights()
        .lecturer_insights(lecturer_id)
        .await
        .map_err(reject)?;
    Ok(Json(insights.into_iter().map(LecturerInsightResponse::from).collect()))
}

/// GET /api/insights/class/{class_id}/{lecturer_id} - Per-student breakdown for one class
#[utoipa::path(
    get,
    path = "/api/insights/class/{class_id}/{lecturer_id}",
    params(
        ("class_id" = String, Path, description = "The class ID."),
        ("lecturer_id" = Uuid, Path, description = "The lecturer's ID.")
    ),
    responses(
        (status = 200, description = "Class summary and per-student data", body = ClassInsightResponse),
        (status = 404, description = "Class or assignment not found", body = crate::error::ErrorBody)
    )
)]
pub async fn class_insight_handler(
    State(state): State<Arc<AppState>>,
    PathParams((class_id, lecturer_id)): PathParams<(String, Uuid)>,
) -> Result<Json<ClassInsightResponse>, Rejection> {
    let insight = state
        .insights()
        .class_insight(&class_id, lecturer_id)
        .await
        .map_err(reject)?;
    Ok(Json(insight.into()))
}
