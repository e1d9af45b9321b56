//! services/api/src/web/registry.rs
//!
//! Administrative endpoints for classes, students, lecturers and subject
//! assignments.

use crate::error::{reject, reject_write, Rejection};
use crate::web::auth::hash_password;
use crate::web::extract::{JsonBody, PathParams, QueryParams};
use crate::web::state::AppState;
use attendance_core::domain::{Class, Lecturer, Student, SubjectAssignment, TimeTableDay};
use attendance_core::error::CoreError;
use attendance_core::registry::{NewClass, NewLecturer, NewStudent};
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct ClassResponse {
    #[serde(rename = "classID")]
    pub class_id: String,
    pub branch: String,
    pub semester: u32,
    pub subjects: Vec<String>,
    /// Day rows; `hours` maps hour labels to subjects in teaching order.
    #[serde(rename = "timeTable")]
    #[schema(value_type = Vec<Object>)]
    pub time_table: Vec<TimeTableDay>,
}

impl From<Class> for ClassResponse {
    fn from(class: Class) -> Self {
        Self {
            class_id: class.class_id,
            branch: class.branch,
            semester: class.semester,
            subjects: class.subjects,
            time_table: class.time_table,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct AddClassRequest {
    #[serde(rename = "classID")]
    pub class_id: String,
    pub branch: String,
    pub semester: u32,
    pub subjects: Vec<String>,
    #[serde(rename = "timeTable", default)]
    #[schema(value_type = Vec<Object>)]
    pub time_table: Vec<TimeTableDay>,
}

#[derive(Deserialize, ToSchema)]
pub struct AddStudentRequest {
    pub rollnumber: String,
    pub name: String,
    #[serde(rename = "class")]
    pub class_id: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct StudentResponse {
    pub student_id: Uuid,
    pub rollnumber: String,
    pub name: String,
    #[serde(rename = "class")]
    pub class_id: String,
}

impl From<Student> for StudentResponse {
    fn from(student: Student) -> Self {
        Self {
            student_id: student.student_id,
            rollnumber: student.rollnumber,
            name: student.name,
            class_id: student.class_id,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct AddLecturerRequest {
    pub username: String,
    pub name: String,
    #[serde(rename = "classesTaught", default)]
    pub classes_taught: Vec<String>,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LecturerResponse {
    pub lecturer_id: Uuid,
    pub username: String,
    pub name: String,
    #[serde(rename = "classesTaught")]
    pub classes_taught: Vec<String>,
}

impl From<Lecturer> for LecturerResponse {
    fn from(lecturer: Lecturer) -> Self {
        Self {
            lecturer_id: lecturer.lecturer_id,
            username: lecturer.username,
            name: lecturer.name,
            classes_taught: lecturer.classes_taught,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LecturerSummary {
    pub lecturer_id: Uuid,
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct AssignSubjectRequest {
    #[serde(rename = "classID")]
    pub class_id: String,
    pub subject: String,
    pub lecturer_id: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct AssignmentResponse {
    #[serde(rename = "classID")]
    pub class_id: String,
    pub subject: String,
    pub lecturer_id: Uuid,
    pub lecturer_name: String,
}

impl From<SubjectAssignment> for AssignmentResponse {
    fn from(assignment: SubjectAssignment) -> Self {
        Self {
            class_id: assignment.class_id,
            subject: assignment.subject,
            lecturer_id: assignment.lecturer_id,
            lecturer_name: assignment.lecturer_name,
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FindAssignmentQuery {
    #[serde(rename = "classID")]
    pub class_id: String,
    pub lecturer_id: Uuid,
}

//=========================================================================================
// Classes
//=========================================================================================

/// GET /api/classes - All class IDs
#[utoipa::path(
    get,
    path = "/api/classes",
    responses((status = 200, description = "Class IDs", body = [String]))
)]
pub async fn list_classes_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, Rejection> {
    let classes = state.registry().classes().await.map_err(reject)?;
    Ok(Json(classes.into_iter().map(|c| c.class_id).collect()))
}

/// GET /api/classes/{class_id} - One class with its timetable
#[utoipa::path(
    get,
    path = "/api/classes/{class_id}",
    params(("class_id" = String, Path, description = "The class ID.")),
    responses(
        (status = 200, description = "The class", body = ClassResponse),
        (status = 404, description = "Class not found", body = crate::error::ErrorBody)
    )
)]
pub async fn get_class_handler(
    State(state): State<Arc<AppState>>,
    PathParams(class_id): PathParams<String>,
) -> Result<Json<ClassResponse>, Rejection> {
    let class = state.registry().class(&class_id).await.map_err(reject)?;
    Ok(Json(class.into()))
}

/// POST /add-class - Register a class
#[utoipa::path(
    post,
    path = "/add-class",
    request_body = AddClassRequest,
    responses(
        (status = 201, description = "Class created", body = ClassResponse),
        (status = 400, description = "Missing fields or duplicate class", body = crate::error::ErrorBody)
    )
)]
pub async fn add_class_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<AddClassRequest>,
) -> Result<(StatusCode, Json<ClassResponse>), Rejection> {
    let class = state
        .registry()
        .add_class(NewClass {
            class_id: req.class_id,
            branch: req.branch,
            semester: req.semester,
            subjects: req.subjects,
            time_table: req.time_table,
        })
        .await
        .map_err(reject_write)?;
    Ok((StatusCode::CREATED, Json(class.into())))
}

//=========================================================================================
// Students
//=========================================================================================

/// POST /api/add-student - Register a student in an existing class
#[utoipa::path(
    post,
    path = "/api/add-student",
    request_body = AddStudentRequest,
    responses(
        (status = 201, description = "Student created", body = StudentResponse),
        (status = 400, description = "Unknown class or duplicate roll number", body = crate::error::ErrorBody)
    )
)]
pub async fn add_student_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<AddStudentRequest>,
) -> Result<(StatusCode, Json<StudentResponse>), Rejection> {
    let password_hash = hash_password(&req.password)?;
    let student = state
        .registry()
        .add_student(NewStudent {
            rollnumber: req.rollnumber,
            name: req.name,
            class_id: req.class_id,
            password_hash,
        })
        .await
        .map_err(reject_write)?;
    Ok((StatusCode::CREATED, Json(student.into())))
}

/// GET /api/students/{class_id} - Students of a class ordered by roll number
#[utoipa::path(
    get,
    path = "/api/students/{class_id}",
    params(("class_id" = String, Path, description = "The class ID.")),
    responses((status = 200, description = "Students", body = [StudentResponse]))
)]
pub async fn class_students_handler(
    State(state): State<Arc<AppState>>,
    PathParams(class_id): PathParams<String>,
) -> Result<Json<Vec<StudentResponse>>, Rejection> {
    let students = state
        .registry()
        .students_in_class(&class_id)
        .await
        .map_err(reject)?;
    Ok(Json(students.into_iter().map(StudentResponse::from).collect()))
}

//=========================================================================================
// Lecturers
//=========================================================================================

/// POST /api/add-lecturer - Register a lecturer
#[utoipa::path(
    post,
    path = "/api/add-lecturer",
    request_body = AddLecturerRequest,
    responses(
        (status = 201, description = "Lecturer created", body = LecturerResponse),
        (status = 400, description = "Missing fields or duplicate username", body = crate::error::ErrorBody)
    )
)]
pub async fn add_lecturer_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<AddLecturerRequest>,
) -> Result<(StatusCode, Json<LecturerResponse>), Rejection> {
    let password_hash = hash_password(&req.password)?;
    let lecturer = state
        .registry()
        .add_lecturer(NewLecturer {
            username: req.username,
            name: req.name,
            classes_taught: req.classes_taught,
            password_hash,
        })
        .await
        .map_err(reject_write)?;
    Ok((StatusCode::CREATED, Json(lecturer.into())))
}

/// GET /api/lecturers - Every lecturer's ID and name
#[utoipa::path(
    get,
    path = "/api/lecturers",
    responses((status = 200, description = "Lecturers", body = [LecturerSummary]))
)]
pub async fn list_lecturers_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LecturerSummary>>, Rejection> {
    let lecturers = state.registry().lecturers().await.map_err(reject)?;
    Ok(Json(
        lecturers
            .into_iter()
            .map(|l| LecturerSummary {
                lecturer_id: l.lecturer_id,
                name: l.name,
            })
            .collect(),
    ))
}

/// GET /api/lecturer/{username} - A lecturer by username
#[utoipa::path(
    get,
    path = "/api/lecturer/{username}",
    params(("username" = String, Path, description = "The lecturer's username.")),
    responses(
        (status = 200, description = "The lecturer", body = LecturerResponse),
        (status = 404, description = "Lecturer not found", body = crate::error::ErrorBody)
    )
)]
pub async fn get_lecturer_handler(
    State(state): State<Arc<AppState>>,
    PathParams(username): PathParams<String>,
) -> Result<Json<LecturerResponse>, Rejection> {
    let lecturer = state
        .registry()
        .lecturer_by_username(&username)
        .await
        .map_err(reject)?;
    Ok(Json(lecturer.into()))
}

//=========================================================================================
// Subject Assignments
//=========================================================================================

/// GET /api/subject-assignments - Every subject assignment
#[utoipa::path(
    get,
    path = "/api/subject-assignments",
    responses((status = 200, description = "Assignments", body = [AssignmentResponse]))
)]
pub async fn list_assignments_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AssignmentResponse>>, Rejection> {
    let assignments = state.assignments().list().await.map_err(reject)?;
    Ok(Json(assignments.into_iter().map(AssignmentResponse::from).collect()))
}

/// POST /api/subject-assignments - Assign a class subject to a lecturer
#[utoipa::path(
    post,
    path = "/api/subject-assignments",
    request_body = AssignSubjectRequest,
    responses(
        (status = 201, description = "Assignment created", body = AssignmentResponse),
        (status = 400, description = "Unknown class, subject or lecturer, or already assigned", body = crate::error::ErrorBody)
    )
)]
pub async fn assign_subject_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<AssignSubjectRequest>,
) -> Result<(StatusCode, Json<AssignmentResponse>), Rejection> {
    let assignment = state
        .assignments()
        .assign(&req.class_id, &req.subject, req.lecturer_id)
        .await
        .map_err(reject_write)?;
    Ok((StatusCode::CREATED, Json(assignment.into())))
}

/// GET /api/subject-assignments/find - The assignment a lecturer holds in a class
#[utoipa::path(
    get,
    path = "/api/subject-assignments/find",
    params(FindAssignmentQuery),
    responses(
        (status = 200, description = "The assignment", body = AssignmentResponse),
        (status = 404, description = "No assignment for that lecturer in the class", body = crate::error::ErrorBody)
    )
)]
pub async fn find_assignment_handler(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<FindAssignmentQuery>,
) -> Result<Json<AssignmentResponse>, Rejection> {
    let found = state
        .assignments()
        .resolve_lecturer(&query.class_id, query.lecturer_id)
        .await
        .map_err(reject)?;
    match found {
        Some(assignment) => Ok(Json(assignment.into())),
        None => Err(reject(CoreError::AssignmentNotFound(format!(
            "lecturer {} in class {}",
            query.lecturer_id, query.class_id
        )))),
    }
}
