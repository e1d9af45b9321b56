//! services/api/src/web/auth.rs
//!
//! Password hashing and the lecturer and student login endpoints.

use crate::error::{reject, rejection, Rejection};
use crate::web::extract::JsonBody;
use crate::web::state::AppState;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use attendance_core::error::CoreError;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

//=========================================================================================
// Password Hashing
//=========================================================================================

pub fn hash_password(password: &str) -> Result<String, Rejection> {
    if password.is_empty() {
        return Err(rejection(StatusCode::BAD_REQUEST, "password is required"));
    }
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            rejection(StatusCode::INTERNAL_SERVER_ERROR, "Failed to hash password")
        })
}

/// A stored hash that cannot be parsed never verifies.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            error!("Failed to parse stored password hash: {:?}", e);
            false
        }
    }
}

/// Unknown accounts and wrong passwords are indistinguishable to the caller.
fn unauthorized(err: CoreError) -> Rejection {
    if err.is_not_found() {
        warn!("Login failed: {}", err);
        rejection(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS)
    } else {
        reject(err)
    }
}

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LecturerLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LecturerLoginResponse {
    pub success: bool,
    pub lecturer_id: Uuid,
    pub username: String,
    pub name: String,
    #[serde(rename = "classesTaught")]
    pub classes_taught: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct StudentLoginRequest {
    pub rollnumber: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct StudentLoginResponse {
    pub success: bool,
    pub student_id: Uuid,
    pub rollnumber: String,
    pub name: String,
    #[serde(rename = "class")]
    pub class_id: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /lecturer-login - Log a lecturer in by username
#[utoipa::path(
    post,
    path = "/lecturer-login",
    request_body = LecturerLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LecturerLoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorBody)
    )
)]
pub async fn lecturer_login_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<LecturerLoginRequest>,
) -> Result<Json<LecturerLoginResponse>, Rejection> {
    let lecturer = state
        .registry()
        .lecturer_by_username(&req.username)
        .await
        .map_err(unauthorized)?;

    if !verify_password(&req.password, &lecturer.password_hash) {
        warn!("Wrong password for lecturer {}", req.username);
        return Err(rejection(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS));
    }

    info!("Lecturer {} logged in", lecturer.username);
    Ok(Json(LecturerLoginResponse {
        success: true,
        lecturer_id: lecturer.lecturer_id,
        username: lecturer.username,
        name: lecturer.name,
        classes_taught: lecturer.classes_taught,
    }))
}

/// POST /login - Log a student in by roll number
#[utoipa::path(
    post,
    path = "/login",
    request_body = StudentLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = StudentLoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorBody)
    )
)]
pub async fn student_login_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<StudentLoginRequest>,
) -> Result<Json<StudentLoginResponse>, Rejection> {
    let student = state
        .registry()
        .student(&req.rollnumber)
        .await
        .map_err(unauthorized)?;

    if !verify_password(&req.password, &student.password_hash) {
        warn!("Wrong password for student {}", req.rollnumber);
        return Err(rejection(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS));
    }

    info!("Student {} logged in", student.rollnumber);
    Ok(Json(StudentLoginResponse {
        success: true,
        student_id: student.student_id,
        rollnumber: student.rollnumber,
        name: student.name,
        class_id: student.class_id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_verify_only_their_own_password() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("guess", &hash));
        assert!(!verify_password("s3cret", "plaintext-not-a-hash"));
    }

    #[test]
    fn empty_passwords_are_rejected() {
        let (status, _) = hash_password("").unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
