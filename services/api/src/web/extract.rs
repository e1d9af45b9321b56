//! services/api/src/web/extract.rs
//!
//! Extractors that wrap axum's `Json`, `Query` and `Path` so malformed input
//! is answered with the same `{"success": false, "error": ...}` body and a 400
//! as every other rejected request.

use crate::error::{rejection, Rejection};
use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::{request::Parts, StatusCode},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::warn;

fn malformed(what: &str, detail: String) -> Rejection {
    warn!("Rejected malformed {}: {}", what, detail);
    rejection(StatusCode::BAD_REQUEST, format!("Invalid input: {}", detail))
}

/// A JSON request body.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(e) => Err(malformed("request body", e.body_text())),
        }
    }
}

/// Query-string parameters.
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(e) => Err(malformed("query string", e.body_text())),
        }
    }
}

/// Path segments, e.g. a lecturer id that must parse as a UUID.
pub struct PathParams<T>(pub T);

impl<T, S> FromRequestParts<S> for PathParams<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(e) => Err(malformed("path", e.body_text())),
        }
    }
}
