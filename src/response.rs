use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::store::StoreEntry;

#[derive(Debug, PartialEq, Eq)]
pub enum AddResponse {
    Added,
    AlreadyExists,
}

#[derive(Debug, PartialEq, Eq)]
pub enum UpdateResponse {
    Updated,
    NotFound,
}

#[derive(Debug, PartialEq, Eq)]
pub enum UnblockResponse {
    /// Carries the newly computed release date.
    Scheduled(u64),
    NotFound,
}

#[derive(Debug, PartialEq, Eq)]
pub enum BlockResponse {
    Blocked,
    NotFound,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ContentResponse<'store> {
    Released(&'store str),
    NotFound,
    /// The entry is locked: no unblock was requested, or it was blocked again.
    NoUnblockRequested,
    /// An unblock was requested but the release date hasn't passed yet.
    NotYetAvailable(u64),
}

#[derive(Debug, PartialEq, Eq)]
pub enum InfoResponse<'store> {
    Found(&'store StoreEntry),
    NotFound,
    ContentMismatch,
}

const NOT_FOUND_MESSAGE: &str = "Not Found: resource with given key does not exist";

fn message(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

impl IntoResponse for AddResponse {
    fn into_response(self) -> Response {
        match self {
            AddResponse::Added => message(StatusCode::OK, "OK"),
            AddResponse::AlreadyExists => message(
                StatusCode::CONFLICT,
                "a resource with this key already exists",
            ),
        }
    }
}

impl IntoResponse for UpdateResponse {
    fn into_response(self) -> Response {
        match self {
            UpdateResponse::Updated => message(StatusCode::OK, "updated"),
            UpdateResponse::NotFound => message(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE),
        }
    }
}

impl IntoResponse for UnblockResponse {
    fn into_response(self) -> Response {
        match self {
            UnblockResponse::Scheduled(release_date) => (
                StatusCode::OK,
                Json(json!({ "message": "OK", "releaseDate": release_date })),
            )
                .into_response(),
            UnblockResponse::NotFound => message(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE),
        }
    }
}

impl IntoResponse for BlockResponse {
    fn into_response(self) -> Response {
        match self {
            BlockResponse::Blocked => message(StatusCode::OK, "OK"),
            BlockResponse::NotFound => message(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE),
        }
    }
}

impl IntoResponse for ContentResponse<'_> {
    fn into_response(self) -> Response {
        match self {
            ContentResponse::Released(content) => (
                StatusCode::OK,
                Json(json!({ "message": "OK", "content": content })),
            )
                .into_response(),
            ContentResponse::NotFound => message(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE),
            ContentResponse::NoUnblockRequested => message(
                StatusCode::PRECONDITION_FAILED,
                "Precondition Failed: no request to unblock the resource has been made",
            ),
            ContentResponse::NotYetAvailable(release_date) => (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "message": "Forbidden: resource is requested to be available in the future, but is not available yet.",
                    "releaseDate": release_date,
                })),
            )
                .into_response(),
        }
    }
}

impl IntoResponse for InfoResponse<'_> {
    fn into_response(self) -> Response {
        match self {
            InfoResponse::Found(entry) => (StatusCode::OK, Json(entry)).into_response(),
            InfoResponse::NotFound => message(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE),
            InfoResponse::ContentMismatch => message(
                StatusCode::FORBIDDEN,
                "Forbidden: content must be the same as content of resource with given key.",
            ),
        }
    }
}

/// A request that never reached the store: bad shape, or a failed write.
#[derive(Debug)]
pub enum ErrorResponse {
    BadRequest(String),
    NotFound,
    Internal(String),
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        match self {
            ErrorResponse::BadRequest(reason) => {
                message(StatusCode::BAD_REQUEST, &format!("Bad Request: {reason}"))
            }
            ErrorResponse::NotFound => message(StatusCode::NOT_FOUND, "Not found"),
            ErrorResponse::Internal(reason) => message(StatusCode::INTERNAL_SERVER_ERROR, &reason),
        }
    }
}
