use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody { pub message: String }

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self { Self { status: StatusCode::BAD_REQUEST, message: message.into() } }

    pub fn not_found(message: impl Into<String>) -> Self { Self { status: StatusCode::NOT_FOUND, message: message.into() } }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response { (self.status, axum::Json(ErrorBody { message: self.message })).into_response() }
}

impl From<crate::domain::todo::ParseError> for ApiError {
    fn from(e: crate::domain::todo::ParseError) -> Self { Self::bad_request(e.to_string()) }
}
