//! Request and response types for the HTTP API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, SubmissionError};
use crate::scoring::Profile;
use crate::store::SubmissionRecord;

pub const SERVICE_NAME: &str = "personality-assessment-backend";

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub ok: bool,
    pub submission_id: String,
    pub emailed: bool,
    pub profile: Profile,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    pub ok: bool,
    pub count: usize,
    pub rows: Vec<SubmissionRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

/// Query string shared by the listing and download endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub limit: Option<String>,
    pub test_version: Option<String>,
    pub format: Option<String>,
}

/// Handler error rendered as `{"ok": false, "error": "..."}`.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Submission(e) => match e {
                SubmissionError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                SubmissionError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                SubmissionError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                SubmissionError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            },
            Error::Config(_) | Error::Storage(_) | Error::Notification(_) | Error::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        ApiError(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self.0, "Request rejected");
        }

        let body = ErrorResponse {
            ok: false,
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
