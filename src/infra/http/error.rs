use std::borrow::Cow;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::ErrorReport;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: String,
}

/// JSON error response carrying a public message plus a diagnostic for the logs.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    source: &'static str,
    message: Cow<'static, str>,
    detail: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        source: &'static str,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            status,
            source,
            message: message.into(),
            detail: None,
        }
    }

    pub fn bad_request(source: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, source, message)
    }

    pub fn not_found(source: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(StatusCode::NOT_FOUND, source, message)
    }

    pub fn internal(source: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, source, message)
    }

    /// Log-only detail that never reaches the response body.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = self
            .detail
            .unwrap_or_else(|| self.message.clone().into_owned());
        let body = ApiErrorBody {
            error: self.message.into_owned(),
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message(self.source, self.status, detail).attach(&mut response);
        response
    }
}
