use axum::{
    Json,
    body::Body,
    extract::{Extension, Path, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::{
    application::{
        error::ErrorReport,
        export::{DownloadError, ExportError},
    },
    domain::conversion::ConversionRequest,
};

use super::{error::ApiError, middleware::RequestContext, state::HttpState};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExportPdfPayload {
    pub html: Option<String>,
    pub scale: Option<Value>,
    pub width: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ExportPdfResponse {
    pub url: String,
}

pub async fn export_pdf(
    State(state): State<HttpState>,
    Extension(ctx): Extension<RequestContext>,
    payload: Result<Json<ExportPdfPayload>, JsonRejection>,
) -> Result<Json<ExportPdfResponse>, ApiError> {
    // Every malformed body is an input error, whatever status axum would pick.
    let Json(payload) = payload.map_err(|rejection| {
        ApiError::bad_request(EXPORT_SOURCE, rejection.body_text())
            .with_detail(format!("rejected request body: {rejection}"))
    })?;
    let request = ConversionRequest::from_payload(
        payload.html,
        payload.scale.as_ref(),
        payload.width.as_ref(),
    )
    .map_err(ExportError::from)
    .map_err(|err| export_error_to_api(&state, &ctx, err))?;

    let stored = state
        .exports
        .export(request)
        .await
        .map_err(|err| export_error_to_api(&state, &ctx, err))?;

    info!(
        target: EXPORT_SOURCE,
        request_id = %ctx.request_id,
        file = %stored.file_name,
        "export request served"
    );
    Ok(Json(ExportPdfResponse {
        url: stored.download_url(),
    }))
}

const EXPORT_SOURCE: &str = "infra::http::handlers::export_pdf";

fn export_error_to_api(state: &HttpState, ctx: &RequestContext, err: ExportError) -> ApiError {
    match err {
        ExportError::InvalidInput(err) => {
            ApiError::bad_request(EXPORT_SOURCE, err.message().to_string())
        }
        ExportError::ConversionFailed { message } if state.expose_render_errors => {
            ApiError::internal(EXPORT_SOURCE, message)
        }
        ExportError::ConversionFailed { message } => {
            // The caller only sees the generic text and the request id header.
            error!(
                target: EXPORT_SOURCE,
                request_id = %ctx.request_id,
                error = %message,
                "conversion failed; detail withheld from response"
            );
            ApiError::internal(EXPORT_SOURCE, "PDF conversion failed").with_detail(message)
        }
    }
}

pub async fn download_pdf(
    State(state): State<HttpState>,
    Path(filename): Path<String>,
) -> Response {
    const SOURCE: &str = "infra::http::handlers::download_pdf";

    match state.exports.download(&filename).await {
        Ok(bytes) => build_download_response(&filename, bytes),
        Err(DownloadError::NotFound) => ApiError::not_found(SOURCE, "PDF not found")
            .with_detail(format!("no generated file named `{filename}`"))
            .into_response(),
        Err(DownloadError::Storage(err)) => {
            error!(
                target: SOURCE,
                file = %filename,
                error = %err,
                "failed to read generated PDF"
            );
            ApiError::internal(SOURCE, "Failed to read generated PDF")
                .with_detail(err.to_string())
                .into_response()
        }
    }
}

pub async fn health(State(state): State<HttpState>) -> Response {
    match state.exports.store().probe().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::handlers::health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

fn build_download_response(filename: &str, bytes: Bytes) -> Response {
    let len = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/pdf"),
    );
    if let Ok(value) = HeaderValue::from_str(&len.to_string()) {
        headers.insert(header::CONTENT_LENGTH, value);
    }

    let safe_name = filename.replace('"', "'");
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{safe_name}\"")) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    response
}
