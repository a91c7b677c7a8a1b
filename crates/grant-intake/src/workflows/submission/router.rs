use std::fmt::Write as _;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::warn;

use super::composer::{ComposeError, RenderedDocument};
use super::domain::{ApplicationId, ApplicationSubmission};
use super::repository::ApplicationRepository;
use super::service::{SubmissionState, SubmissionWorkflow, WorkflowError};
use super::validation::SubmissionError;

const NOT_FOUND_PAGE: &str =
    "<h1>Application not found.</h1><p>The link may be invalid or expired.</p>";
const RENDER_FAILED_PAGE: &str = "<h1>Error generating PDF</h1><p>Sorry, we were unable to generate your PDF. Please try again later.</p>";

/// Router builder exposing submission and download endpoints.
pub fn submission_router<R>(workflow: Arc<SubmissionWorkflow<R>>) -> Router
where
    R: ApplicationRepository + 'static,
{
    Router::new()
        .route("/api/submit", post(submit_handler::<R>))
        .route("/api/download-pdf/:id", get(download_handler::<R>))
        .with_state(workflow)
}

pub(crate) async fn submit_handler<R>(
    State(workflow): State<Arc<SubmissionWorkflow<R>>>,
    payload: Result<Json<ApplicationSubmission>, JsonRejection>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let Json(submission) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            let body = json!({
                "message": "Submission body is not valid JSON.",
                "error": rejection.body_text(),
            });
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }
    };

    match workflow.submit(submission).await {
        Ok(outcome) if outcome.state == SubmissionState::Complete => {
            let body = json!({
                "message": "Application submitted successfully! Confirmation emails sent.",
                "applicationId": outcome.application_id,
                "emailDelivered": true,
            });
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Ok(outcome) => {
            let warning = match &outcome.delivery {
                Err(failed) => failed.to_string(),
                Ok(_) => String::new(),
            };
            let body = json!({
                "message": "Application submitted successfully, but confirmation emails could not all be sent.",
                "applicationId": outcome.application_id,
                "emailDelivered": false,
                "failedRecipients": outcome.failed_recipients(),
                "warning": warning,
            });
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(WorkflowError::Submission(err @ SubmissionError::SchemaViolation { .. })) => {
            let fields: Vec<_> = err
                .violations()
                .iter()
                .map(|violation| json!({ "field": violation.field, "error": violation.to_string() }))
                .collect();
            let body = json!({
                "message": "Application failed validation.",
                "error": err.to_string(),
                "fields": fields,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
        }
        Err(WorkflowError::Submission(err)) => {
            let body = json!({
                "message": "Application failed validation.",
                "error": err.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
        }
        Err(other) => {
            let body = json!({
                "message": "Server error during submission.",
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

pub(crate) async fn download_handler<R>(
    State(workflow): State<Arc<SubmissionWorkflow<R>>>,
    Path(id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let id = ApplicationId(id);
    match workflow.fetch_document(&id).await {
        Ok(document) => pdf_response(document),
        Err(WorkflowError::NotFound(_)) => {
            (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE)).into_response()
        }
        Err(WorkflowError::Compose(ComposeError::IncompleteRecord { field })) => {
            warn!(application_id = %id, field, "download requested for incomplete record");
            (StatusCode::INTERNAL_SERVER_ERROR, Html(RENDER_FAILED_PAGE)).into_response()
        }
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, Html(RENDER_FAILED_PAGE)).into_response(),
    }
}

fn pdf_response(document: RenderedDocument) -> Response {
    let disposition = content_disposition(&document.filename);
    let mut response = (StatusCode::OK, document.bytes).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(document.content_type),
    );
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

/// `attachment; filename="..."`, adding an RFC 5987 `filename*` when the name
/// is not plain ASCII.
pub(crate) fn content_disposition(filename: &str) -> String {
    if filename.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
        return format!("attachment; filename=\"{filename}\"");
    }

    let fallback: String = filename
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '_' })
        .collect();
    let mut encoded = String::with_capacity(filename.len() * 3);
    for byte in filename.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            write!(encoded, "%{byte:02X}").expect("write percent escape");
        }
    }
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}
