//! Serving previously uploaded files.

use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum_helpers::{AppError, RequestDetails, SessionContext};

/// Stream a stored blob back to the caller.
///
/// The content-type header comes from the blob's stored attributes. A
/// missing file renders the enveloped 404; once headers are committed, a
/// failed body write can only be logged by the server layer.
pub async fn serve_upload(
    State(state): State<AppState>,
    Extension(request): Extension<RequestDetails>,
    session: SessionContext,
    Path(filename): Path<String>,
) -> Response {
    let details = request.response_details(session.household_id);

    match state.uploads.serve_file(&filename).await {
        Ok((attributes, content)) => {
            let content_type = attributes
                .content_type
                .unwrap_or_else(|| "application/octet-stream".to_string());
            ([(header::CONTENT_TYPE, content_type)], content).into_response()
        }
        Err(error) if error.is_not_found() => {
            AppError::NotFound(format!("upload {filename} not found"))
                .with_details(&details)
                .into_response()
        }
        Err(error) => AppError::BlobStore(error.to_string())
            .with_details(&details)
            .into_response(),
    }
}
