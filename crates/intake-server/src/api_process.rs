//! Upload-and-process handler: stages the uploaded file in the temp
//! directory and runs it through the pipeline.

use crate::{api::ApiError, AppState};
use axum::extract::{Extension, Multipart};
use axum::Json;
use intake_types::PipelineReport;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Maximum upload size accepted by the process endpoint (50 MiB).
pub(crate) const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Keeps alphanumerics, dots, dashes, and underscores; everything else
/// becomes an underscore. Uploads always get a UUID prefix on top, so the
/// sanitized name only has to be safe, not unique.
fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches(|c| c == '_' || c == '.').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Handler for `POST /api/process`.
pub async fn process_handler(
    Extension(state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<PipelineReport>, ApiError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("multipart error: {}", e)))?
        .ok_or_else(|| ApiError::BadRequest("no file provided".to_string()))?;

    let filename = sanitize_filename(field.file_name().unwrap_or("upload"));

    let data = field
        .bytes()
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {}", e)))?;

    if data.is_empty() {
        return Err(ApiError::BadRequest("empty upload".to_string()));
    }
    if data.len() > MAX_UPLOAD_BYTES {
        return Err(ApiError::PayloadTooLarge(format!(
            "file too large: {} bytes (max {})",
            data.len(),
            MAX_UPLOAD_BYTES
        )));
    }

    tokio::fs::create_dir_all(&state.temp_dir)
        .await
        .map_err(|e| ApiError::InternalServerError(format!("failed to create temp dir: {}", e)))?;

    let staged = state
        .temp_dir
        .join(format!("{}_{}", Uuid::new_v4(), filename));
    tokio::fs::write(&staged, &data)
        .await
        .map_err(|e| ApiError::InternalServerError(format!("failed to stage upload: {}", e)))?;

    info!(file = %staged.display(), bytes = data.len(), "upload staged");

    let report = state.orchestrator.process_file(&staged).await?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_hostile_filenames() {
        assert_eq!(sanitize_filename("call recording.wav"), "call_recording.wav");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("///"), "upload");
        assert_eq!(sanitize_filename("..."), "upload");
        assert_eq!(sanitize_filename("invoice-42.png"), "invoice-42.png");
    }
}
