//! Listing and retrieval of persisted pipeline reports.

use crate::{api::ApiError, AppState};
use axum::extract::{Extension, Path};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::io::ErrorKind;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ReportEntry {
    pub name: String,
    pub size_bytes: u64,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ReportListResponse {
    pub reports: Vec<ReportEntry>,
}

/// Handler for `GET /api/reports`. Newest reports first.
pub async fn list_reports_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<ReportListResponse>, ApiError> {
    let mut reports = Vec::new();

    let mut dir = match tokio::fs::read_dir(&state.json_dir).await {
        Ok(dir) => dir,
        // No reports yet — the directory appears with the first run.
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Ok(Json(ReportListResponse { reports }))
        }
        Err(e) => {
            return Err(ApiError::InternalServerError(format!(
                "failed to read report dir: {}",
                e
            )))
        }
    };

    while let Some(entry) = dir
        .next_entry()
        .await
        .map_err(|e| ApiError::InternalServerError(format!("failed to read report dir: {}", e)))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(".json") {
            continue;
        }
        let metadata = entry.metadata().await.map_err(|e| {
            ApiError::InternalServerError(format!("failed to stat report {}: {}", name, e))
        })?;
        let modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        reports.push(ReportEntry {
            name,
            size_bytes: metadata.len(),
            modified,
        });
    }

    reports.sort_by(|a, b| b.modified.cmp(&a.modified));
    Ok(Json(ReportListResponse { reports }))
}

/// A report name must be a bare `*.json` filename — no separators, no
/// parent-directory traversal.
fn valid_report_name(name: &str) -> bool {
    name.ends_with(".json") && !name.contains(['/', '\\']) && !name.contains("..")
}

/// Handler for `GET /api/reports/{name}`.
pub async fn get_report_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !valid_report_name(&name) {
        return Err(ApiError::BadRequest(format!("invalid report name: {}", name)));
    }

    let path = state.json_dir.join(&name);
    let body = tokio::fs::read_to_string(&path).await.map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            ApiError::NotFound(format!("report not found: {}", name))
        } else {
            ApiError::InternalServerError(format!("failed to read report {}: {}", name, e))
        }
    })?;

    let value = serde_json::from_str(&body).map_err(|e| {
        ApiError::InternalServerError(format!("corrupt report {}: {}", name, e))
    })?;
    Ok(Json(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_names_are_validated() {
        assert!(valid_report_name("booking_result.json"));
        assert!(valid_report_name("a1b2-c3_result.json"));
        assert!(!valid_report_name("../secrets.json"));
        assert!(!valid_report_name("sub/dir.json"));
        assert!(!valid_report_name("windows\\path.json"));
        assert!(!valid_report_name("report.txt"));
    }
}
