//! Dataset upload and summary handlers

use std::sync::Arc;

use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppError, AppState, HealthResponse, MAX_UPLOAD_SIZE};
use tally_core::models::DatasetSummary;
use tally_core::{detect_format, load_with_format, merge, FileFormat, MergeStats};

/// GET /api/health - Liveness and whether a dataset is loaded
pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, AppError> {
    let loaded = state.read_dataset()?.is_some();
    Ok(Json(HealthResponse {
        status: "ok",
        loaded,
    }))
}

/// GET /api/dataset - Bounds and categories of the loaded dataset
pub async fn get_dataset(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DatasetSummary>, AppError> {
    let guard = state.read_dataset()?;
    let dataset = guard
        .as_ref()
        .ok_or_else(|| AppError::not_found("No dataset loaded"))?;
    Ok(Json(dataset.summary()))
}

/// Query parameters for upload
#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    /// Merge into the current dataset instead of replacing it
    pub merge: Option<bool>,
}

/// Response for upload endpoint
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub format: FileFormat,
    /// Rows parsed from the uploaded file
    pub parsed: usize,
    pub added: usize,
    pub skipped: usize,
    pub summary: DatasetSummary,
}

/// POST /api/dataset - Upload a transaction file
///
/// Expects multipart form with:
/// - file: CSV file (required, max 10MB; native or CaixaBank layout)
pub async fn upload_dataset(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut total_size: usize = 0;

    // Extract fields from multipart form
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            let bytes = field
                .bytes()
                .await
                .map_err(|_| AppError::bad_request("Failed to read file data"))?;
            total_size += bytes.len();

            // Check file size limit
            if total_size > MAX_UPLOAD_SIZE {
                return Err(AppError::bad_request(&format!(
                    "File too large. Maximum size is {} MB",
                    MAX_UPLOAD_SIZE / 1024 / 1024
                )));
            }

            file_data = Some(bytes.to_vec());
        }
    }

    let file_data = file_data.ok_or_else(|| AppError::bad_request("Missing file field"))?;
    upload_dataset_core(&state, &file_data, params.merge.unwrap_or(false)).map(Json)
}

/// Core upload logic - separated for testability
pub fn upload_dataset_core(
    state: &AppState,
    file_data: &[u8],
    merge_into_existing: bool,
) -> Result<UploadResponse, AppError> {
    let format = detect_format(file_data);
    let incoming = load_with_format(file_data, format).map_err(AppError::from_core)?;
    let parsed = incoming.len();

    let mut guard = state.write_dataset()?;

    let (dataset, stats) = match guard.as_ref() {
        Some(existing) if merge_into_existing => {
            merge(existing, incoming).map_err(AppError::from_core)?
        }
        _ => (
            incoming,
            MergeStats {
                added: parsed,
                skipped: 0,
            },
        ),
    };

    info!(
        "Loaded {} file: {} added, {} skipped, {} total",
        format,
        stats.added,
        stats.skipped,
        dataset.len()
    );

    let summary = dataset.summary();
    *guard = Some(dataset);

    Ok(UploadResponse {
        format,
        parsed,
        added: stats.added,
        skipped: stats.skipped,
        summary,
    })
}
