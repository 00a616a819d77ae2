use std::path::Path;

use anyhow::Context;
use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use tracing::info;
use uuid::Uuid;

use murmur_types::api::UploadResponse;

use crate::AppState;
use crate::error::ApiError;

/// 50 MB upload limit
pub const MAX_FILE_SIZE: usize = 50 * 1024 * 1024;

/// POST /api/media/upload — multipart, exactly one file in field `file`.
///
/// The file is stored as `{uuid}{.ext}` in the upload directory and served
/// back under `/uploads/`. Other form fields are ignored; a second `file`
/// part rejects the whole request.
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart?;
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        // A plain form value named `file` is not a file
        let Some(original_name) = field.file_name().map(str::to_owned) else {
            continue;
        };
        if upload.is_some() {
            return Err(ApiError::BadRequest("Only one file may be uploaded".into()));
        }
        upload = Some((original_name, field.bytes().await?));
    }

    let Some((original_name, data)) = upload else {
        return Err(ApiError::BadRequest("No file uploaded".into()));
    };

    let stored_name = unique_file_name(&original_name);
    let path = state.upload_dir.join(&stored_name);

    tokio::fs::write(&path, &data)
        .await
        .with_context(|| format!("Failed to write upload {}", path.display()))?;

    info!(
        "Stored upload '{}' as {} ({} bytes)",
        original_name,
        stored_name,
        data.len()
    );

    Ok(Json(UploadResponse {
        url: format!("/uploads/{}", stored_name),
    }))
}

/// A fresh UUID name keeping the original extension, if it is a sane one.
fn unique_file_name(original: &str) -> String {
    let ext = Path::new(original)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 16 && e.chars().all(|c| c.is_ascii_alphanumeric()));

    match ext {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    }
}
