//! File upload handler
//!
//! Accepts multipart form data with one or more `files` fields and writes
//! each file into the upload directory under its sanitized base name, so the
//! interpreter can be pointed at it by path.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{
        multipart::{Field, MultipartError},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

/// Multipart field carrying files
pub const FILES_FIELD: &str = "files";

/// Per-file size limit (25 MiB)
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Whole request body limit, several files per request
pub const MAX_REQUEST_BYTES: usize = 4 * MAX_UPLOAD_BYTES;

/// Response for a successful upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Always `true`; failures use the error body
    pub success: bool,
    /// Paths of the saved files
    pub files: Vec<String>,
}

/// Reduce a client-supplied name to a safe base name
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').to_string();

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::Validation(format!("Failed to read upload: {}", err.body_text()))
    }
}

/// Remove files written earlier in a failed request
async fn cleanup(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "Failed to clean up upload");
        }
    }
}

/// Stream one field into `path`; a partial file is left for the caller to remove
async fn save_field(mut field: Field<'_>, path: &Path) -> Result<usize, AppError> {
    let mut file = fs::File::create(path).await?;
    let mut written = 0usize;

    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => return Err(multipart_error(e)),
        };
        written += chunk.len();
        if written > MAX_UPLOAD_BYTES {
            return Err(AppError::PayloadTooLarge(format!(
                "file exceeds {} bytes",
                MAX_UPLOAD_BYTES
            )));
        }
        file.write_all(&chunk).await?;
    }

    file.sync_all().await?;
    Ok(written)
}

/// POST /api/upload - Save uploaded files
pub async fn upload_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    fs::create_dir_all(&state.upload_dir).await?;
    let mut saved: Vec<PathBuf> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                cleanup(&saved).await;
                return Err(multipart_error(e));
            }
        };

        if field.name() != Some(FILES_FIELD) {
            warn!(field = ?field.name(), "Unknown multipart field");
            continue;
        }

        let name = sanitize_filename(field.file_name().unwrap_or_default());
        let path = state.upload_dir.join(&name);

        match save_field(field, &path).await {
            Ok(bytes) => {
                info!(path = %path.display(), bytes, "Saved uploaded file");
                saved.push(path);
            }
            Err(e) => {
                error!(filename = %name, error = %e, "Upload failed");
                saved.push(path);
                cleanup(&saved).await;
                return Err(e);
            }
        }
    }

    Ok(Json(UploadResponse {
        success: true,
        files: saved
            .iter()
            .map(|path| path.to_string_lossy().to_string())
            .collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_state;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{header, Request};
    use axum::response::IntoResponse;

    const BOUNDARY: &str = "X-TEST-BOUNDARY";

    fn multipart_request(parts: &[(&str, &str, &[u8])]) -> Request<Body> {
        let mut body = Vec::new();
        for (field, filename, data) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    field, filename
                )
                .as_bytes(),
            );
            body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_cleanup_removes_files_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let written = dir.path().join("partial.bin");
        std::fs::write(&written, b"half").unwrap();
        let missing = dir.path().join("never-written.bin");

        cleanup(&[written.clone(), missing]).await;
        assert!(!written.exists());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("data.csv"), "data.csv");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename(".bashrc"), "bashrc");
        assert_eq!(sanitize_filename("a<b>c.txt"), "a_b_c.txt");
        assert_eq!(sanitize_filename(""), "upload");
        assert_eq!(sanitize_filename("/"), "upload");
    }

    #[tokio::test]
    async fn test_upload_saves_files() {
        let (state, _dir) = test_state();
        let request = multipart_request(&[
            ("files", "notes.txt", &b"hello"[..]),
            ("files", "../sneaky.py", &b"print(1)"[..]),
        ]);
        let multipart = Multipart::from_request(request, &()).await.unwrap();

        let Json(response) = upload_files(State(state.clone()), multipart).await.unwrap();
        assert!(response.success);
        assert_eq!(response.files.len(), 2);

        let notes = state.upload_dir.join("notes.txt");
        assert_eq!(std::fs::read_to_string(&notes).unwrap(), "hello");
        assert!(state.upload_dir.join("sneaky.py").exists());
        assert_eq!(response.files[0], notes.to_string_lossy());
    }

    #[tokio::test]
    async fn test_oversized_file_rejected() {
        let (state, _dir) = test_state();
        let big = vec![b'x'; MAX_UPLOAD_BYTES + 1];
        let request = multipart_request(&[
            ("files", "small.txt", &b"ok"[..]),
            ("files", "big.bin", big.as_slice()),
        ]);
        let multipart = Multipart::from_request(request, &()).await.unwrap();

        let err = upload_files(State(state.clone()), multipart).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(!state.upload_dir.join("big.bin").exists());
        assert!(!state.upload_dir.join("small.txt").exists());
    }

    #[tokio::test]
    async fn test_unknown_fields_ignored() {
        let (state, _dir) = test_state();
        let request = multipart_request(&[("attachment", "x.txt", &b"nope"[..])]);
        let multipart = Multipart::from_request(request, &()).await.unwrap();

        let Json(response) = upload_files(State(state.clone()), multipart).await.unwrap();
        assert!(response.success);
        assert!(response.files.is_empty());
        assert!(!state.upload_dir.join("x.txt").exists());
    }
}
