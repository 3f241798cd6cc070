use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::{HeaderName, StatusCode, header};
use axum::response::{IntoResponse, Response};
use log::{debug, error, info, warn};
use serde::Serialize;

use crate::document_processor::ProcessedDocument;
use crate::errors::AppError;

use super::AppState;

/// Target language used when the form leaves it out
pub const DEFAULT_TARGET_LANGUAGE: &str = "en";

const FILE_FIELD: &str = "file";
const TARGET_FIELD: &str = "target_lang";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
        }),
    )
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: message.into() })).into_response()
}

/// Fields of a translate-file form
struct Upload {
    filename: String,
    bytes: Vec<u8>,
    target_language: String,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, Response> {
    let mut file = None;
    let mut target_language = DEFAULT_TARGET_LANGUAGE.to_string();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read multipart body: {}", e);
                return Err(error_response(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    format!("Failed to read multipart body: {}", e),
                ));
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FILE_FIELD => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    error_response(
                        StatusCode::UNPROCESSABLE_ENTITY,
                        format!("Failed to read file: {}", e),
                    )
                })?;
                file = Some((filename, bytes.to_vec()));
            }
            TARGET_FIELD => {
                target_language = field.text().await.map_err(|e| {
                    error_response(
                        StatusCode::UNPROCESSABLE_ENTITY,
                        format!("Failed to read {}: {}", TARGET_FIELD, e),
                    )
                })?;
            }
            other => debug!("Ignoring form field {:?}", other),
        }
    }

    let (filename, bytes) = file.ok_or_else(|| {
        warn!("Translate request without a file");
        error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Missing required field: {}", FILE_FIELD),
        )
    })?;

    Ok(Upload {
        filename,
        bytes,
        target_language,
    })
}

fn file_response(document: ProcessedDocument) -> Response {
    let report = &document.report;
    let headers = [
        (header::CONTENT_TYPE, document.media_type().to_string()),
        (header::CONTENT_DISPOSITION, document.content_disposition()),
        (HeaderName::from_static("x-units-total"), report.total_units.to_string()),
        (HeaderName::from_static("x-units-translated"), report.translated_units.to_string()),
        (HeaderName::from_static("x-units-skipped"), report.skipped_units().to_string()),
    ];
    (StatusCode::OK, headers, document.bytes).into_response()
}

/// `POST /translate-file`
///
/// Failures after the form is read are reported as a JSON `error` body
/// with status 200, which existing clients expect.
pub async fn translate_file_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            warn!("Rejected translate request: {}", rejection);
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text());
        }
    };

    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(response) => return response,
    };

    info!("Received target language: {}", upload.target_language);
    info!("Received file: {} ({} bytes)", upload.filename, upload.bytes.len());

    match state
        .documents
        .process(&upload.filename, &upload.bytes, &upload.target_language)
        .await
    {
        Ok(document) => {
            info!("Finished {}: {}", upload.filename, document.report.summary());
            file_response(document)
        }
        Err(AppError::UnsupportedFormat(name)) => {
            warn!("Unsupported file format: {}", name);
            error_response(StatusCode::OK, "Unsupported file format")
        }
        Err(e) => {
            error!("Error processing {}: {}", upload.filename, e);
            error_response(StatusCode::OK, format!("Error processing file: {}", e))
        }
    }
}
