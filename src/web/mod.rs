/*!
 * HTTP surface: the upload endpoint and a health probe.
 */

use crate::document_processor::DocumentTranslator;

pub use self::handlers::{DEFAULT_TARGET_LANGUAGE, ErrorResponse, HealthResponse};
pub use self::routes::create_router;

pub mod handlers;
pub mod routes;

/// Shared per-process state handed to every request
#[derive(Clone)]
pub struct AppState {
    pub documents: DocumentTranslator,
    /// Largest accepted request body
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(documents: DocumentTranslator, max_upload_bytes: usize) -> Self {
        Self {
            documents,
            max_upload_bytes,
        }
    }
}
