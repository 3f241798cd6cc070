/*!
 * # doc-translator
 *
 * An HTTP service that translates office documents with an LLM.
 *
 * ## Features
 *
 * - Accepts `.docx`, `.pptx`, `.pdf` and `.txt` uploads on `POST /translate-file`
 * - Translates each paragraph, table cell, shape or page through any
 *   OpenAI-compatible chat completion endpoint
 * - Keeps paragraph styles and per-run font attributes in word documents
 * - Paces remote calls to stay under the service's rate limit
 * - Reports translated and skipped units per document
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `errors`: Custom error types for the application
 * - `language_utils`: ISO language code utilities
 * - `providers`: OpenAI-compatible chat completion client
 * - `translation`: Translation capability, pacing and the per-document loop
 * - `document`: Per-format extraction and reinsertion
 * - `document_processor`: Format dispatch and output naming
 * - `web`: Router and request handlers
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]

// Public modules
pub mod app_config;
pub mod document;
pub mod document_processor;
pub mod errors;
pub mod language_utils;
pub mod providers;
pub mod translation;
pub mod web;

// Re-export main types for easier usage
pub use app_config::Config;
pub use document_processor::{DocumentKind, DocumentTranslator, ProcessedDocument};
pub use errors::{AppError, DocumentError, ProviderError, TranslationError};
pub use language_utils::{get_language_name, normalize_to_part2t, target_language_label};
pub use translation::{DocumentReport, PacingPolicy, TranslationService, Translator};
pub use web::{AppState, create_router};
