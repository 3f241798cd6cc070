/*!
 * Error types for the doc-translator service.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether another attempt at the same request could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

/// A single translation call failed
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The completion came back without usable text
    #[error("Provider returned an empty translation")]
    EmptyResponse,
}

/// Errors raised while reading, rewriting or saving a document
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The zip container could not be read or written
    #[error("Archive error: {0}")]
    Archive(String),

    /// A document part is not well-formed XML
    #[error("XML error: {0}")]
    Xml(String),

    /// A required part is absent from the package
    #[error("Missing document part: {0}")]
    MissingPart(String),

    /// A recorded location no longer resolves to the expected element
    #[error("Unexpected document structure: {0}")]
    Structure(String),

    /// A paragraph style captured at extraction time cannot be found
    #[error("Style not found: {0}")]
    StyleNotFound(String),

    /// The PDF could not be loaded or written
    #[error("PDF error: {0}")]
    Pdf(String),
}

impl From<zip::result::ZipError> for DocumentError {
    fn from(error: zip::result::ZipError) -> Self {
        Self::Archive(error.to_string())
    }
}

impl From<quick_xml::Error> for DocumentError {
    fn from(error: quick_xml::Error) -> Self {
        Self::Xml(error.to_string())
    }
}

impl From<lopdf::Error> for DocumentError {
    fn from(error: lopdf::Error) -> Self {
        Self::Pdf(error.to_string())
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// The uploaded file's extension is not one we can translate
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from document processing
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
}
