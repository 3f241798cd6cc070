/*!
 * Format dispatch for uploaded documents.
 *
 * The file extension picks the handler; the handler's output is wrapped
 * with the media type and download name the HTTP layer needs.
 */

use std::path::Path;
use std::sync::Arc;

use log::info;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::document::{TranslatedDocument, docx, pdf, pptx, text};
use crate::errors::AppError;
use crate::translation::{BatchTranslator, DocumentReport, PacingPolicy, Translator};

/// Characters left literal in the download file name
const FILENAME_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Docx,
    Pptx,
    Pdf,
    Txt,
}

impl DocumentKind {
    /// Detect the format from a file name's extension, ignoring case
    pub fn from_filename(filename: &str) -> Option<Self> {
        let extension = Path::new(filename).extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "docx" => Some(Self::Docx),
            "pptx" => Some(Self::Pptx),
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            Self::Pptx => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            Self::Pdf => "application/pdf",
            Self::Txt => "text/plain; charset=utf-8",
        }
    }
}

/// Name offered for download
pub fn translated_filename(filename: &str) -> String {
    format!("translated_{}", filename)
}

/// `Content-Disposition` value for the translated file
pub fn content_disposition(filename: &str) -> String {
    let name = translated_filename(filename);
    format!("attachment; filename={}", utf8_percent_encode(&name, FILENAME_SAFE))
}

/// A translated file ready to send back
#[derive(Debug)]
pub struct ProcessedDocument {
    pub kind: DocumentKind,
    /// Original upload name
    pub filename: String,
    pub bytes: Vec<u8>,
    pub report: DocumentReport,
}

impl ProcessedDocument {
    pub fn media_type(&self) -> &'static str {
        self.kind.media_type()
    }

    pub fn content_disposition(&self) -> String {
        content_disposition(&self.filename)
    }
}

/// Runs the right handler for each upload
#[derive(Clone)]
pub struct DocumentTranslator {
    translator: Arc<dyn Translator>,
    /// Pacing for word-processing documents
    policy: PacingPolicy,
}

impl DocumentTranslator {
    pub fn new(translator: Arc<dyn Translator>, policy: PacingPolicy) -> Self {
        Self { translator, policy }
    }

    pub fn policy(&self) -> PacingPolicy {
        self.policy
    }

    /// Translate one uploaded file
    pub async fn process(
        &self,
        filename: &str,
        bytes: &[u8],
        target_language: &str,
    ) -> Result<ProcessedDocument, AppError> {
        let kind = DocumentKind::from_filename(filename)
            .ok_or_else(|| AppError::UnsupportedFormat(filename.to_string()))?;
        info!("Translating {} ({:?}, {} bytes) into {}", filename, kind, bytes.len(), target_language);

        let translator = self.translator.as_ref();
        let TranslatedDocument { bytes: output, report } = match kind {
            DocumentKind::Docx => {
                let batch = BatchTranslator::new(translator, self.policy);
                docx::translate(bytes, &batch, target_language).await?
            }
            DocumentKind::Pptx => {
                let batch = BatchTranslator::new(translator, PacingPolicy::unthrottled());
                pptx::translate(bytes, &batch, target_language).await?
            }
            DocumentKind::Pdf => {
                let batch = BatchTranslator::new(translator, PacingPolicy::unthrottled());
                pdf::translate(bytes, &batch, target_language).await?
            }
            DocumentKind::Txt => text::translate(bytes, translator, target_language).await?,
        };

        Ok(ProcessedDocument {
            kind,
            filename: filename.to_string(),
            bytes: output,
            report,
        })
    }
}
