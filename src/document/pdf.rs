/*!
 * PDF documents.
 *
 * Page text is extracted and translated so failures show up in the report,
 * but the output is the original document re-serialized: no layout is
 * rebuilt and the translated text is not written into the file.
 */

use log::{debug, info, warn};
use lopdf::Document;

use crate::errors::DocumentError;
use crate::translation::{BatchTranslator, Translatable};

use super::TranslatedDocument;

/// Extracted text of one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageUnit {
    /// 1-based page number
    pub number: u32,
    pub text: String,
}

impl Translatable for PageUnit {
    fn source_text(&self) -> &str {
        &self.text
    }
}

/// Non-blank page texts in page order. Pages whose text cannot be extracted are skipped.
pub fn extract_pages(document: &Document) -> Vec<PageUnit> {
    let mut units = Vec::new();
    for number in document.get_pages().into_keys() {
        match document.extract_text(&[number]) {
            Ok(text) if !text.trim().is_empty() => units.push(PageUnit { number, text }),
            Ok(_) => debug!("Page {} has no text", number),
            Err(e) => warn!("Could not extract text from page {}: {}", number, e),
        }
    }
    units
}

/// Re-serialize a loaded document
fn serialize(document: &mut Document) -> Result<Vec<u8>, DocumentError> {
    let mut out = Vec::new();
    document
        .save_to(&mut out)
        .map_err(|e| DocumentError::Pdf(e.to_string()))?;
    Ok(out)
}

/// Translate page texts through `batch` and return the original pages
pub async fn translate(
    bytes: &[u8],
    batch: &BatchTranslator<'_>,
    target_language: &str,
) -> Result<TranslatedDocument, DocumentError> {
    let mut document = Document::load_mem(bytes)?;
    let units = extract_pages(&document);
    info!(
        "Extracted text from {} of {} pages",
        units.len(),
        document.get_pages().len()
    );

    // The output never depends on the translations
    let output = serialize(&mut document)?;
    drop(document);

    let report = batch
        .run(&units, target_language, |t| {
            debug!(
                "Page {} translated ({} chars); original page kept",
                t.unit.number,
                t.text.chars().count()
            );
            Ok(())
        })
        .await;

    Ok(TranslatedDocument {
        bytes: output,
        report,
    })
}
