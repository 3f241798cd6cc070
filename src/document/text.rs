/*!
 * Plain-text documents.
 *
 * The whole file is one unit. Input that is not valid UTF-8 is decoded as
 * GBK and any bytes that still cannot be decoded are dropped.
 */

use encoding_rs::GBK;
use log::{info, warn};

use crate::errors::TranslationError;
use crate::translation::{DocumentReport, Translator};

use super::TranslatedDocument;

/// Decode uploaded text, falling back to GBK
pub fn decode(bytes: &[u8]) -> String {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }

    warn!("Input is not valid UTF-8, decoding as GBK");
    let (text, _, had_errors) = GBK.decode(bytes);
    if had_errors {
        warn!("Dropping bytes that are not valid GBK");
        return text.chars().filter(|&c| c != char::REPLACEMENT_CHARACTER).collect();
    }
    text.into_owned()
}

/// Translate a text file as a single unit
///
/// Unlike the structured formats, a failed call fails the whole file.
pub async fn translate(
    bytes: &[u8],
    translator: &dyn Translator,
    target_language: &str,
) -> Result<TranslatedDocument, TranslationError> {
    let text = decode(bytes);

    if text.trim().is_empty() {
        info!("Text file is blank, nothing to translate");
        return Ok(TranslatedDocument {
            bytes: text.into_bytes(),
            report: DocumentReport::default(),
        });
    }

    let translated = translator.translate(&text, target_language).await?;
    Ok(TranslatedDocument {
        bytes: translated.into_bytes(),
        report: DocumentReport {
            total_units: 1,
            translated_units: 1,
            ..Default::default()
        },
    })
}
