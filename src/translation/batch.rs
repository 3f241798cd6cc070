/*!
 * Sequential document translation.
 *
 * Units are translated strictly one after another, in extraction order,
 * with the pacing policy applied around every call. A unit that fails to
 * translate or to reinsert is recorded as skipped and the loop carries on,
 * so one bad paragraph never costs the caller the whole document.
 */

use log::{error, info};

use crate::errors::{DocumentError, TranslationError};

use super::core::Translator;
use super::pacing::{Pacer, PacingPolicy, PacingStats};

/// Characters of source text kept in logs and skip records
const PREVIEW_CHARS: usize = 100;

/// A block of source text the loop can send for translation
pub trait Translatable {
    fn source_text(&self) -> &str;
}

/// A unit paired with its translation, handed to the reinsertion callback
#[derive(Debug)]
pub struct TranslatedUnit<'a, U> {
    /// Position of the unit in extraction order
    pub index: usize,
    /// The extracted unit
    pub unit: &'a U,
    /// Translated text returned by the translator
    pub text: String,
}

/// Why a unit was left untouched
#[derive(Debug)]
pub enum SkipReason {
    /// The remote call failed
    Translation(TranslationError),
    /// The translation could not be written back
    Reinsertion(DocumentError),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Translation(e) => write!(f, "translation failed: {}", e),
            Self::Reinsertion(e) => write!(f, "reinsertion failed: {}", e),
        }
    }
}

/// A unit the loop gave up on
#[derive(Debug)]
pub struct SkippedUnit {
    /// Position of the unit in extraction order
    pub index: usize,
    /// Leading characters of the source text
    pub preview: String,
    /// Failure that caused the skip
    pub reason: SkipReason,
}

/// Outcome of translating one document
#[derive(Debug, Default)]
pub struct DocumentReport {
    /// Units extracted from the document
    pub total_units: usize,
    /// Units translated and written back
    pub translated_units: usize,
    /// Units left in their original language
    pub skipped: Vec<SkippedUnit>,
    /// Delays applied while translating
    pub pacing: PacingStats,
}

impl DocumentReport {
    pub fn skipped_units(&self) -> usize {
        self.skipped.len()
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "{} units: {} translated, {} skipped ({} batch pauses)",
            self.total_units,
            self.translated_units,
            self.skipped.len(),
            self.pacing.batch_pauses
        )
    }
}

/// Leading characters of `text` for logs
pub fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

/// Drives a translator over an ordered list of units
pub struct BatchTranslator<'t> {
    /// The translation capability to call
    translator: &'t dyn Translator,

    /// Delays applied around each call
    policy: PacingPolicy,
}

impl<'t> BatchTranslator<'t> {
    /// Create a new batch translator
    pub fn new(translator: &'t dyn Translator, policy: PacingPolicy) -> Self {
        Self { translator, policy }
    }

    /// Translate every unit in order, handing each result to `apply`
    ///
    /// `apply` is called exactly once per successful translation and never
    /// for a unit whose translation failed.
    pub async fn run<U, F>(&self, units: &[U], target_language: &str, mut apply: F) -> DocumentReport
    where
        U: Translatable + Sync,
        F: FnMut(TranslatedUnit<'_, U>) -> Result<(), DocumentError>,
    {
        let mut pacer = Pacer::new(self.policy);
        let mut report = DocumentReport {
            total_units: units.len(),
            ..Default::default()
        };

        for (index, unit) in units.iter().enumerate() {
            pacer.before_call().await;

            let text = match self.translator.translate(unit.source_text(), target_language).await {
                Ok(text) => text,
                Err(e) => {
                    let preview = preview(unit.source_text());
                    error!("Translation failed: {}", e);
                    error!("Failed text: {}...", preview);
                    report.skipped.push(SkippedUnit {
                        index,
                        preview,
                        reason: SkipReason::Translation(e),
                    });
                    continue;
                }
            };

            match apply(TranslatedUnit { index, unit, text }) {
                Ok(()) => {
                    report.translated_units += 1;
                    pacer.after_success().await;
                }
                Err(e) => {
                    let preview = preview(unit.source_text());
                    error!("Failed to write translation back: {}", e);
                    error!("Failed text: {}...", preview);
                    report.skipped.push(SkippedUnit {
                        index,
                        preview,
                        reason: SkipReason::Reinsertion(e),
                    });
                }
            }
        }

        report.pacing = pacer.stats();
        info!("Document translated: {}", report.summary());
        report
    }
}
