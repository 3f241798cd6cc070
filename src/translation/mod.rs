/*!
 * Translation of extracted text units.
 *
 * - `core`: the `Translator` capability and the remote-backed service
 * - `prompts`: prompt templates
 * - `pacing`: delays protecting the rate-limited remote service
 * - `batch`: the sequential orchestration loop and per-document report
 */

// Re-export main types for easier usage
pub use self::batch::{BatchTranslator, DocumentReport, SkipReason, SkippedUnit, Translatable, TranslatedUnit};
pub use self::core::{TranslationService, Translator};
pub use self::pacing::{Pacer, PacingPolicy, PacingStats};
pub use self::prompts::PromptTemplate;

// Submodules
pub mod batch;
pub mod core;
pub mod pacing;
pub mod prompts;
