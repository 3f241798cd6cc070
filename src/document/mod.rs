/*!
 * Per-format extraction and reinsertion.
 *
 * - `xml`: owned XML tree used for the Office Open XML parts
 * - `package`: the zip container around those parts
 * - `model`: text units, run formats and the length-proportional split
 * - `docx`, `pptx`, `pdf`, `text`: one handler per supported format
 */

use crate::translation::DocumentReport;

pub use self::docx::{StyleSheet, WordDocument};
pub use self::model::{LocationKind, ParagraphDescriptor, RunFormat, TextUnit, UnitLocation, apportion};
pub use self::package::OoxmlPackage;
pub use self::pptx::{Presentation, ShapeUnit};

pub mod docx;
pub mod model;
pub mod package;
pub mod pdf;
pub mod pptx;
pub mod text;
pub mod xml;

/// Output of a format handler
#[derive(Debug)]
pub struct TranslatedDocument {
    /// Bytes of the output file
    pub bytes: Vec<u8>,
    /// What happened to each unit
    pub report: DocumentReport,
}
