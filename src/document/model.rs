/*!
 * Text units extracted from word-processing documents.
 *
 * A `TextUnit` carries the source text, where it came from, and the font
 * profile of every original run so the translation can be written back
 * with approximately the same formatting.
 */

use crate::translation::Translatable;

/// One original run's font profile. Unset attributes inherit from the style.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunFormat {
    /// Text of the run at extraction time
    pub text: String,
    pub font_name: Option<String>,
    /// Size in points
    pub font_size: Option<f32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
}

impl RunFormat {
    /// Whether any attribute is set explicitly
    pub fn has_profile(&self) -> bool {
        self.font_name.is_some()
            || self.font_size.is_some()
            || self.bold.is_some()
            || self.italic.is_some()
            || self.underline.is_some()
    }
}

/// Paragraph style captured at extraction time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphDescriptor {
    /// Resolved style name ("Normal" when only the default applies)
    pub style_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationKind {
    Paragraph,
    Cell,
}

/// Where a unit lives in the document body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitLocation {
    /// A body-level paragraph, by index among the body's child elements
    Paragraph {
        index: usize,
        style: ParagraphDescriptor,
    },
    /// A table cell: the table's body index, then row and cell positions
    Cell { table: usize, row: usize, cell: usize },
}

impl UnitLocation {
    pub fn kind(&self) -> LocationKind {
        match self {
            Self::Paragraph { .. } => LocationKind::Paragraph,
            Self::Cell { .. } => LocationKind::Cell,
        }
    }
}

/// A block of translatable text plus enough metadata to put it back
#[derive(Debug, Clone, PartialEq)]
pub struct TextUnit {
    pub text: String,
    pub location: UnitLocation,
    pub runs: Vec<RunFormat>,
}

impl TextUnit {
    pub fn kind(&self) -> LocationKind {
        self.location.kind()
    }

    pub fn style_name(&self) -> Option<&str> {
        match &self.location {
            UnitLocation::Paragraph { style, .. } => Some(&style.style_name),
            UnitLocation::Cell { .. } => None,
        }
    }
}

impl Translatable for TextUnit {
    fn source_text(&self) -> &str {
        &self.text
    }
}

/// Split `translated` into one piece per original run length.
///
/// Run `i` ends at `floor(L * cum_i / total)` characters, where `L` is the
/// translated length and `cum_i` the original length of runs `0..=i`. The
/// last run always ends at `L`, so the pieces concatenate back to the input.
/// If the original runs were all empty the whole text goes to the last run.
pub fn apportion<'a>(translated: &'a str, run_lengths: &[usize]) -> Vec<&'a str> {
    if run_lengths.is_empty() {
        return Vec::new();
    }

    let char_count = translated.chars().count();
    let total: usize = run_lengths.iter().sum();
    let last = run_lengths.len() - 1;

    // Byte offset of every char boundary, including the end
    let offsets: Vec<usize> = translated
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(translated.len()))
        .collect();

    let mut pieces = Vec::with_capacity(run_lengths.len());
    let mut cumulative = 0usize;
    let mut start = 0usize;

    for (i, len) in run_lengths.iter().enumerate() {
        cumulative += len;
        let boundary = if i == last {
            char_count
        } else if total == 0 {
            0
        } else {
            char_count * cumulative / total
        };
        let boundary = boundary.max(start);
        pieces.push(&translated[offsets[start]..offsets[boundary]]);
        start = boundary;
    }

    pieces
}
