/*!
 * Word-processing (`.docx`) documents.
 *
 * Extraction walks the body paragraphs first and then every table cell,
 * producing one `TextUnit` per non-blank element. Reinsertion rewrites that
 * element in place:
 *
 * - paragraphs keep their properties and named style; a single original run
 *   gives its font profile to the one new run, several runs share the
 *   translation by length (see `model::apportion`)
 * - cells are emptied down to their properties and receive one paragraph
 *   carrying the first original run's profile
 *
 * Only `word/document.xml` is rewritten; every other part is copied through.
 */

use std::collections::HashMap;

use log::{debug, info};

use crate::errors::DocumentError;
use crate::translation::BatchTranslator;

use super::TranslatedDocument;
use super::model::{ParagraphDescriptor, RunFormat, TextUnit, UnitLocation, apportion};
use super::package::OoxmlPackage;
use super::xml::{XmlDocument, XmlElement, XmlNode, qualified};

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";

/// Name Word gives the default paragraph style
const DEFAULT_STYLE_NAME: &str = "Normal";

/// Containers whose runs count as part of the enclosing paragraph
const RUN_CONTAINERS: &[&str] = &["hyperlink", "ins", "smartTag"];

/// Paragraph styles declared in `word/styles.xml`
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    names_by_id: HashMap<String, String>,
    ids_by_name: HashMap<String, String>,
    default_id: Option<String>,
}

impl StyleSheet {
    pub fn parse(bytes: &[u8]) -> Result<Self, DocumentError> {
        let xml = XmlDocument::parse(bytes)?;
        let mut sheet = Self::default();

        for style in xml.root.children_named("style") {
            if style.attr("type") != Some("paragraph") {
                continue;
            }
            let Some(id) = style.attr("styleId") else {
                continue;
            };
            let name = style
                .child("name")
                .and_then(|n| n.attr("val"))
                .unwrap_or(id)
                .to_string();

            if matches!(style.attr("default"), Some("1") | Some("true") | Some("on")) {
                sheet.default_id = Some(id.to_string());
            }
            sheet.ids_by_name.insert(name.clone(), id.to_string());
            sheet.names_by_id.insert(id.to_string(), name);
        }

        debug!("Loaded {} paragraph styles", sheet.names_by_id.len());
        Ok(sheet)
    }

    pub fn is_empty(&self) -> bool {
        self.names_by_id.is_empty()
    }

    fn default_name(&self) -> String {
        self.default_id
            .as_ref()
            .and_then(|id| self.names_by_id.get(id))
            .cloned()
            .unwrap_or_else(|| DEFAULT_STYLE_NAME.to_string())
    }

    /// Name of the style a paragraph with `style_id` uses
    ///
    /// Unknown ids resolve to the default style, as Word does.
    pub fn name_for(&self, style_id: Option<&str>) -> String {
        match style_id {
            Some(id) if self.is_empty() => id.to_string(),
            Some(id) => self
                .names_by_id
                .get(id)
                .cloned()
                .unwrap_or_else(|| self.default_name()),
            None => self.default_name(),
        }
    }

    /// Style id to write for `name`; `None` means the default style
    pub fn id_for(&self, name: &str) -> Result<Option<String>, DocumentError> {
        if name == self.default_name() {
            return Ok(None);
        }
        if self.is_empty() {
            return Ok(Some(name.to_string()));
        }
        self.ids_by_name
            .get(name)
            .map(|id| Some(id.clone()))
            .ok_or_else(|| DocumentError::StyleNotFound(name.to_string()))
    }
}

/// An opened `.docx` package with its main document parsed
#[derive(Debug)]
pub struct WordDocument {
    package: OoxmlPackage,
    document: XmlDocument,
    styles: StyleSheet,
}

impl WordDocument {
    pub fn load(bytes: &[u8]) -> Result<Self, DocumentError> {
        let package = OoxmlPackage::from_bytes(bytes)?;
        let document = XmlDocument::parse(package.require_part(DOCUMENT_PART)?)?;
        let styles = match package.part(STYLES_PART) {
            Some(part) => StyleSheet::parse(part)?,
            None => StyleSheet::default(),
        };

        if document.root.child("body").is_none() {
            return Err(DocumentError::Structure("document has no body".to_string()));
        }

        Ok(Self {
            package,
            document,
            styles,
        })
    }

    pub fn styles(&self) -> &StyleSheet {
        &self.styles
    }

    fn body(&self) -> Result<&XmlElement, DocumentError> {
        self.document
            .root
            .child("body")
            .ok_or_else(|| DocumentError::Structure("document has no body".to_string()))
    }

    fn body_mut(&mut self) -> Result<&mut XmlElement, DocumentError> {
        self.document
            .root
            .child_mut("body")
            .ok_or_else(|| DocumentError::Structure("document has no body".to_string()))
    }

    /// Body paragraphs, in document order
    pub fn paragraphs(&self) -> Result<Vec<&XmlElement>, DocumentError> {
        Ok(self.body()?.children_named("p").collect())
    }

    /// Every non-blank paragraph, then every non-blank table cell
    pub fn extract(&self) -> Result<Vec<TextUnit>, DocumentError> {
        let body = self.body()?;
        let mut units = Vec::new();

        for (index, element) in body.elements().enumerate() {
            if !element.is("p") {
                continue;
            }
            let text = paragraph_text(element);
            if text.trim().is_empty() {
                continue;
            }

            let style_name = self.styles.name_for(paragraph_style_id(element));
            units.push(TextUnit {
                text,
                location: UnitLocation::Paragraph {
                    index,
                    style: ParagraphDescriptor { style_name },
                },
                runs: runs_of(element).into_iter().map(run_format).collect(),
            });
        }

        for (table, element) in body.elements().enumerate() {
            if !element.is("tbl") {
                continue;
            }
            for (row, tr) in element.children_named("tr").enumerate() {
                for (cell, tc) in tr.children_named("tc").enumerate() {
                    let text = cell_text(tc);
                    if text.trim().is_empty() {
                        continue;
                    }
                    let runs = tc
                        .children_named("p")
                        .flat_map(runs_of)
                        .map(run_format)
                        .collect();
                    units.push(TextUnit {
                        text,
                        location: UnitLocation::Cell { table, row, cell },
                        runs,
                    });
                }
            }
        }

        Ok(units)
    }

    /// Write `translated` back into the element `unit` was extracted from
    ///
    /// On error the element is left as it was.
    pub fn reinsert(&mut self, unit: &TextUnit, translated: &str) -> Result<(), DocumentError> {
        match &unit.location {
            UnitLocation::Paragraph { index, style } => {
                let style_id = self.styles.id_for(&style.style_name)?;
                let paragraph = self
                    .body_mut()?
                    .elements_mut()
                    .nth(*index)
                    .filter(|e| e.is("p"))
                    .ok_or_else(|| {
                        DocumentError::Structure(format!("no paragraph at body position {}", index))
                    })?;
                rewrite_paragraph(paragraph, style_id.as_deref(), &unit.runs, translated);
            }
            UnitLocation::Cell { table, row, cell } => {
                let tc = self
                    .body_mut()?
                    .elements_mut()
                    .nth(*table)
                    .filter(|e| e.is("tbl"))
                    .and_then(|tbl| tbl.nth_child_mut("tr", *row))
                    .and_then(|tr| tr.nth_child_mut("tc", *cell))
                    .ok_or_else(|| {
                        DocumentError::Structure(format!(
                            "no cell at table {} row {} cell {}",
                            table, row, cell
                        ))
                    })?;
                rewrite_cell(tc, unit.runs.first(), translated);
            }
        }
        Ok(())
    }

    /// Serialize the package with the rewritten main document
    pub fn save(&mut self) -> Result<Vec<u8>, DocumentError> {
        let xml = self.document.to_bytes()?;
        self.package.replace(DOCUMENT_PART, xml);
        self.package.to_bytes()
    }
}

/// Translate every unit of a `.docx` through `batch`
pub async fn translate(
    bytes: &[u8],
    batch: &BatchTranslator<'_>,
    target_language: &str,
) -> Result<TranslatedDocument, DocumentError> {
    let mut document = WordDocument::load(bytes)?;
    let units = document.extract()?;
    info!("Extracted {} text units from document", units.len());

    let report = batch
        .run(&units, target_language, |t| document.reinsert(t.unit, &t.text))
        .await;

    Ok(TranslatedDocument {
        bytes: document.save()?,
        report,
    })
}

/// Runs of a paragraph in order, including runs nested in hyperlinks and revisions
pub fn runs_of(paragraph: &XmlElement) -> Vec<&XmlElement> {
    let mut runs = Vec::new();
    for child in paragraph.elements() {
        if child.is("r") {
            runs.push(child);
        } else if RUN_CONTAINERS.contains(&child.local_name()) {
            runs.extend(runs_of(child));
        }
    }
    runs
}

pub fn run_text(run: &XmlElement) -> String {
    let mut text = String::new();
    for child in run.elements() {
        match child.local_name() {
            "t" => text.push_str(&child.text()),
            "tab" => text.push('\t'),
            "br" | "cr" => text.push('\n'),
            _ => {}
        }
    }
    text
}

pub fn paragraph_text(paragraph: &XmlElement) -> String {
    runs_of(paragraph).into_iter().map(run_text).collect()
}

pub fn cell_text(cell: &XmlElement) -> String {
    cell.children_named("p")
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join("\n")
}

fn paragraph_style_id(paragraph: &XmlElement) -> Option<&str> {
    paragraph
        .child("pPr")
        .and_then(|ppr| ppr.child("pStyle"))
        .and_then(|style| style.attr("val"))
}

/// Read a `w:b`-style toggle: absent is unset, no value means on
fn toggle(element: Option<&XmlElement>) -> Option<bool> {
    element.map(|e| !matches!(e.attr("val"), Some("0") | Some("false") | Some("off")))
}

pub fn run_format(run: &XmlElement) -> RunFormat {
    let text = run_text(run);
    let Some(rpr) = run.child("rPr") else {
        return RunFormat {
            text,
            ..Default::default()
        };
    };

    RunFormat {
        text,
        font_name: rpr
            .child("rFonts")
            .and_then(|f| f.attr("ascii"))
            .map(str::to_string),
        font_size: rpr
            .child("sz")
            .and_then(|sz| sz.attr("val"))
            .and_then(|v| v.parse::<f32>().ok())
            .map(|half_points| half_points / 2.0),
        bold: toggle(rpr.child("b")),
        italic: toggle(rpr.child("i")),
        underline: rpr.child("u").map(|u| u.attr("val") != Some("none")),
    }
}

/// Run properties in schema order
fn build_run_properties(prefix: &str, format: &RunFormat) -> Option<XmlElement> {
    if !format.has_profile() {
        return None;
    }
    let val = qualified(prefix, "val");
    let mut rpr = XmlElement::new(qualified(prefix, "rPr"));

    if let Some(name) = &format.font_name {
        rpr.push(
            XmlElement::new(qualified(prefix, "rFonts"))
                .with_attr(qualified(prefix, "ascii"), name.as_str())
                .with_attr(qualified(prefix, "hAnsi"), name.as_str()),
        );
    }
    for (local, value) in [("b", format.bold), ("i", format.italic)] {
        match value {
            Some(true) => rpr.push(XmlElement::new(qualified(prefix, local))),
            Some(false) => rpr.push(XmlElement::new(qualified(prefix, local)).with_attr(val.as_str(), "0")),
            None => {}
        }
    }
    if let Some(size) = format.font_size {
        let half_points = (size * 2.0).round() as u32;
        rpr.push(XmlElement::new(qualified(prefix, "sz")).with_attr(val.as_str(), half_points.to_string()));
    }
    if let Some(underline) = format.underline {
        let value = if underline { "single" } else { "none" };
        rpr.push(XmlElement::new(qualified(prefix, "u")).with_attr(val.as_str(), value));
    }

    Some(rpr)
}

fn push_text_segment(run: &mut XmlElement, prefix: &str, segment: &str) {
    if segment.is_empty() {
        return;
    }
    let mut t = XmlElement::new(qualified(prefix, "t"));
    if segment.starts_with(char::is_whitespace) || segment.ends_with(char::is_whitespace) {
        t.set_attr("xml:space", "preserve");
    }
    t.push_text(segment);
    run.push(t);
}

/// A new run carrying `text`, with tabs and line breaks as their own elements
pub fn build_run(prefix: &str, format: Option<&RunFormat>, text: &str) -> XmlElement {
    let mut run = XmlElement::new(qualified(prefix, "r"));
    if let Some(rpr) = format.and_then(|f| build_run_properties(prefix, f)) {
        run.push(rpr);
    }

    let mut segment = String::new();
    for ch in text.chars() {
        let special = match ch {
            '\t' => "tab",
            '\n' => "br",
            _ => {
                segment.push(ch);
                continue;
            }
        };
        push_text_segment(&mut run, prefix, &segment);
        segment.clear();
        run.push(XmlElement::new(qualified(prefix, special)));
    }
    push_text_segment(&mut run, prefix, &segment);

    run
}

fn set_paragraph_style(paragraph: &mut XmlElement, style_id: Option<&str>) {
    let prefix = paragraph.prefix().to_string();

    let Some(style_id) = style_id else {
        if let Some(ppr) = paragraph.child_mut("pPr") {
            ppr.children.retain(|node| {
                !matches!(node, XmlNode::Element(e) if e.is("pStyle"))
            });
        }
        return;
    };

    if paragraph.child("pPr").is_none() {
        paragraph
            .children
            .insert(0, XmlNode::Element(XmlElement::new(qualified(&prefix, "pPr"))));
    }
    if let Some(ppr) = paragraph.child_mut("pPr") {
        match ppr.child_mut("pStyle") {
            Some(existing) => existing.set_attr(qualified(&prefix, "val"), style_id),
            None => ppr.children.insert(
                0,
                XmlNode::Element(
                    XmlElement::new(qualified(&prefix, "pStyle")).with_attr(qualified(&prefix, "val"), style_id),
                ),
            ),
        }
    }
}

fn rewrite_paragraph(paragraph: &mut XmlElement, style_id: Option<&str>, runs: &[RunFormat], translated: &str) {
    paragraph.retain_elements(&["pPr"]);
    set_paragraph_style(paragraph, style_id);
    let prefix = paragraph.prefix().to_string();

    if runs.len() <= 1 {
        paragraph.push(build_run(&prefix, runs.first(), translated));
        return;
    }

    let lengths: Vec<usize> = runs.iter().map(|r| r.text.chars().count()).collect();
    for (piece, format) in apportion(translated, &lengths).into_iter().zip(runs) {
        paragraph.push(build_run(&prefix, Some(format), piece));
    }
}

fn rewrite_cell(cell: &mut XmlElement, first_run: Option<&RunFormat>, translated: &str) {
    cell.retain_elements(&["tcPr"]);
    let prefix = cell.prefix().to_string();
    let paragraph = XmlElement::new(qualified(&prefix, "p")).with_child(build_run(&prefix, first_run, translated));
    cell.push(paragraph);
}
