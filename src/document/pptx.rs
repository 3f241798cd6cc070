/*!
 * Presentation (`.pptx`) documents.
 *
 * Each top-level text shape on each slide is one unit. Its translation
 * replaces the shape's paragraphs outright; no run formatting survives
 * beyond the first paragraph's properties.
 */

use log::info;

use crate::errors::DocumentError;
use crate::translation::{BatchTranslator, Translatable};

use super::TranslatedDocument;
use super::package::OoxmlPackage;
use super::xml::{XmlDocument, XmlElement, qualified};

const SLIDE_PREFIX: &str = "ppt/slides/slide";

/// Paragraph break inside one shape paragraph (`a:br`)
const LINE_BREAK: char = '\u{b}';

/// Text of one shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeUnit {
    pub text: String,
    /// Position in slide order
    pub slide: usize,
    /// Index of the shape among the shape tree's child elements
    pub shape: usize,
}

impl Translatable for ShapeUnit {
    fn source_text(&self) -> &str {
        &self.text
    }
}

struct Slide {
    part: String,
    xml: XmlDocument,
    dirty: bool,
}

/// An opened `.pptx` package with its slides parsed
pub struct Presentation {
    package: OoxmlPackage,
    slides: Vec<Slide>,
}

/// Slide number of a `ppt/slides/slideN.xml` part name
fn slide_number(name: &str) -> Option<u32> {
    name.strip_prefix(SLIDE_PREFIX)?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

impl Presentation {
    pub fn load(bytes: &[u8]) -> Result<Self, DocumentError> {
        let package = OoxmlPackage::from_bytes(bytes)?;

        let mut names: Vec<(u32, String)> = package
            .part_names()
            .filter_map(|name| slide_number(name).map(|n| (n, name.to_string())))
            .collect();
        names.sort();

        let mut slides = Vec::with_capacity(names.len());
        for (_, part) in names {
            let xml = XmlDocument::parse(package.require_part(&part)?)?;
            slides.push(Slide {
                part,
                xml,
                dirty: false,
            });
        }

        Ok(Self { package, slides })
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Every shape with non-blank text, slide by slide
    pub fn extract(&self) -> Vec<ShapeUnit> {
        let mut units = Vec::new();
        for (slide, entry) in self.slides.iter().enumerate() {
            let Some(tree) = shape_tree(&entry.xml.root) else {
                continue;
            };
            for (shape, element) in tree.elements().enumerate() {
                if !element.is("sp") {
                    continue;
                }
                let Some(body) = element.child("txBody") else {
                    continue;
                };
                let text = shape_text(body);
                if text.trim().is_empty() {
                    continue;
                }
                units.push(ShapeUnit { text, slide, shape });
            }
        }
        units
    }

    /// Replace the text of the shape `unit` came from
    pub fn reinsert(&mut self, unit: &ShapeUnit, translated: &str) -> Result<(), DocumentError> {
        let slide = self
            .slides
            .get_mut(unit.slide)
            .ok_or_else(|| DocumentError::Structure(format!("no slide {}", unit.slide)))?;

        let body = shape_tree_mut(&mut slide.xml.root)
            .and_then(|tree| tree.elements_mut().nth(unit.shape))
            .filter(|shape| shape.is("sp"))
            .and_then(|shape| shape.child_mut("txBody"))
            .ok_or_else(|| {
                DocumentError::Structure(format!("no text shape {} on slide {}", unit.shape, unit.slide))
            })?;

        set_shape_text(body, translated);
        slide.dirty = true;
        Ok(())
    }

    pub fn save(&mut self) -> Result<Vec<u8>, DocumentError> {
        for slide in self.slides.iter().filter(|s| s.dirty) {
            self.package.replace(&slide.part, slide.xml.to_bytes()?);
        }
        self.package.to_bytes()
    }
}

/// Translate every text shape of a `.pptx` through `batch`
pub async fn translate(
    bytes: &[u8],
    batch: &BatchTranslator<'_>,
    target_language: &str,
) -> Result<TranslatedDocument, DocumentError> {
    let mut presentation = Presentation::load(bytes)?;
    let units = presentation.extract();
    info!(
        "Extracted {} text shapes from {} slides",
        units.len(),
        presentation.slide_count()
    );

    let report = batch
        .run(&units, target_language, |t| presentation.reinsert(t.unit, &t.text))
        .await;

    Ok(TranslatedDocument {
        bytes: presentation.save()?,
        report,
    })
}

fn shape_tree(root: &XmlElement) -> Option<&XmlElement> {
    root.child("cSld")?.child("spTree")
}

fn shape_tree_mut(root: &mut XmlElement) -> Option<&mut XmlElement> {
    root.child_mut("cSld")?.child_mut("spTree")
}

fn paragraph_text(paragraph: &XmlElement) -> String {
    let mut text = String::new();
    for child in paragraph.elements() {
        match child.local_name() {
            "r" | "fld" => {
                if let Some(t) = child.child("t") {
                    text.push_str(&t.text());
                }
            }
            "br" => text.push(LINE_BREAK),
            _ => {}
        }
    }
    text
}

/// Paragraphs of a text body joined by newlines
pub fn shape_text(body: &XmlElement) -> String {
    body.children_named("p")
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replace every paragraph of `body` with one paragraph per line of `text`
pub fn set_shape_text(body: &mut XmlElement, text: &str) {
    let first = body.child("p");
    let prefix = first.map(|p| p.prefix().to_string()).unwrap_or_else(|| "a".to_string());
    let paragraph_props = first.and_then(|p| p.child("pPr")).cloned();
    let end_props = first.and_then(|p| p.child("endParaRPr")).cloned();

    body.retain_elements(&["bodyPr", "lstStyle"]);

    for line in text.split('\n') {
        let mut paragraph = XmlElement::new(qualified(&prefix, "p"));
        if let Some(props) = &paragraph_props {
            paragraph.push(props.clone());
        }
        for (i, segment) in line.split(LINE_BREAK).enumerate() {
            if i > 0 {
                paragraph.push(XmlElement::new(qualified(&prefix, "br")));
            }
            if segment.is_empty() {
                continue;
            }
            let mut t = XmlElement::new(qualified(&prefix, "t"));
            t.push_text(segment);
            paragraph.push(XmlElement::new(qualified(&prefix, "r")).with_child(t));
        }
        if let Some(props) = &end_props {
            paragraph.push(props.clone());
        }
        body.push(paragraph);
    }
}
