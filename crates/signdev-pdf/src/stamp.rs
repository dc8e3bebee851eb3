//! Drawing signature text into page content streams

use crate::coords::view_to_pdf;
use crate::error::{PdfError, Result};
use crate::parser::PdfDocument;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream, StringFormat};
use std::collections::BTreeMap;
use tracing::debug;

/// Resource name prefix for the font this crate embeds
const FONT_RESOURCE_PREFIX: &str = "SdFont";

/// The base-14 fonts every conforming viewer provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StandardFont {
    #[default]
    Helvetica,
    TimesRoman,
    Courier,
}

impl StandardFont {
    pub fn base_font(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::TimesRoman => "Times-Roman",
            StandardFont::Courier => "Courier",
        }
    }
}

/// How stamped text looks
#[derive(Debug, Clone, PartialEq)]
pub struct StampStyle {
    pub font: StandardFont,
    pub size: f64,
    pub color: [f64; 3],
}

impl Default for StampStyle {
    fn default() -> Self {
        Self {
            font: StandardFont::Helvetica,
            size: 26.0,
            color: [0.1, 0.1, 0.8],
        }
    }
}

/// Text to draw at a view-space position on a 1-indexed page
#[derive(Debug, Clone, PartialEq)]
pub struct TextStamp {
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub text: String,
}

/// A resolved draw in PDF user space
#[derive(Debug, Clone, PartialEq)]
pub struct DrawOp {
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub text: String,
}

/// Work out where every stamp lands, in page order.
///
/// Stamps naming a page the document does not have are skipped.
pub fn plan_draws(doc: &PdfDocument, stamps: &[TextStamp]) -> Result<Vec<DrawOp>> {
    let mut ops = Vec::new();
    for (page_num, page_id) in doc.pages() {
        let page_box = doc.media_box(page_id)?;
        for stamp in stamps.iter().filter(|s| s.page == page_num) {
            let (x, y) = view_to_pdf(stamp.x, stamp.y, page_box.height);
            ops.push(DrawOp {
                page: page_num,
                x,
                y,
                text: stamp.text.clone(),
            });
        }
    }

    let skipped = stamps.len() - ops.len();
    if skipped > 0 {
        debug!(skipped, "Stamps reference pages outside the document");
    }
    Ok(ops)
}

/// Load `bytes`, draw every stamp, and return the re-serialized PDF
pub fn stamp_text(bytes: &[u8], stamps: &[TextStamp], style: &StampStyle) -> Result<Vec<u8>> {
    let mut doc = PdfDocument::from_bytes(bytes.to_vec())?;
    let ops = plan_draws(&doc, stamps)?;

    let font_id = doc.doc_mut().add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => style.font.base_font(),
        "Encoding" => "WinAnsiEncoding",
    });

    let mut by_page: BTreeMap<u32, Vec<&DrawOp>> = BTreeMap::new();
    for op in &ops {
        by_page.entry(op.page).or_default().push(op);
    }

    for (page_num, page_ops) in by_page {
        let page_id = doc
            .page_id(page_num)
            .ok_or(PdfError::PageNotFound(page_num))?;
        let font_name = attach_font(&mut doc, page_id, font_id)?;
        let content = encode_draws(&page_ops, &font_name, style)?;
        append_content(&mut doc, page_id, content)?;
    }

    debug!(draws = ops.len(), "Stamped signature text");
    doc.save_to_bytes()
}

/// Make the embedded font reachable from the page's resources, returning its resource name
fn attach_font(doc: &mut PdfDocument, page_id: ObjectId, font_id: ObjectId) -> Result<String> {
    // Resources may be inline, referenced, or inherited from the page tree.
    // Resolve them into an inline copy on the page so edits stay local.
    let mut resources = match doc.inherited_attribute(page_id, b"Resources")? {
        Some(obj) => doc.resolve_dictionary(&obj)?,
        None => Dictionary::new(),
    };
    let mut fonts = match resources.get(b"Font") {
        Ok(obj) => doc.resolve_dictionary(obj)?,
        Err(_) => Dictionary::new(),
    };

    let name = unique_resource_name(&fonts);
    fonts.set(name.as_bytes().to_vec(), Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    page_dict_mut(doc, page_id)?.set("Resources", Object::Dictionary(resources));
    Ok(name)
}

fn unique_resource_name(fonts: &Dictionary) -> String {
    let mut suffix = 0usize;
    loop {
        let candidate = format!("{}{}", FONT_RESOURCE_PREFIX, suffix);
        if !fonts.has(candidate.as_bytes()) {
            return candidate;
        }
        suffix += 1;
    }
}

fn encode_draws(ops: &[&DrawOp], font_name: &str, style: &StampStyle) -> Result<Vec<u8>> {
    let [r, g, b] = style.color;
    let mut operations = vec![
        Operation::new("q", vec![]),
        Operation::new(
            "rg",
            vec![
                Object::Real(r as f32),
                Object::Real(g as f32),
                Object::Real(b as f32),
            ],
        ),
    ];
    for op in ops {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![
                Object::Name(font_name.as_bytes().to_vec()),
                Object::Real(style.size as f32),
            ],
        ));
        operations.push(Operation::new(
            "Td",
            vec![Object::Real(op.x as f32), Object::Real(op.y as f32)],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(
                encode_win_ansi(&op.text),
                StringFormat::Literal,
            )],
        ));
        operations.push(Operation::new("ET", vec![]));
    }
    operations.push(Operation::new("Q", vec![]));

    Content { operations }
        .encode()
        .map_err(|e| PdfError::Save(format!("Failed to encode content stream: {}", e)))
}

/// Append a content stream to a page.
///
/// Existing content is wrapped in q/Q so graphics state it leaves behind
/// does not move the stamped text.
fn append_content(doc: &mut PdfDocument, page_id: ObjectId, content: Vec<u8>) -> Result<()> {
    let existing = doc.dictionary(page_id)?.get(b"Contents").ok().cloned();

    let inner = doc.doc_mut();
    let stamp_id = inner.add_object(Stream::new(Dictionary::new(), content));

    let contents = match existing {
        None => Object::Reference(stamp_id),
        Some(existing) => {
            let save_id = inner.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            let restore_id = inner.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));

            let mut refs = vec![Object::Reference(save_id)];
            match existing {
                Object::Array(items) => refs.extend(items),
                other => refs.push(other),
            }
            refs.push(Object::Reference(restore_id));
            refs.push(Object::Reference(stamp_id));
            Object::Array(refs)
        }
    };

    page_dict_mut(doc, page_id)?.set("Contents", contents);
    Ok(())
}

fn page_dict_mut(doc: &mut PdfDocument, page_id: ObjectId) -> Result<&mut Dictionary> {
    doc.doc_mut()
        .get_object_mut(page_id)
        .map_err(|e| PdfError::Structure(format!("Failed to get page object: {}", e)))?
        .as_dict_mut()
        .map_err(|_| PdfError::Structure("Page is not a dictionary".to_string()))
}

/// Map text onto WinAnsi bytes for a simple Type1 font.
///
/// Latin-1 code points carry over, the CP1252 punctuation block maps into
/// 0x80..=0x9F, and anything else becomes `?`.
fn encode_win_ansi(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u32 as u8,
            _ => cp1252_high(c).unwrap_or(b'?'),
        })
        .collect()
}

fn cp1252_high(c: char) -> Option<u8> {
    let byte = match c {
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '•' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(byte)
}
