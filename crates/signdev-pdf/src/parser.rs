//! PDF parsing using lopdf

use crate::error::{PdfError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};

/// Parent links followed before giving up on an inherited attribute
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Page box in PDF points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PageBox {
    /// US Letter, used when a page tree carries no MediaBox at all
    pub const LETTER: PageBox = PageBox {
        x: 0.0,
        y: 0.0,
        width: 612.0,
        height: 792.0,
    };
}

/// Wrapper around lopdf::Document
pub struct PdfDocument {
    pub(crate) doc: Document,
}

impl PdfDocument {
    /// Load a PDF from raw bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let doc = Document::load_mem(&bytes).map_err(|e| PdfError::Parse(e.to_string()))?;
        Ok(Self { doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Get page object ID for a given page number (1-indexed)
    pub fn page_id(&self, page_num: u32) -> Option<ObjectId> {
        self.doc.get_pages().get(&page_num).copied()
    }

    /// Page numbers with their object ids, in page order
    pub fn pages(&self) -> Vec<(u32, ObjectId)> {
        self.doc.get_pages().into_iter().collect()
    }

    /// Get the MediaBox of a page (1-indexed)
    pub fn page_box(&self, page_num: u32) -> Result<PageBox> {
        let page_id = self
            .page_id(page_num)
            .ok_or(PdfError::PageNotFound(page_num))?;
        self.media_box(page_id)
    }

    /// Extract the MediaBox for a page, walking up the page tree if needed
    pub(crate) fn media_box(&self, page_id: ObjectId) -> Result<PageBox> {
        match self.inherited_attribute(page_id, b"MediaBox")? {
            Some(media_box) => self.parse_rect(&media_box),
            None => Ok(PageBox::LETTER),
        }
    }

    /// Look up an inheritable page attribute (MediaBox, Resources)
    pub(crate) fn inherited_attribute(
        &self,
        page_id: ObjectId,
        key: &[u8],
    ) -> Result<Option<Object>> {
        let mut node = page_id;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            let dict = self.dictionary(node)?;
            if let Ok(value) = dict.get(key) {
                return Ok(Some(value.clone()));
            }
            match dict.get(b"Parent").and_then(Object::as_reference) {
                Ok(parent) => node = parent,
                Err(_) => return Ok(None),
            }
        }
        Err(PdfError::Structure(
            "Page tree too deep or cyclic".to_string(),
        ))
    }

    pub(crate) fn dictionary(&self, id: ObjectId) -> Result<&Dictionary> {
        self.doc
            .get_object(id)
            .map_err(|e| PdfError::Structure(format!("Failed to get object {:?}: {}", id, e)))?
            .as_dict()
            .map_err(|_| PdfError::Structure(format!("Object {:?} is not a dictionary", id)))
    }

    /// Resolve an object that should be a dictionary, following one reference
    pub(crate) fn resolve_dictionary(&self, obj: &Object) -> Result<Dictionary> {
        match obj {
            Object::Dictionary(d) => Ok(d.clone()),
            Object::Reference(id) => self.dictionary(*id).cloned(),
            _ => Err(PdfError::Structure("Expected a dictionary".to_string())),
        }
    }

    /// Parse a PDF rectangle array into a page box
    fn parse_rect(&self, obj: &Object) -> Result<PageBox> {
        let arr = match obj {
            Object::Array(a) => a,
            Object::Reference(id) => self
                .doc
                .get_object(*id)
                .map_err(|e| PdfError::Structure(format!("Failed to resolve reference: {}", e)))?
                .as_array()
                .map_err(|_| PdfError::Structure("MediaBox reference is not an array".into()))?,
            _ => return Err(PdfError::Structure("MediaBox is not an array".to_string())),
        };

        if arr.len() != 4 {
            return Err(PdfError::Structure(format!(
                "MediaBox has {} elements, expected 4",
                arr.len()
            )));
        }

        let mut values = [0.0f64; 4];
        for (i, obj) in arr.iter().enumerate() {
            values[i] = self.extract_number(obj)?;
        }

        // [x1, y1, x2, y2] -> origin plus extent
        Ok(PageBox {
            x: values[0],
            y: values[1],
            width: values[2] - values[0],
            height: values[3] - values[1],
        })
    }

    fn extract_number(&self, obj: &Object) -> Result<f64> {
        match obj {
            Object::Integer(i) => Ok(*i as f64),
            Object::Real(r) => Ok(*r as f64),
            Object::Reference(id) => {
                let resolved = self
                    .doc
                    .get_object(*id)
                    .map_err(|e| PdfError::Structure(format!("Failed to resolve: {}", e)))?;
                self.extract_number(resolved)
            }
            _ => Err(PdfError::Structure(
                "Expected number in rectangle".to_string(),
            )),
        }
    }

    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Serialize the document
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| PdfError::Save(e.to_string()))?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_from_bytes_valid_pdf() {
        let pdf = PdfDocument::from_bytes(fixtures::letter_pages(2)).unwrap();
        assert_eq!(pdf.page_count(), 2);
    }

    #[test]
    fn test_from_bytes_html_fails() {
        // What a misrouted view endpoint hands back instead of a PDF
        let html = b"<!DOCTYPE html><html><head></head><body>Not a PDF</body></html>";
        let err = PdfDocument::from_bytes(html.to_vec()).err().unwrap();
        assert!(matches!(err, PdfError::Parse(_)));
    }

    #[test]
    fn test_from_bytes_empty_fails() {
        assert!(PdfDocument::from_bytes(vec![]).is_err());
    }

    #[test]
    fn test_page_box_direct() {
        let pdf = PdfDocument::from_bytes(fixtures::pages(&[(595.0, 842.0)])).unwrap();
        let b = pdf.page_box(1).unwrap();
        assert_eq!(b.width, 595.0);
        assert_eq!(b.height, 842.0);
    }

    #[test]
    fn test_page_box_inherited_from_parent() {
        let pdf = PdfDocument::from_bytes(fixtures::inherited_media_box(300.0, 400.0)).unwrap();
        let b = pdf.page_box(1).unwrap();
        assert_eq!(b.width, 300.0);
        assert_eq!(b.height, 400.0);
    }

    #[test]
    fn test_page_box_missing_page() {
        let pdf = PdfDocument::from_bytes(fixtures::letter_pages(1)).unwrap();
        assert!(matches!(pdf.page_box(5), Err(PdfError::PageNotFound(5))));
    }

    #[test]
    fn test_parse_rect_array() {
        let pdf = PdfDocument {
            doc: lopdf::Document::new(),
        };
        let arr = Object::Array(vec![
            Object::Integer(10),
            Object::Integer(20),
            Object::Integer(622),
            Object::Real(812.0),
        ]);
        let b = pdf.parse_rect(&arr).unwrap();
        assert_eq!(b.x, 10.0);
        assert_eq!(b.y, 20.0);
        assert_eq!(b.width, 612.0);
        assert_eq!(b.height, 792.0);
    }

    #[test]
    fn test_parse_rect_wrong_length() {
        let pdf = PdfDocument {
            doc: lopdf::Document::new(),
        };
        let arr = Object::Array(vec![Object::Integer(0), Object::Integer(0)]);
        assert!(pdf.parse_rect(&arr).is_err());
    }
}
