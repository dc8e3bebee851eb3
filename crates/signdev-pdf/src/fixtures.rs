//! Small in-memory PDFs for tests

use lopdf::{dictionary, Document, Object, Stream};

/// A document with one page per `(width, height)` entry, each carrying its own MediaBox
pub fn pages(sizes: &[(f32, f32)]) -> Vec<u8> {
    build(sizes, false)
}

/// `count` US Letter pages
pub fn letter_pages(count: usize) -> Vec<u8> {
    pages(&vec![(612.0, 792.0); count])
}

/// A single page whose MediaBox and Resources live on the Pages node
pub fn inherited_media_box(width: f32, height: f32) -> Vec<u8> {
    build(&[(width, height)], true)
}

fn build(sizes: &[(f32, f32)], inherit: bool) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources = dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    };

    let mut kids: Vec<Object> = Vec::new();
    for &(width, height) in sizes {
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            b"BT /F1 12 Tf 72 72 Td (fixture) Tj ET".to_vec(),
        ));
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        if !inherit {
            page.set("MediaBox", media_box(width, height));
            page.set("Resources", resources.clone());
        }
        kids.push(doc.add_object(page).into());
    }

    let mut pages = dictionary! {
        "Type" => "Pages",
        "Count" => sizes.len() as i64,
        "Kids" => kids,
    };
    if inherit {
        if let Some(&(width, height)) = sizes.first() {
            pages.set("MediaBox", media_box(width, height));
        }
        pages.set("Resources", resources);
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("fixture PDF serializes");
    bytes
}

fn media_box(width: f32, height: f32) -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Real(width),
        Object::Real(height),
    ])
}
