//! Signature placement and the save pipeline
//!
//! A [`SignatureEditor`] is one editing session over one PDF. Placements are
//! kept in view space (origin top-left of the rendered page) and only turned
//! into PDF coordinates when the document is stamped on save.

use crate::api::SignDevApi;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::notify::Notifier;
use crate::upload::{PdfFile, PreviewHandle};
use signdev_pdf::{rendered_height, stamp_text, PageBox, PdfDocument, StampStyle, TextStamp};
use signdev_types::{FontChoice, FontSource, Placement, PlacementId, PlacementSubmission};
use tracing::{debug, error, info};

pub const DEFAULT_TEXT: &str = "Your Name";

pub const NOTHING_TO_SAVE: &str = "Upload and drop at least one signature.";

pub const SAVED: &str = "Signed PDF saved!";

#[derive(Debug, Clone)]
pub struct EditorOptions {
    pub font_source: FontSource,
    pub style: StampStyle,
    /// Width pages are rendered at for placement
    pub render_width: f64,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            font_source: FontSource::default(),
            style: StampStyle::default(),
            render_width: signdev_pdf::DEFAULT_RENDER_WIDTH,
        }
    }
}

impl EditorOptions {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            font_source: config.font_source.clone(),
            render_width: config.render_width,
            ..Self::default()
        }
    }
}

/// Pointer position in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagePoint {
    pub x: f64,
    pub y: f64,
}

/// Bounding box of a rendered page container in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PageRect {
    /// Offset of `point` from the container's top-left corner
    pub fn relative(&self, point: PagePoint) -> (f64, f64) {
        (point.x - self.left, point.y - self.top)
    }
}

/// Size a page is rendered at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageView {
    pub page: u32,
    pub width: f64,
    pub height: f64,
}

/// What a successful save produced
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    pub document_id: String,
    /// True when the save created a new document rather than replacing one
    pub created: bool,
    pub placement_count: usize,
}

struct Loaded {
    file: PdfFile,
    preview: PreviewHandle,
    pages: Vec<PageBox>,
}

pub struct SignatureEditor {
    options: EditorOptions,
    loaded: Option<Loaded>,
    document_id: Option<String>,
    public_token: Option<String>,
    text: String,
    font: FontChoice,
    placements: Vec<Placement>,
    dragging: Option<PlacementId>,
}

impl SignatureEditor {
    pub fn new(options: EditorOptions) -> Self {
        let font = options
            .font_source
            .fonts()
            .into_iter()
            .next()
            .unwrap_or_else(|| FontChoice::system(options.style.font.base_font()));

        Self {
            options,
            loaded: None,
            document_id: None,
            public_token: None,
            text: DEFAULT_TEXT.to_string(),
            font,
            placements: Vec::new(),
            dragging: None,
        }
    }

    /// Editor over a stored document; saving replaces it
    pub fn for_document(
        options: EditorOptions,
        document_id: &str,
        file: PdfFile,
        preview: PreviewHandle,
    ) -> Result<Self> {
        let mut editor = Self::new(options);
        editor.load(file, preview)?;
        editor.document_id = Some(document_id.to_string());
        Ok(editor)
    }

    /// Attribute the save to a share link
    pub fn with_public_token(mut self, token: &str) -> Self {
        self.public_token = Some(token.to_string());
        self
    }

    /// Show a new file. Existing placements belong to the old file and are dropped.
    pub fn load(&mut self, file: PdfFile, preview: PreviewHandle) -> Result<()> {
        let doc = PdfDocument::from_bytes(file.bytes.clone())?;
        let pages = doc
            .pages()
            .into_iter()
            .map(|(n, _)| doc.page_box(n))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(name = %file.name, pages = pages.len(), "Loaded document for signing");
        self.loaded = Some(Loaded {
            file,
            preview,
            pages,
        });
        self.placements.clear();
        self.dragging = None;
        Ok(())
    }

    /// Close the file and forget all placements, releasing the preview
    pub fn discard(&mut self) {
        self.loaded = None;
        self.placements.clear();
        self.dragging = None;
    }

    pub fn file(&self) -> Option<&PdfFile> {
        self.loaded.as_ref().map(|l| &l.file)
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.loaded.as_ref().map(|l| l.preview.url())
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    pub fn public_token(&self) -> Option<&str> {
        self.public_token.as_deref()
    }

    pub fn page_count(&self) -> u32 {
        self.loaded.as_ref().map_or(0, |l| l.pages.len() as u32)
    }

    /// Rendered size of every page at the configured width
    pub fn page_views(&self) -> Vec<PageView> {
        let Some(loaded) = &self.loaded else {
            return Vec::new();
        };
        let width = self.options.render_width;
        loaded
            .pages
            .iter()
            .zip(1u32..)
            .map(|(b, page)| PageView {
                page,
                width,
                height: rendered_height(b.width, b.height, width),
            })
            .collect()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    pub fn font(&self) -> &FontChoice {
        &self.font
    }

    pub fn fonts(&self) -> Vec<FontChoice> {
        self.options.font_source.fonts()
    }

    pub fn select_font(&mut self, name: &str) -> Result<()> {
        let font = self
            .options
            .font_source
            .find(name)
            .ok_or_else(|| ClientError::Validation(format!("Unknown font: {}", name)))?;
        self.font = font;
        Ok(())
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn placements_on(&self, page: u32) -> impl Iterator<Item = &Placement> {
        self.placements.iter().filter(move |p| p.page == page)
    }

    /// Place the current text where the pointer was released over `page`
    pub fn drop_on_page(&mut self, page: u32, pointer: PagePoint, rect: PageRect) -> Result<PlacementId> {
        let (x, y) = rect.relative(pointer);
        self.place(page, x, y)
    }

    pub fn place(&mut self, page: u32, x: f64, y: f64) -> Result<PlacementId> {
        self.check_page(page)?;
        let placement = Placement::new(page, x, y, &self.font.name, &self.text);
        let id = placement.id;
        debug!(%id, page, x, y, "Placed signature");
        self.placements.push(placement);
        Ok(id)
    }

    fn check_page(&self, page: u32) -> Result<()> {
        let count = self.page_count();
        if count == 0 {
            return Err(ClientError::Validation("No document loaded".to_string()));
        }
        if page == 0 || page > count {
            return Err(ClientError::Validation(format!(
                "Page {} is outside the document (1-{})",
                page, count
            )));
        }
        Ok(())
    }

    pub fn begin_drag(&mut self, id: PlacementId) -> Result<()> {
        if !self.placements.iter().any(|p| p.id == id) {
            return Err(ClientError::Validation(format!("No placement {}", id)));
        }
        self.dragging = Some(id);
        Ok(())
    }

    pub fn dragging(&self) -> Option<PlacementId> {
        self.dragging
    }

    /// Finish a drag at `pointer`, relative to the page the placement sits on.
    ///
    /// Returns false when no drag was active or the dragged placement is gone.
    pub fn end_drag(&mut self, pointer: PagePoint, rect: PageRect) -> bool {
        let Some(id) = self.dragging.take() else {
            return false;
        };
        let (x, y) = rect.relative(pointer);
        self.move_to(id, x, y)
    }

    pub fn move_to(&mut self, id: PlacementId, x: f64, y: f64) -> bool {
        match self.placements.iter_mut().find(|p| p.id == id) {
            Some(placement) => {
                placement.x = x;
                placement.y = y;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: PlacementId) -> Option<Placement> {
        let index = self.placements.iter().position(|p| p.id == id)?;
        if self.dragging == Some(id) {
            self.dragging = None;
        }
        Some(self.placements.remove(index))
    }

    /// The placements as stamps for the PDF writer
    pub fn stamps(&self) -> Vec<TextStamp> {
        self.placements
            .iter()
            .map(|p| TextStamp {
                page: p.page,
                x: p.x,
                y: p.y,
                text: p.text.clone(),
            })
            .collect()
    }

    /// Stamp, upload and record the placements.
    ///
    /// Placements are kept on failure so the user can retry.
    pub async fn save<F>(
        &mut self,
        api: &dyn SignDevApi,
        notifier: &dyn Notifier,
        on_save: F,
    ) -> Result<SaveOutcome>
    where
        F: FnOnce(&SaveOutcome),
    {
        let file = match &self.loaded {
            Some(loaded) if !self.placements.is_empty() => loaded.file.clone(),
            _ => {
                notifier.error(NOTHING_TO_SAVE);
                return Err(ClientError::Validation(NOTHING_TO_SAVE.to_string()));
            }
        };

        match self.persist(api, &file).await {
            Ok(outcome) => {
                info!(
                    document_id = %outcome.document_id,
                    created = outcome.created,
                    placements = outcome.placement_count,
                    "Saved signed document"
                );
                notifier.info(SAVED);
                on_save(&outcome);
                Ok(outcome)
            }
            Err(e) => {
                error!(error = %e, "Save failed");
                notifier.error(&format!("Save failed: {}", e.describe()));
                Err(e)
            }
        }
    }

    async fn persist(&self, api: &dyn SignDevApi, file: &PdfFile) -> Result<SaveOutcome> {
        let signed = stamp_text(&file.bytes, &self.stamps(), &self.options.style)?;

        let (document_id, created) = match &self.document_id {
            Some(id) => {
                api.replace_document(id, &file.name, signed).await?;
                (id.clone(), false)
            }
            None => (api.create_document(&file.name, signed).await?.id, true),
        };

        let submission = PlacementSubmission::new(
            &document_id,
            &self.placements,
            self.public_token.as_deref(),
        );
        api.submit_placements(&submission).await?;

        Ok(SaveOutcome {
            document_id,
            created,
            placement_count: self.placements.len(),
        })
    }
}

impl std::fmt::Debug for SignatureEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureEditor")
            .field("file", &self.file().map(|file| &file.name))
            .field("document_id", &self.document_id)
            .field("placements", &self.placements.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{NoticeLevel, RecordingNotifier};
    use crate::test_support::MockApi;
    use crate::upload::PreviewRegistry;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use signdev_pdf::{fixtures, plan_draws};

    fn editor_with(bytes: Vec<u8>, registry: &PreviewRegistry) -> SignatureEditor {
        let mut editor = SignatureEditor::new(EditorOptions::default());
        let preview = registry.create(bytes.clone());
        editor.load(PdfFile::pdf("lease.pdf", bytes), preview).unwrap();
        editor
    }

    fn rect(left: f64, top: f64) -> PageRect {
        PageRect {
            left,
            top,
            width: 600.0,
            height: 776.0,
        }
    }

    #[test]
    fn test_defaults() {
        let editor = SignatureEditor::new(EditorOptions::default());
        assert_eq!(editor.text(), "Your Name");
        assert_eq!(editor.font().name, "Pacifico");
        assert_eq!(editor.page_count(), 0);
    }

    #[test]
    fn test_drop_records_rect_relative_position() {
        let registry = PreviewRegistry::new();
        let mut editor = editor_with(fixtures::letter_pages(3), &registry);
        editor.set_text("Ada Lovelace");
        editor.select_font("Great Vibes").unwrap();

        let id = editor
            .drop_on_page(2, PagePoint { x: 310.0, y: 1240.0 }, rect(40.0, 900.0))
            .unwrap();

        let placement = &editor.placements()[0];
        assert_eq!(placement.id, id);
        assert_eq!(placement.page, 2);
        assert_eq!((placement.x, placement.y), (270.0, 340.0));
        assert_eq!(placement.text, "Ada Lovelace");
        assert_eq!(placement.font, "Great Vibes");
    }

    proptest! {
        #[test]
        fn drop_offset_matches_pointer(
            page in 1u32..=3,
            px in 0.0f64..2000.0,
            py in 0.0f64..4000.0,
            left in 0.0f64..500.0,
            top in 0.0f64..3000.0,
        ) {
            let registry = PreviewRegistry::new();
            let mut editor = editor_with(fixtures::letter_pages(3), &registry);
            editor.drop_on_page(page, PagePoint { x: px, y: py }, rect(left, top)).unwrap();

            let placement = editor.placements().last().unwrap();
            prop_assert_eq!(placement.page, page);
            prop_assert_eq!(placement.x, px - left);
            prop_assert_eq!(placement.y, py - top);
        }
    }

    #[test]
    fn test_out_of_range_page_rejected() {
        let registry = PreviewRegistry::new();
        let mut editor = editor_with(fixtures::letter_pages(1), &registry);
        assert!(editor.place(0, 1.0, 1.0).is_err());
        assert!(editor.place(2, 1.0, 1.0).is_err());
        assert!(editor.placements().is_empty());
    }

    #[test]
    fn test_unknown_font_rejected() {
        let mut editor = SignatureEditor::new(EditorOptions::default());
        assert!(editor.select_font("Comic Sans").is_err());
        assert_eq!(editor.font().name, "Pacifico");

        let mut system = SignatureEditor::new(EditorOptions {
            font_source: FontSource::System,
            ..EditorOptions::default()
        });
        assert_eq!(system.font().name, "Helvetica");
        system.select_font("Courier").unwrap();
    }

    #[test]
    fn test_drag_follows_id_through_removal() {
        let registry = PreviewRegistry::new();
        let mut editor = editor_with(fixtures::letter_pages(1), &registry);
        let first = editor.place(1, 10.0, 10.0).unwrap();
        let second = editor.place(1, 20.0, 20.0).unwrap();

        editor.begin_drag(second).unwrap();
        // The list shifts under the drag
        editor.remove(first).unwrap();
        assert!(editor.end_drag(PagePoint { x: 150.0, y: 90.0 }, rect(50.0, 40.0)));

        assert_eq!(editor.placements().len(), 1);
        let moved = &editor.placements()[0];
        assert_eq!(moved.id, second);
        assert_eq!((moved.x, moved.y), (100.0, 50.0));
        assert_eq!(editor.dragging(), None);
    }

    #[test]
    fn test_drag_of_removed_placement_is_noop() {
        let registry = PreviewRegistry::new();
        let mut editor = editor_with(fixtures::letter_pages(1), &registry);
        let id = editor.place(1, 10.0, 10.0).unwrap();
        let other = editor.place(1, 30.0, 30.0).unwrap();

        editor.begin_drag(id).unwrap();
        editor.remove(id);
        assert!(!editor.end_drag(PagePoint { x: 0.0, y: 0.0 }, rect(0.0, 0.0)));
        let survivor = &editor.placements()[0];
        assert_eq!(survivor.id, other);
        assert_eq!((survivor.x, survivor.y), (30.0, 30.0));
    }

    #[test]
    fn test_load_discards_placements() {
        let registry = PreviewRegistry::new();
        let mut editor = editor_with(fixtures::letter_pages(1), &registry);
        editor.place(1, 1.0, 1.0).unwrap();

        let bytes = fixtures::letter_pages(2);
        editor
            .load(PdfFile::pdf("other.pdf", bytes.clone()), registry.create(bytes))
            .unwrap();
        assert!(editor.placements().is_empty());
        assert_eq!(editor.page_count(), 2);
        assert_eq!(registry.live(), 1);
    }

    #[test]
    fn test_page_views_scale_to_render_width() {
        let registry = PreviewRegistry::new();
        let editor = editor_with(fixtures::pages(&[(300.0, 600.0)]), &registry);
        assert_eq!(
            editor.page_views(),
            vec![PageView {
                page: 1,
                width: 600.0,
                height: 1200.0
            }]
        );
    }

    #[test]
    fn test_stamps_draw_from_top_of_page() {
        let registry = PreviewRegistry::new();
        let bytes = fixtures::letter_pages(1);
        let mut editor = editor_with(bytes.clone(), &registry);
        editor.place(1, 72.0, 0.0).unwrap();
        editor.place(1, 72.0, 100.0).unwrap();

        let doc = PdfDocument::from_bytes(bytes).unwrap();
        let ops = plan_draws(&doc, &editor.stamps()).unwrap();
        assert_eq!(ops[0].y, 792.0);
        assert_eq!(ops[1].y, 692.0);
        assert_eq!(ops[1].x, 72.0);
    }

    #[tokio::test]
    async fn test_save_without_placements_makes_no_calls() {
        let api = MockApi::new();
        let notifier = RecordingNotifier::new();

        let mut empty = SignatureEditor::new(EditorOptions::default());
        assert!(empty.save(&api, &notifier, |_| {}).await.is_err());

        let registry = PreviewRegistry::new();
        let mut loaded = editor_with(fixtures::letter_pages(1), &registry);
        let err = loaded.save(&api, &notifier, |_| {}).await.unwrap_err();

        assert!(matches!(err, ClientError::Validation(_)));
        assert!(api.calls().is_empty());
        assert_eq!(
            notifier.notices(),
            vec![
                (NoticeLevel::Error, NOTHING_TO_SAVE.to_string()),
                (NoticeLevel::Error, NOTHING_TO_SAVE.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_new_document_creates_then_submits() {
        let api = MockApi::new();
        let notifier = RecordingNotifier::new();
        let registry = PreviewRegistry::new();
        let mut editor = editor_with(fixtures::letter_pages(2), &registry);
        editor.place(1, 100.0, 200.0).unwrap();
        editor.place(2, 50.0, 60.0).unwrap();

        let mut seen = None;
        let outcome = editor
            .save(&api, &notifier, |o| seen = Some(o.clone()))
            .await
            .unwrap();

        assert_eq!(api.calls(), vec!["create_document", "submit_placements"]);
        assert!(outcome.created);
        assert_eq!(seen, Some(outcome.clone()));

        let uploads = api.uploads();
        assert_eq!(uploads[0].document_id, None);
        assert_eq!(uploads[0].file_name, "lease.pdf");
        assert!(PdfDocument::from_bytes(uploads[0].bytes.clone()).is_ok());

        let submissions = api.submissions();
        assert_eq!(submissions[0].document_id, outcome.document_id);
        assert_eq!(submissions[0].signatures.len(), 2);
        assert_eq!(submissions[0].public_token, None);
        assert_eq!(notifier.messages(), vec![SAVED.to_string()]);
    }

    #[tokio::test]
    async fn test_existing_document_replaces_then_submits() {
        let api = MockApi::new();
        let notifier = RecordingNotifier::new();
        let registry = PreviewRegistry::new();
        let bytes = fixtures::letter_pages(1);
        let mut editor = SignatureEditor::for_document(
            EditorOptions::default(),
            "doc-42",
            PdfFile::pdf("nda.pdf", bytes.clone()),
            registry.create(bytes),
        )
        .unwrap()
        .with_public_token("share-tok");
        editor.place(1, 10.0, 20.0).unwrap();

        let outcome = editor.save(&api, &notifier, |_| {}).await.unwrap();

        assert_eq!(api.calls(), vec!["replace_document", "submit_placements"]);
        assert!(!outcome.created);
        assert_eq!(outcome.document_id, "doc-42");
        assert_eq!(api.uploads()[0].document_id.as_deref(), Some("doc-42"));

        let submission = &api.submissions()[0];
        assert_eq!(submission.document_id, "doc-42");
        assert_eq!(submission.public_token.as_deref(), Some("share-tok"));
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_placements() {
        let api = MockApi::new();
        api.fail_next("submit_placements", Some("Document locked"));
        let notifier = RecordingNotifier::new();
        let registry = PreviewRegistry::new();
        let mut editor = editor_with(fixtures::letter_pages(1), &registry);
        editor.place(1, 10.0, 20.0).unwrap();

        let mut called = false;
        assert!(editor.save(&api, &notifier, |_| called = true).await.is_err());
        assert!(!called);
        assert_eq!(editor.placements().len(), 1);
        assert_eq!(
            notifier.last(),
            Some((NoticeLevel::Error, "Save failed: Document locked".to_string()))
        );
    }

    #[tokio::test]
    async fn test_unparseable_pdf_fails_before_upload() {
        let registry = PreviewRegistry::new();
        let mut editor = SignatureEditor::new(EditorOptions::default());
        let result = editor.load(
            PdfFile::pdf("broken.pdf", b"not a pdf".to_vec()),
            registry.create(b"not a pdf".to_vec()),
        );
        assert!(result.is_err());
        assert!(editor.file().is_none());
        assert_eq!(registry.live(), 0);
    }
}
