//! Upload intake and preview handles
//!
//! A [`PreviewHandle`] names a file's bytes in a [`PreviewRegistry`] under a
//! `blob:` style URL. The entry lives exactly as long as the handle.

use crate::error::{ClientError, Result};
use crate::notify::Notifier;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

pub const ONLY_PDF: &str = "Only PDF files are allowed.";

/// A file as the user supplied it, with its declared media type
#[derive(Clone, PartialEq, Eq)]
pub struct PdfFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl PdfFile {
    pub fn new(name: &str, media_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            media_type: media_type.to_string(),
            bytes,
        }
    }

    /// A file declared as PDF
    pub fn pdf(name: &str, bytes: Vec<u8>) -> Self {
        Self::new(name, PDF_MEDIA_TYPE, bytes)
    }

    /// Read a local file, declaring its media type from the extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            ClientError::Validation(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document.pdf");
        let media_type = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("pdf") => PDF_MEDIA_TYPE,
            _ => "application/octet-stream",
        };
        Ok(Self::new(name, media_type, bytes))
    }

    pub fn is_pdf(&self) -> bool {
        self.media_type == PDF_MEDIA_TYPE
    }
}

impl std::fmt::Debug for PdfFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfFile")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Default)]
struct RegistryInner {
    next: AtomicU64,
    entries: Mutex<HashMap<String, Arc<Vec<u8>>>>,
}

/// In-memory table of previewable file contents
#[derive(Clone, Default)]
pub struct PreviewRegistry {
    inner: Arc<RegistryInner>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bytes and return the handle that keeps them alive
    pub fn create(&self, bytes: Vec<u8>) -> PreviewHandle {
        let n = self.inner.next.fetch_add(1, Ordering::Relaxed);
        let url = format!("blob:signdev/{}", n);
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(url.clone(), Arc::new(bytes));
        debug!(url = %url, "Preview created");
        PreviewHandle {
            url,
            registry: self.clone(),
        }
    }

    pub fn resolve(&self, url: &str) -> Option<Arc<Vec<u8>>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(url)
            .cloned()
    }

    /// Number of outstanding handles
    pub fn live(&self) -> usize {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    fn release(&self, url: &str) {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(url);
        debug!(url = %url, "Preview released");
    }
}

impl std::fmt::Debug for PreviewRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewRegistry")
            .field("live", &self.live())
            .finish()
    }
}

/// Owning reference to a registered preview
#[derive(Debug)]
pub struct PreviewHandle {
    url: String,
    registry: PreviewRegistry,
}

impl PreviewHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn bytes(&self) -> Option<Arc<Vec<u8>>> {
        self.registry.resolve(&self.url)
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.registry.release(&self.url);
    }
}

/// Drop zone for a single PDF
#[derive(Debug)]
pub struct UploadArea {
    registry: PreviewRegistry,
    dragging: bool,
}

impl UploadArea {
    pub fn new(registry: PreviewRegistry) -> Self {
        Self {
            registry,
            dragging: false,
        }
    }

    pub fn registry(&self) -> &PreviewRegistry {
        &self.registry
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn drag_over(&mut self) {
        self.dragging = true;
    }

    pub fn drag_leave(&mut self) {
        self.dragging = false;
    }

    /// Accept a picked file and hand it to `on_preview` with its handle
    pub fn accept<F>(&self, file: Option<PdfFile>, notifier: &dyn Notifier, on_preview: F) -> Result<()>
    where
        F: FnOnce(PdfFile, PreviewHandle),
    {
        let file = match file {
            Some(file) if file.is_pdf() => file,
            other => {
                if let Some(file) = &other {
                    warn!(name = %file.name, media_type = %file.media_type, "Rejected non-PDF upload");
                }
                notifier.error(ONLY_PDF);
                return Err(ClientError::Validation(ONLY_PDF.to_string()));
            }
        };

        let handle = self.registry.create(file.bytes.clone());
        on_preview(file, handle);
        Ok(())
    }

    /// Accept the first of the dropped files
    pub fn drop_files<F>(&mut self, files: Vec<PdfFile>, notifier: &dyn Notifier, on_preview: F) -> Result<()>
    where
        F: FnOnce(PdfFile, PreviewHandle),
    {
        self.dragging = false;
        self.accept(files.into_iter().next(), notifier, on_preview)
    }
}
