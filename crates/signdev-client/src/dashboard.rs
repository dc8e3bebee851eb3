//! Dashboard orchestration
//!
//! Holds the document list and the mutually exclusive panels on top of it:
//! an upload session, a signing session for a stored document, and an inline
//! view with its audit trail. The share modal is independent of all three.

use crate::api::SignDevApi;
use crate::audit_trail::AuditTrail;
use crate::editor::{EditorOptions, SaveOutcome, SignatureEditor, NOTHING_TO_SAVE};
use crate::error::{ClientError, Result};
use crate::notify::Notifier;
use crate::upload::{PdfFile, PreviewRegistry, UploadArea};
use signdev_types::{Document, ShareRequest};
use tracing::{info, warn};

pub const LOADING_DOCUMENTS: &str = "Loading documents...";

pub const NO_DOCUMENTS: &str = "No documents found.";

pub const SIGNING_FAILED: &str = "Failed to prepare PDF for signing.";

pub const SHARE_SENT: &str = "Share link sent successfully!";

pub const SHARE_FAILED: &str = "Failed to share document";

/// A stored document opened for signing
#[derive(Debug)]
pub struct SigningSession {
    pub document: Document,
    pub editor: SignatureEditor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareModal {
    pub document: Document,
    pub recipient_email: String,
}

/// Label shown next to a document; missing statuses read as pending
pub fn status_label(doc: &Document) -> &str {
    doc.status.as_str()
}

#[derive(Debug)]
pub struct Dashboard {
    options: EditorOptions,
    upload: UploadArea,
    documents: Vec<Document>,
    loading: bool,
    inline: Option<String>,
    audit: AuditTrail,
    upload_session: Option<SignatureEditor>,
    signing: Option<SigningSession>,
    share: Option<ShareModal>,
}

impl Dashboard {
    pub fn new(options: EditorOptions, registry: PreviewRegistry) -> Self {
        Self {
            options,
            upload: UploadArea::new(registry),
            documents: Vec::new(),
            loading: true,
            inline: None,
            audit: AuditTrail::new(),
            upload_session: None,
            signing: None,
            share: None,
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Placeholder shown instead of the list, if any
    pub fn list_placeholder(&self) -> Option<&'static str> {
        if self.loading {
            Some(LOADING_DOCUMENTS)
        } else if self.documents.is_empty() {
            Some(NO_DOCUMENTS)
        } else {
            None
        }
    }

    pub fn upload_area(&mut self) -> &mut UploadArea {
        &mut self.upload
    }

    /// Refetch the document list; a failed fetch keeps the current list
    pub async fn refresh(&mut self, api: &dyn SignDevApi) {
        self.loading = true;
        match api.list_documents().await {
            Ok(docs) => self.documents = docs,
            // The previously loaded list stays on screen
            Err(e) => warn!(error = %e, "Error fetching docs"),
        }
        self.loading = false;
    }

    pub fn inline_document(&self) -> Option<&str> {
        self.inline.as_deref()
    }

    pub fn audit_trail(&self) -> &AuditTrail {
        &self.audit
    }

    /// Toggle the inline view of `doc_id`, loading its audit trail when opened.
    ///
    /// Returns whether the document is now shown.
    pub async fn open_inline(&mut self, api: &dyn SignDevApi, doc_id: &str) -> bool {
        self.signing = None;
        if self.inline.as_deref() == Some(doc_id) {
            self.inline = None;
            return false;
        }
        self.inline = Some(doc_id.to_string());
        self.audit.load(api, doc_id).await;
        true
    }

    pub fn inline_view_url(&self, api: &dyn SignDevApi, doc_id: &str) -> String {
        api.document_view_url(doc_id)
    }

    pub fn signing(&self) -> Option<&SigningSession> {
        self.signing.as_ref()
    }

    pub fn signing_mut(&mut self) -> Option<&mut SigningSession> {
        self.signing.as_mut()
    }

    /// Download a stored document and open it for signing
    pub async fn start_signing(
        &mut self,
        api: &dyn SignDevApi,
        notifier: &dyn Notifier,
        doc: &Document,
    ) -> Result<()> {
        match self.open_for_signing(api, doc).await {
            Ok(editor) => {
                self.signing = Some(SigningSession {
                    document: doc.clone(),
                    editor,
                });
                self.inline = None;
                Ok(())
            }
            Err(e) => {
                warn!(document_id = %doc.id, error = %e, "Error loading PDF for signing");
                notifier.error(SIGNING_FAILED);
                Err(e)
            }
        }
    }

    async fn open_for_signing(&self, api: &dyn SignDevApi, doc: &Document) -> Result<SignatureEditor> {
        let bytes = api.fetch_document(&doc.id).await?;
        let preview = self.upload.registry().create(bytes.clone());
        SignatureEditor::for_document(
            self.options.clone(),
            &doc.id,
            PdfFile::pdf(&doc.file_name, bytes),
            preview,
        )
    }

    pub fn close_signing(&mut self) {
        self.signing = None;
    }

    pub fn upload_session(&self) -> Option<&SignatureEditor> {
        self.upload_session.as_ref()
    }

    pub fn upload_session_mut(&mut self) -> Option<&mut SignatureEditor> {
        self.upload_session.as_mut()
    }

    /// Take a picked file into a new create-mode editor
    pub fn accept_upload(&mut self, file: Option<PdfFile>, notifier: &dyn Notifier) -> Result<()> {
        let mut picked = None;
        self.upload
            .accept(file, notifier, |file, handle| picked = Some((file, handle)))?;
        let Some((file, handle)) = picked else {
            return Ok(());
        };

        let mut editor = SignatureEditor::new(self.options.clone());
        if let Err(e) = editor.load(file, handle) {
            warn!(error = %e, "Uploaded file is not a readable PDF");
            notifier.error(&format!("Could not open PDF: {}", e));
            return Err(e);
        }

        self.upload_session = Some(editor);
        self.signing = None;
        self.inline = None;
        Ok(())
    }

    pub fn discard_upload(&mut self) {
        self.upload_session = None;
    }

    /// Save the upload session as a new document
    pub async fn save_upload(
        &mut self,
        api: &dyn SignDevApi,
        notifier: &dyn Notifier,
    ) -> Result<SaveOutcome> {
        let Some(editor) = self.upload_session.as_mut() else {
            notifier.error(NOTHING_TO_SAVE);
            return Err(ClientError::Validation(NOTHING_TO_SAVE.to_string()));
        };
        let outcome = editor.save(api, notifier, |_| {}).await?;
        self.upload_session = None;
        self.refresh(api).await;
        Ok(outcome)
    }

    /// Save the signing session over its stored document
    pub async fn save_signing(
        &mut self,
        api: &dyn SignDevApi,
        notifier: &dyn Notifier,
    ) -> Result<SaveOutcome> {
        let Some(session) = self.signing.as_mut() else {
            notifier.error(NOTHING_TO_SAVE);
            return Err(ClientError::Validation(NOTHING_TO_SAVE.to_string()));
        };
        let outcome = session.editor.save(api, notifier, |_| {}).await?;
        self.signing = None;
        self.refresh(api).await;
        Ok(outcome)
    }

    pub fn share_modal(&self) -> Option<&ShareModal> {
        self.share.as_ref()
    }

    pub fn open_share(&mut self, doc: &Document) {
        self.share = Some(ShareModal {
            document: doc.clone(),
            recipient_email: String::new(),
        });
    }

    pub fn set_recipient_email(&mut self, email: &str) {
        if let Some(modal) = self.share.as_mut() {
            modal.recipient_email = email.to_string();
        }
    }

    pub fn close_share(&mut self) {
        self.share = None;
    }

    /// Email a signing link. Without a recipient nothing is sent and the modal stays open.
    ///
    /// Returns whether a request was made.
    pub async fn send_share(&mut self, api: &dyn SignDevApi, notifier: &dyn Notifier) -> Result<bool> {
        let request = match &self.share {
            Some(modal) if !modal.recipient_email.trim().is_empty() => ShareRequest {
                document_id: modal.document.id.clone(),
                recipient_email: modal.recipient_email.trim().to_string(),
            },
            _ => return Ok(false),
        };

        let result = api.share_document(&request).await;
        self.share = None;
        match result {
            Ok(_) => {
                info!(document_id = %request.document_id, "Share link sent");
                notifier.info(SHARE_SENT);
                self.refresh(api).await;
                Ok(true)
            }
            Err(e) => {
                warn!(document_id = %request.document_id, error = %e, "Failed to send share email");
                notifier.error(&e.message_or(SHARE_FAILED));
                Err(e)
            }
        }
    }
}
