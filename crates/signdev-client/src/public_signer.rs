//! Signing through a share link
//!
//! The token is resolved once. A failed resolution is final; the page never
//! offers an editor afterwards.

use crate::api::SignDevApi;
use crate::editor::{EditorOptions, SaveOutcome, SignatureEditor};
use crate::error::{ClientError, Result};
use crate::notify::Notifier;
use crate::upload::{PdfFile, PreviewRegistry};
use base64::Engine as _;
use signdev_types::PublicDocument;
use tracing::{info, warn};

pub const LINK_INVALID: &str = "Link expired or invalid";

pub const SIGNED: &str = "✅ Document signed! You may now close this tab.";

/// A document resolved from a share token, ready to sign
#[derive(Debug)]
pub struct PublicSigning {
    pub file_name: String,
    pub document_id: String,
    pub editor: SignatureEditor,
}

#[derive(Debug)]
pub enum PublicSignerState {
    Loading,
    Ready(PublicSigning),
    Failed(String),
}

#[derive(Debug)]
pub struct PublicSigner {
    token: String,
    state: PublicSignerState,
}

impl PublicSigner {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            state: PublicSignerState::Loading,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn state(&self) -> &PublicSignerState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, PublicSignerState::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            PublicSignerState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn signing(&self) -> Option<&PublicSigning> {
        match &self.state {
            PublicSignerState::Ready(signing) => Some(signing),
            _ => None,
        }
    }

    pub fn editor_mut(&mut self) -> Option<&mut SignatureEditor> {
        match &mut self.state {
            PublicSignerState::Ready(signing) => Some(&mut signing.editor),
            _ => None,
        }
    }

    /// Resolve the token. Only the first call issues a request.
    pub async fn resolve(
        &mut self,
        api: &dyn SignDevApi,
        registry: &PreviewRegistry,
        options: EditorOptions,
    ) -> &PublicSignerState {
        if !self.is_loading() {
            return &self.state;
        }

        self.state = match self.open(api, registry, options).await {
            Ok(signing) => {
                info!(document_id = %signing.document_id, "Resolved share link");
                PublicSignerState::Ready(signing)
            }
            Err(e) => {
                warn!(error = %e, "Failed to resolve share link");
                PublicSignerState::Failed(e.message_or(LINK_INVALID))
            }
        };
        &self.state
    }

    async fn open(
        &self,
        api: &dyn SignDevApi,
        registry: &PreviewRegistry,
        options: EditorOptions,
    ) -> Result<PublicSigning> {
        let public = api.resolve_share_token(&self.token).await?;
        let bytes = decode_buffer(&public)?;
        let preview = registry.create(bytes.clone());
        let editor = SignatureEditor::for_document(
            options,
            &public.document_id,
            PdfFile::pdf(&public.file_name, bytes),
            preview,
        )?
        .with_public_token(&self.token);

        Ok(PublicSigning {
            file_name: public.file_name,
            document_id: public.document_id,
            editor,
        })
    }

    /// Save the signer's placements against the shared document
    pub async fn save(&mut self, api: &dyn SignDevApi, notifier: &dyn Notifier) -> Result<SaveOutcome> {
        let Some(editor) = self.editor_mut() else {
            return Err(ClientError::Validation(LINK_INVALID.to_string()));
        };
        editor
            .save(api, notifier, |_| notifier.info(SIGNED))
            .await
    }
}

fn decode_buffer(public: &PublicDocument) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(public.buffer.trim())
        .map_err(|e| ClientError::Decode(e.to_string()))
}
