//! SignDev client
//!
//! Document signing workflows against the SignDev API: upload a PDF, place
//! signature text on its pages, stamp and save it, share it for signing, and
//! review its audit trail.
//!
//! Workflows talk to the server through the [`SignDevApi`] and [`AuthApi`]
//! traits. [`ApiClient`] implements both over HTTP and attaches the bearer
//! token held by the [`SessionStore`].

pub mod api;
pub mod audit_trail;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod editor;
pub mod error;
pub mod gateway;
pub mod notify;
pub mod public_signer;
pub mod session;
pub mod upload;

#[cfg(test)]
mod test_support;

pub use api::{AuthApi, SignDevApi};
pub use audit_trail::{AuditLine, AuditTicket, AuditTrail, AuditView};
pub use config::ClientConfig;
pub use dashboard::{status_label, Dashboard, ShareModal, SigningSession};
pub use editor::{
    EditorOptions, PagePoint, PageRect, PageView, SaveOutcome, SignatureEditor,
};
pub use error::{ClientError, Result};
pub use gateway::ApiClient;
pub use notify::{NoticeLevel, Notifier, RecordingNotifier};
pub use public_signer::{PublicSigner, PublicSignerState, PublicSigning};
pub use session::{FileStorage, MemoryStorage, Session, SessionStorage, SessionStore};
pub use upload::{PdfFile, PreviewHandle, PreviewRegistry, UploadArea};
