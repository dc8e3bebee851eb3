//! In-memory API used by workflow tests

use crate::api::{AuthApi, SignDevApi};
use crate::error::{ClientError, Result};
use crate::gateway::join_url;
use async_trait::async_trait;
use signdev_types::{
    AuditEntry, AuthResponse, Document, LoginRequest, MessageResponse, PlacementSubmission,
    PublicDocument, RegisterRequest, ResetRequest, ShareRequest, User, VerifyOtpRequest,
};
use std::collections::HashMap;
use std::sync::Mutex;

const BASE_URL: &str = "http://mock.invalid/api/";

/// A document body the mock received
#[derive(Debug, Clone)]
pub struct Upload {
    /// None for creates
    pub document_id: Option<String>,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Default)]
struct State {
    calls: Vec<String>,
    failures: HashMap<String, Option<String>>,
    messages: HashMap<String, String>,
    documents: Vec<Document>,
    files: HashMap<String, Vec<u8>>,
    audits: HashMap<String, Vec<AuditEntry>>,
    shares: HashMap<String, PublicDocument>,
    uploads: Vec<Upload>,
    submissions: Vec<PlacementSubmission>,
    share_requests: Vec<ShareRequest>,
    next_id: u32,
}

/// Records every call by operation name; failures are armed per operation
#[derive(Default)]
pub struct MockApi {
    state: Mutex<State>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    /// Make the next call to `op` fail with the given server message
    pub fn fail_next(&self, op: &str, message: Option<&str>) {
        self.with(|s| {
            s.failures
                .insert(op.to_string(), message.map(str::to_string))
        });
    }

    pub fn set_message(&self, op: &str, message: &str) {
        self.with(|s| s.messages.insert(op.to_string(), message.to_string()));
    }

    pub fn add_document(&self, doc: Document, bytes: Vec<u8>) {
        self.with(|s| {
            s.files.insert(doc.id.clone(), bytes);
            s.documents.push(doc);
        });
    }

    pub fn set_audit(&self, document_id: &str, entries: Vec<AuditEntry>) {
        self.with(|s| s.audits.insert(document_id.to_string(), entries));
    }

    pub fn add_share(&self, token: &str, public: PublicDocument) {
        self.with(|s| s.shares.insert(token.to_string(), public));
    }

    pub fn calls(&self) -> Vec<String> {
        self.with(|s| s.calls.clone())
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.with(|s| s.uploads.clone())
    }

    pub fn submissions(&self) -> Vec<PlacementSubmission> {
        self.with(|s| s.submissions.clone())
    }

    pub fn share_requests(&self) -> Vec<ShareRequest> {
        self.with(|s| s.share_requests.clone())
    }

    fn record(&self, op: &str) -> Result<()> {
        self.with(|s| {
            s.calls.push(op.to_string());
            match s.failures.remove(op) {
                Some(message) => Err(ClientError::Api {
                    status: 500,
                    message,
                }),
                None => Ok(()),
            }
        })
    }

    fn reply(&self, op: &str) -> MessageResponse {
        MessageResponse {
            message: self.with(|s| s.messages.get(op).cloned()),
        }
    }
}

fn not_found() -> ClientError {
    ClientError::Api {
        status: 404,
        message: None,
    }
}

#[async_trait]
impl SignDevApi for MockApi {
    async fn list_documents(&self) -> Result<Vec<Document>> {
        self.record("list_documents")?;
        Ok(self.with(|s| s.documents.clone()))
    }

    async fn fetch_document(&self, id: &str) -> Result<Vec<u8>> {
        self.record("fetch_document")?;
        self.with(|s| s.files.get(id).cloned()).ok_or_else(not_found)
    }

    async fn create_document(&self, file_name: &str, bytes: Vec<u8>) -> Result<Document> {
        self.record("create_document")?;
        Ok(self.with(|s| {
            s.next_id += 1;
            let doc = Document {
                id: format!("doc-{}", s.next_id),
                file_name: file_name.to_string(),
                status: Default::default(),
                owner: None,
            };
            s.uploads.push(Upload {
                document_id: None,
                file_name: file_name.to_string(),
                bytes: bytes.clone(),
            });
            s.files.insert(doc.id.clone(), bytes);
            s.documents.push(doc.clone());
            doc
        }))
    }

    async fn replace_document(&self, id: &str, file_name: &str, bytes: Vec<u8>) -> Result<()> {
        self.record("replace_document")?;
        self.with(|s| {
            s.uploads.push(Upload {
                document_id: Some(id.to_string()),
                file_name: file_name.to_string(),
                bytes: bytes.clone(),
            });
            s.files.insert(id.to_string(), bytes);
        });
        Ok(())
    }

    async fn submit_placements(&self, submission: &PlacementSubmission) -> Result<()> {
        self.record("submit_placements")?;
        self.with(|s| s.submissions.push(submission.clone()));
        Ok(())
    }

    async fn audit_log(&self, document_id: &str) -> Result<Vec<AuditEntry>> {
        self.record("audit_log")?;
        Ok(self.with(|s| s.audits.get(document_id).cloned().unwrap_or_default()))
    }

    async fn share_document(&self, request: &ShareRequest) -> Result<MessageResponse> {
        self.record("share_document")?;
        self.with(|s| s.share_requests.push(request.clone()));
        Ok(self.reply("share_document"))
    }

    async fn resolve_share_token(&self, token: &str) -> Result<PublicDocument> {
        self.record("resolve_share_token")?;
        self.with(|s| s.shares.get(token).cloned()).ok_or_else(not_found)
    }

    fn document_view_url(&self, id: &str) -> String {
        join_url(BASE_URL, &format!("docs/view/{}", id))
    }
}

#[async_trait]
impl AuthApi for MockApi {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        self.record("login")?;
        Ok(AuthResponse {
            token: "mock-token".to_string(),
            user: User {
                id: Some("user-1".to_string()),
                name: "Mock User".to_string(),
                email: request.email.clone(),
                extra: Default::default(),
            },
        })
    }

    async fn register(&self, _request: &RegisterRequest) -> Result<MessageResponse> {
        self.record("register")?;
        Ok(self.reply("register"))
    }

    async fn request_reset(&self, _request: &ResetRequest) -> Result<MessageResponse> {
        self.record("request_reset")?;
        Ok(self.reply("request_reset"))
    }

    async fn verify_otp(&self, _request: &VerifyOtpRequest) -> Result<MessageResponse> {
        self.record("verify_otp")?;
        Ok(self.reply("verify_otp"))
    }
}
