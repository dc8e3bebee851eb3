//! Typed SignDev endpoints
//!
//! Workflows depend on these traits rather than on [`ApiClient`] so they can
//! run against an in-memory backend.

use crate::error::Result;
use crate::gateway::{pdf_form, segment, ApiClient};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use signdev_types::{
    AuditEntry, AuthResponse, Document, LoginRequest, MessageResponse, PlacementSubmission,
    PublicDocument, RegisterRequest, ResetRequest, ShareRequest, VerifyOtpRequest,
};
use tracing::warn;

/// Document, signature, audit and share endpoints
#[async_trait]
pub trait SignDevApi: Send + Sync {
    /// `GET docs`
    async fn list_documents(&self) -> Result<Vec<Document>>;

    /// `GET docs/view/:id`, raw PDF bytes
    async fn fetch_document(&self, id: &str) -> Result<Vec<u8>>;

    /// `POST docs/upload`
    async fn create_document(&self, file_name: &str, bytes: Vec<u8>) -> Result<Document>;

    /// `PUT /docs/:id`
    async fn replace_document(&self, id: &str, file_name: &str, bytes: Vec<u8>) -> Result<()>;

    /// `POST /signatures`
    async fn submit_placements(&self, submission: &PlacementSubmission) -> Result<()>;

    /// `GET audits/:id`
    async fn audit_log(&self, document_id: &str) -> Result<Vec<AuditEntry>>;

    /// `POST /share`
    async fn share_document(&self, request: &ShareRequest) -> Result<MessageResponse>;

    /// `GET public-Sign/:token`
    async fn resolve_share_token(&self, token: &str) -> Result<PublicDocument>;

    /// Address a browser can load the stored PDF from
    fn document_view_url(&self, id: &str) -> String;
}

/// Account endpoints under `/auth`
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse>;
    async fn register(&self, request: &RegisterRequest) -> Result<MessageResponse>;
    async fn request_reset(&self, request: &ResetRequest) -> Result<MessageResponse>;
    async fn verify_otp(&self, request: &VerifyOtpRequest) -> Result<MessageResponse>;
}

/// Items of a JSON array reply; anything else reads as empty
fn array_items<T: DeserializeOwned>(value: serde_json::Value, what: &str) -> Result<Vec<T>> {
    if value.is_array() {
        Ok(serde_json::from_value(value)?)
    } else {
        warn!("Expected a list of {}, got {}", what, kind_of(&value));
        Ok(Vec::new())
    }
}

fn kind_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[async_trait]
impl SignDevApi for ApiClient {
    async fn list_documents(&self) -> Result<Vec<Document>> {
        let value: serde_json::Value = self.get_json("docs").await?;
        array_items(value, "documents")
    }

    async fn fetch_document(&self, id: &str) -> Result<Vec<u8>> {
        self.get_bytes(&format!("docs/view/{}", segment(id))).await
    }

    async fn create_document(&self, file_name: &str, bytes: Vec<u8>) -> Result<Document> {
        self.post_multipart("docs/upload", pdf_form(file_name, bytes)?)
            .await
    }

    async fn replace_document(&self, id: &str, file_name: &str, bytes: Vec<u8>) -> Result<()> {
        self.put_multipart(&format!("/docs/{}", segment(id)), pdf_form(file_name, bytes)?)
            .await
    }

    async fn submit_placements(&self, submission: &PlacementSubmission) -> Result<()> {
        self.post_json_lenient::<(), _>("/signatures", submission)
            .await
    }

    async fn audit_log(&self, document_id: &str) -> Result<Vec<AuditEntry>> {
        let value: serde_json::Value = self
            .get_json(&format!("audits/{}", segment(document_id)))
            .await?;
        array_items(value, "audit entries")
    }

    async fn share_document(&self, request: &ShareRequest) -> Result<MessageResponse> {
        self.post_json_lenient("/share", request).await
    }

    async fn resolve_share_token(&self, token: &str) -> Result<PublicDocument> {
        self.get_json(&format!("public-Sign/{}", segment(token)))
            .await
    }

    fn document_view_url(&self, id: &str) -> String {
        self.build_url(&format!("docs/view/{}", segment(id)))
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        self.post_json("/auth/login", request).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<MessageResponse> {
        self.post_json_lenient("/auth/register", request).await
    }

    async fn request_reset(&self, request: &ResetRequest) -> Result<MessageResponse> {
        self.post_json_lenient("/auth/request-reset", request).await
    }

    async fn verify_otp(&self, request: &VerifyOtpRequest) -> Result<MessageResponse> {
        self.post_json_lenient("/auth/verify-otp", request).await
    }
}
