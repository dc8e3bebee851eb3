//! Stored documents and the share-link payloads around them

use serde::{Deserialize, Serialize};

/// Signing status of a stored document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum DocumentStatus {
    #[default]
    Pending,
    Signed,
    Other(String),
}

impl DocumentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Signed => "signed",
            DocumentStatus::Other(s) => s,
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, DocumentStatus::Signed)
    }
}

impl From<Option<String>> for DocumentStatus {
    fn from(value: Option<String>) -> Self {
        let Some(status) = value else {
            return DocumentStatus::Pending;
        };
        match status.as_str() {
            "" | "pending" => DocumentStatus::Pending,
            "signed" => DocumentStatus::Signed,
            _ => DocumentStatus::Other(status),
        }
    }
}

impl From<DocumentStatus> for String {
    fn from(value: DocumentStatus) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document owned by the current user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(rename = "fileName", default)]
    pub file_name: String,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

/// Body of `POST /share`
#[derive(Debug, Clone, Serialize)]
pub struct ShareRequest {
    #[serde(rename = "documentId")]
    pub document_id: String,
    #[serde(rename = "recipientEmail")]
    pub recipient_email: String,
}

/// Payload behind a public share token.
///
/// `buffer` holds the PDF bytes base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicDocument {
    pub buffer: String,
    #[serde(rename = "fileName", default)]
    pub file_name: String,
    #[serde(rename = "documentId")]
    pub document_id: String,
}
