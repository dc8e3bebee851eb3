//! Server-recorded audit events for a document

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Types of auditable events.
///
/// Unknown action strings are kept verbatim so newer server actions still
/// render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuditAction {
    Viewed,
    Signed,
    Rejected,
    Other(String),
}

impl AuditAction {
    pub fn as_str(&self) -> &str {
        match self {
            AuditAction::Viewed => "viewed",
            AuditAction::Signed => "signed",
            AuditAction::Rejected => "rejected",
            AuditAction::Other(s) => s,
        }
    }

    /// Icon shown next to the action in the trail
    pub fn icon(&self) -> &'static str {
        match self {
            AuditAction::Viewed => "👁️",
            AuditAction::Signed => "✍️",
            AuditAction::Rejected => "❌",
            AuditAction::Other(_) => "📝",
        }
    }
}

impl From<String> for AuditAction {
    fn from(value: String) -> Self {
        match value.as_str() {
            "viewed" => AuditAction::Viewed,
            "signed" => AuditAction::Signed,
            "rejected" => AuditAction::Rejected,
            _ => AuditAction::Other(value),
        }
    }
}

impl From<AuditAction> for String {
    fn from(value: AuditAction) -> Self {
        value.as_str().to_string()
    }
}

/// Who performed an audited action. Either half may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Reads `signer` as an actor when it is an object. A bare id string or any
/// other shape the server failed to expand becomes `None`.
fn lenient_actor<'de, D>(deserializer: D) -> Result<Option<Actor>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

/// A single audit log entry as returned by `GET audits/:id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    pub action: AuditAction,
    #[serde(default, deserialize_with = "lenient_actor")]
    pub signer: Option<Actor>,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "ipAddress", default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl AuditEntry {
    /// Actor display name, "Unknown" when absent
    pub fn actor_name(&self) -> &str {
        self.signer
            .as_ref()
            .and_then(|s| s.name.as_deref())
            .filter(|n| !n.is_empty())
            .unwrap_or("Unknown")
    }

    /// Actor email, "anonymous" when absent
    pub fn actor_email(&self) -> &str {
        self.signer
            .as_ref()
            .and_then(|s| s.email.as_deref())
            .filter(|e| !e.is_empty())
            .unwrap_or("anonymous")
    }

    /// Source IP, "unknown" when absent
    pub fn source_ip(&self) -> &str {
        self.ip_address
            .as_deref()
            .filter(|ip| !ip.is_empty())
            .unwrap_or("unknown")
    }

    /// Rejection reason, if the server recorded one
    pub fn rejection_reason(&self) -> Option<&str> {
        self.reason.as_deref().filter(|r| !r.is_empty())
    }
}
