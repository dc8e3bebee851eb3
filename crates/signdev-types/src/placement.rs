//! Signature placements authored on a rendered page

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identity of a placement for the lifetime of an editing session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacementId(Uuid);

impl PlacementId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlacementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlacementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A signature text instance dropped on a page.
///
/// `x`/`y` are page-local pixels with the origin at the top-left corner of
/// the rendered page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub id: PlacementId,
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub font: String,
    pub text: String,
}

impl Placement {
    pub fn new(page: u32, x: f64, y: f64, font: &str, text: &str) -> Self {
        Self {
            id: PlacementId::new(),
            page,
            x,
            y,
            font: font.to_string(),
            text: text.to_string(),
        }
    }

    /// The persisted projection: font and text stay client side
    pub fn record(&self) -> PlacementRecord {
        PlacementRecord {
            page: self.page,
            x: self.x,
            y: self.y,
        }
    }
}

/// Placement as persisted by `POST /signatures`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementRecord {
    pub page: u32,
    pub x: f64,
    pub y: f64,
}

/// Body of `POST /signatures`
#[derive(Debug, Clone, Serialize)]
pub struct PlacementSubmission {
    #[serde(rename = "documentId")]
    pub document_id: String,
    pub signatures: Vec<PlacementRecord>,
    #[serde(rename = "publicToken", skip_serializing_if = "Option::is_none")]
    pub public_token: Option<String>,
}

impl PlacementSubmission {
    pub fn new(document_id: &str, placements: &[Placement], public_token: Option<&str>) -> Self {
        Self {
            document_id: document_id.to_string(),
            signatures: placements.iter().map(Placement::record).collect(),
            public_token: public_token.map(str::to_string),
        }
    }
}
