//! Wire and domain types shared by the SignDev client crates.
//!
//! Field names follow the backend's JSON (`_id`, `fileName`, `ipAddress`);
//! the Rust side uses snake_case throughout.

pub mod audit;
pub mod auth;
pub mod document;
pub mod fonts;
pub mod placement;

pub use audit::{Actor, AuditAction, AuditEntry};
pub use auth::{
    AuthResponse, LoginRequest, MessageResponse, RegisterRequest, ResetRequest, User,
    VerifyOtpRequest,
};
pub use document::{Document, DocumentStatus, PublicDocument, ShareRequest};
pub use fonts::{FontChoice, FontSource, UnknownFontSource};
pub use placement::{Placement, PlacementId, PlacementRecord, PlacementSubmission};
