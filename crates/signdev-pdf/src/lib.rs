//! PDF handling for SignDev
//!
//! Page geometry, the view-to-PDF coordinate flip, and stamping signature
//! text into page content streams.

pub mod coords;
pub mod error;
pub mod parser;
pub mod stamp;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use coords::{flip_y, rendered_height, view_to_pdf, DEFAULT_RENDER_WIDTH};
pub use error::PdfError;
pub use parser::{PageBox, PdfDocument};
pub use stamp::{plan_draws, stamp_text, DrawOp, StampStyle, StandardFont, TextStamp};
