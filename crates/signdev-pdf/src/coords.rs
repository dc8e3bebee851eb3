//! Coordinate transformation between the page view and PDF user space
//!
//! Placements are authored in view space: origin at the top-left of the
//! rendered page, y growing downward. PDF user space puts the origin at the
//! bottom-left with y growing upward.

/// Width in pixels at which pages are rendered for placement
pub const DEFAULT_RENDER_WIDTH: f64 = 600.0;

/// Flip a view-space y offset into PDF space for a page of the given height
pub fn flip_y(page_height: f64, y: f64) -> f64 {
    page_height - y
}

/// Convert a view-space point to the PDF point the text is drawn at.
///
/// x carries over unchanged; only the vertical axis is flipped.
pub fn view_to_pdf(x: f64, y: f64, page_height: f64) -> (f64, f64) {
    (x, flip_y(page_height, y))
}

/// Height in pixels of a page rendered at `render_width`, preserving aspect ratio
pub fn rendered_height(page_width: f64, page_height: f64, render_width: f64) -> f64 {
    if page_width <= 0.0 {
        return 0.0;
    }
    page_height * (render_width / page_width)
}
