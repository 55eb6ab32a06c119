//! Seams to the page model and the text extraction backend

use super::request::ExtractFault;
use super::types::{TextContent, ViewBox, Viewport};

/// A page the text layer is drawn over
pub trait PageHandle: Send + Sync {
    /// Intrinsic page rotation in degrees
    fn rotation(&self) -> i32;

    /// Unscaled page box in document units
    fn view_box(&self) -> ViewBox;

    /// Page geometry at `scale`, using the intrinsic rotation
    fn viewport(&self, scale: f32) -> Viewport {
        Viewport::new(self.view_box(), scale, self.rotation())
    }
}

/// Backend producing the text items of a page.
///
/// Called from extraction worker threads; implementations may block.
pub trait TextSource: Send + Sync + 'static {
    type Page: PageHandle + 'static;

    fn text_content(&self, page: &Self::Page) -> Result<TextContent, ExtractFault>;
}
