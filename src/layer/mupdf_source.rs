//! MuPDF-backed text extraction

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mupdf::text_page::TextBlockType;
use mupdf::{Document, TextPageFlags};

use super::request::ExtractFault;
use super::source::{PageHandle, TextSource};
use super::types::{TextContent, TextItem, Transform, ViewBox};

impl From<mupdf::error::Error> for ExtractFault {
    fn from(error: mupdf::error::Error) -> Self {
        Self::Pdf(error.to_string())
    }
}

/// An opened document, used to hand out page handles
#[derive(Clone, Debug)]
pub struct MupdfDocument {
    path: PathBuf,
    page_count: usize,
}

impl MupdfDocument {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ExtractFault> {
        let path = path.as_ref().to_path_buf();
        let doc = Document::open(path.to_string_lossy().as_ref())?;
        let page_count = doc.page_count()? as usize;

        Ok(Self { path, page_count })
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Load the handle of page `index` (0-indexed)
    pub fn page(&self, index: usize) -> Result<Arc<MupdfPage>, ExtractFault> {
        if index >= self.page_count {
            return Err(ExtractFault::PageOutOfRange {
                page: index,
                page_count: self.page_count,
            });
        }

        let doc = Document::open(self.path.to_string_lossy().as_ref())?;
        let page = doc.load_page(index as i32)?;
        let bounds = page.bounds()?;

        Ok(Arc::new(MupdfPage {
            path: self.path.clone(),
            index,
            view_box: ViewBox::new(0.0, 0.0, bounds.x1 - bounds.x0, bounds.y1 - bounds.y0),
        }))
    }
}

/// Handle to one page of a MuPDF document.
///
/// MuPDF reports bounds with the page rotation already applied, so the
/// handle carries no intrinsic rotation of its own.
#[derive(Debug)]
pub struct MupdfPage {
    path: PathBuf,
    index: usize,
    view_box: ViewBox,
}

impl MupdfPage {
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

impl PageHandle for MupdfPage {
    fn rotation(&self) -> i32 {
        0
    }

    fn view_box(&self) -> ViewBox {
        self.view_box
    }
}

/// Extracts one text item per text line
#[derive(Clone, Copy, Debug, Default)]
pub struct MupdfSource;

impl TextSource for MupdfSource {
    type Page = MupdfPage;

    fn text_content(&self, page: &MupdfPage) -> Result<TextContent, ExtractFault> {
        let doc = Document::open(page.path.to_string_lossy().as_ref())?;
        let mu_page = doc.load_page(page.index as i32)?;
        let bounds = mu_page.bounds()?;
        let page_height = bounds.y1 - bounds.y0;
        let text_page = mu_page.to_text_page(TextPageFlags::empty())?;

        let mut items = Vec::new();
        for block in text_page.blocks() {
            if block.r#type() != TextBlockType::Text {
                continue;
            }
            for line in block.lines() {
                let text: String = line.chars().filter_map(|ch| ch.char()).collect();
                if text.is_empty() {
                    continue;
                }

                // Text page coordinates grow downward from the top edge
                let bbox = line.bounds();
                let width = bbox.x1 - bbox.x0;
                let height = bbox.y1 - bbox.y0;
                let x = bbox.x0 - bounds.x0;
                let y = page_height - (bbox.y1 - bounds.y0);

                items.push(TextItem::new(
                    Transform::new([height, height, width, height, x, y]),
                    text,
                ));
            }
        }

        Ok(TextContent::new(items))
    }
}
