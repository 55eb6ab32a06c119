//! Text layer: positions extracted page text over the rendered page

mod controller;
#[cfg(feature = "pdf")]
mod mupdf_source;
mod request;
mod service;
mod source;
mod state;
mod transform;
mod types;
mod worker;

pub use controller::{LayerError, TextLayer, TextLayerBuilder};
#[cfg(feature = "pdf")]
pub use mupdf_source::{MupdfDocument, MupdfPage, MupdfSource};
pub use request::{CancelFlag, ExtractFault, ExtractRequest, ExtractResponse, RequestId};
pub use service::{ExtractService, RunningTask};
pub use source::{PageHandle, TextSource};
pub use state::{Command, Effect, LayerState, LoadState};
pub use transform::{FragmentRect, fragment_rect};
pub use types::*;

/// Number of extraction workers when none is configured
pub const DEFAULT_WORKERS: usize = 2;
