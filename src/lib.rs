// Export modules for use in tests
pub mod layer;
pub mod panic_handler;
pub mod settings;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use layer::{LayerView, PositionedFragment, TextLayer, fragment_rect};
