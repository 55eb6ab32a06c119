//! Text layer state management

use std::sync::Arc;

use super::request::ExtractFault;
use super::source::PageHandle;
use super::types::{TextItem, Viewport, normalize_degrees};

/// Progress of the text items of the current page
#[derive(Debug, Default)]
pub enum LoadState {
    /// No extraction has been issued yet
    #[default]
    NotLoaded,
    /// An extraction is outstanding
    Loading,
    /// Text items of the current page
    Loaded(Arc<Vec<TextItem>>),
    /// Extraction failed; nothing is rendered
    Failed(Arc<ExtractFault>),
}

impl LoadState {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub fn items(&self) -> Option<&Arc<Vec<TextItem>>> {
        match self {
            Self::Loaded(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&Arc<ExtractFault>> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Current inputs and load progress of a text layer
#[derive(Debug)]
pub struct LayerState<P> {
    /// Page the layer is drawn over
    pub page: Arc<P>,

    /// Display scale factor
    pub scale: f32,

    /// Requested display rotation in degrees
    pub rotate: i32,

    /// Text items of `page`
    pub load: LoadState,
}

impl<P: PageHandle> LayerState<P> {
    /// Create a new state; `rotate` defaults to the page's own rotation
    #[must_use]
    pub fn new(page: Arc<P>, scale: f32, rotate: Option<i32>) -> Self {
        let rotate = rotate.unwrap_or_else(|| page.rotation());
        Self {
            page,
            scale,
            rotate,
            load: LoadState::NotLoaded,
        }
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command<P>) -> Vec<Effect> {
        match cmd {
            Command::Load => {
                self.load = LoadState::Loading;
                vec![Effect::CancelRunning, Effect::StartExtraction]
            }

            Command::SetPage(page) => {
                if Arc::ptr_eq(&self.page, &page) {
                    vec![]
                } else {
                    self.page = page;
                    self.load = LoadState::Loading;
                    vec![Effect::CancelRunning, Effect::StartExtraction]
                }
            }

            Command::SetScale(scale) => {
                self.scale = scale;
                vec![]
            }

            Command::SetRotate(rotate) => {
                self.rotate = rotate;
                vec![]
            }

            Command::Loaded(items) => {
                if self.load.is_loading() {
                    self.load = LoadState::Loaded(items);
                    vec![Effect::NotifyLoaded]
                } else {
                    vec![]
                }
            }

            Command::Failed(error) => {
                if self.load.is_loading() {
                    self.load = LoadState::Failed(error);
                    vec![Effect::NotifyFailed]
                } else {
                    vec![]
                }
            }

            Command::Teardown => vec![Effect::CancelRunning],
        }
    }

    /// Viewport of the current page at the current scale
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.page.viewport(self.scale)
    }

    /// Requested rotation relative to the page's own rotation, in [0, 360)
    #[must_use]
    pub fn effective_rotation(&self) -> i32 {
        normalize_degrees(self.rotate - self.page.rotation())
    }
}

/// Commands that modify layer state
#[derive(Debug)]
pub enum Command<P> {
    /// Load text items for the current page
    Load,
    /// Switch to another page
    SetPage(Arc<P>),
    /// Update the scale factor
    SetScale(f32),
    /// Update the requested rotation
    SetRotate(i32),
    /// The current extraction produced items
    Loaded(Arc<Vec<TextItem>>),
    /// The current extraction failed
    Failed(Arc<ExtractFault>),
    /// The layer is going away
    Teardown,
}

/// Effects produced by state changes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Cancel the outstanding extraction, if any
    CancelRunning,
    /// Issue an extraction for the current page
    StartExtraction,
    /// Report loaded items to the success observer
    NotifyLoaded,
    /// Report the load error to the failure observer
    NotifyFailed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::types::{Transform, ViewBox};

    #[derive(Debug)]
    struct FixedPage {
        rotation: i32,
    }

    impl PageHandle for FixedPage {
        fn rotation(&self) -> i32 {
            self.rotation
        }

        fn view_box(&self) -> ViewBox {
            ViewBox::new(0.0, 0.0, 100.0, 200.0)
        }
    }

    fn test_state() -> LayerState<FixedPage> {
        LayerState::new(Arc::new(FixedPage { rotation: 0 }), 1.0, None)
    }

    fn items() -> Arc<Vec<TextItem>> {
        Arc::new(vec![TextItem::new(
            Transform::from_placement(10.0, 5.0, 20.0, 30.0),
            "hello",
        )])
    }

    #[test]
    fn load_cancels_then_starts() {
        let mut state = test_state();
        let effects = state.apply(Command::Load);

        assert!(state.load.is_loading());
        assert_eq!(
            effects,
            vec![Effect::CancelRunning, Effect::StartExtraction]
        );
    }

    #[test]
    fn same_page_is_a_no_op() {
        let mut state = test_state();
        let _ = state.apply(Command::Load);
        let _ = state.apply(Command::Loaded(items()));

        let same = Arc::clone(&state.page);
        let effects = state.apply(Command::SetPage(same));
        assert!(effects.is_empty());
        assert!(state.load.items().is_some());
    }

    #[test]
    fn new_page_restarts_loading() {
        let mut state = test_state();
        let _ = state.apply(Command::Load);
        let _ = state.apply(Command::Loaded(items()));

        let effects = state.apply(Command::SetPage(Arc::new(FixedPage { rotation: 0 })));
        assert!(state.load.is_loading());
        assert_eq!(
            effects,
            vec![Effect::CancelRunning, Effect::StartExtraction]
        );
    }

    #[test]
    fn completion_outside_loading_is_ignored() {
        let mut state = test_state();

        let effects = state.apply(Command::Loaded(items()));
        assert!(effects.is_empty());
        assert!(matches!(state.load, LoadState::NotLoaded));

        let effects = state.apply(Command::Failed(Arc::new(ExtractFault::generic("late"))));
        assert!(effects.is_empty());
        assert!(matches!(state.load, LoadState::NotLoaded));
    }

    #[test]
    fn failure_is_distinct_from_empty_result() {
        let mut state = test_state();
        let _ = state.apply(Command::Load);
        let effects = state.apply(Command::Failed(Arc::new(ExtractFault::generic("nope"))));
        assert_eq!(effects, vec![Effect::NotifyFailed]);
        assert!(state.load.error().is_some());
        assert!(state.load.items().is_none());

        let _ = state.apply(Command::Load);
        let effects = state.apply(Command::Loaded(Arc::new(Vec::new())));
        assert_eq!(effects, vec![Effect::NotifyLoaded]);
        assert_eq!(state.load.items().map(|items| items.len()), Some(0));
    }

    #[test]
    fn scale_and_rotate_do_not_refetch() {
        let mut state = test_state();
        let _ = state.apply(Command::Load);
        let _ = state.apply(Command::Loaded(items()));

        assert!(state.apply(Command::SetScale(2.0)).is_empty());
        assert!(state.apply(Command::SetRotate(90)).is_empty());
        assert_eq!(state.viewport().width, 200.0);
        assert_eq!(state.effective_rotation(), 90);
        assert!(state.load.items().is_some());
    }

    #[test]
    fn effective_rotation_subtracts_page_rotation() {
        let page = Arc::new(FixedPage { rotation: 90 });

        let state = LayerState::new(Arc::clone(&page), 1.0, None);
        assert_eq!(state.rotate, 90);
        assert_eq!(state.effective_rotation(), 0);

        let state = LayerState::new(page, 1.0, Some(0));
        assert_eq!(state.effective_rotation(), 270);
    }

    #[test]
    fn teardown_cancels() {
        let mut state = test_state();
        assert_eq!(state.apply(Command::Teardown), vec![Effect::CancelRunning]);
    }
}
