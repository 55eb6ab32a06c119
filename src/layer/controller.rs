//! Text layer controller
//!
//! Owns at most one running extraction. Responses are only applied when the
//! embedder pumps the controller with [`TextLayer::poll`] or
//! [`TextLayer::wait`], so all state changes and observer calls happen on the
//! owning thread.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, warn};

use super::DEFAULT_WORKERS;
use super::request::{ExtractFault, ExtractResponse};
use super::service::{ExtractService, RunningTask};
use super::source::TextSource;
use super::state::{Command, Effect, LayerState, LoadState};
use super::transform::fragment_rect;
use super::types::{LayerView, OverlayFrame, PositionedFragment, TextItem, Viewport};

type ItemsObserver = Box<dyn FnMut(&[TextItem])>;
type ErrorObserver = Box<dyn FnMut(&ExtractFault)>;

/// Errors raised while wiring up a text layer
#[derive(Debug, thiserror::Error)]
pub enum LayerError {
    #[error("attempted to load page text content, but no page was specified")]
    MissingPage,
}

/// Configuration for a [`TextLayer`]
pub struct TextLayerBuilder<S: TextSource> {
    source: Arc<S>,
    page: Option<Arc<S::Page>>,
    scale: f32,
    rotate: Option<i32>,
    workers: usize,
    on_items_loaded: Option<ItemsObserver>,
    on_load_error: Option<ErrorObserver>,
}

impl<S: TextSource> TextLayerBuilder<S> {
    #[must_use]
    pub fn page(mut self, page: Arc<S::Page>) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Requested display rotation; defaults to the page's own rotation
    #[must_use]
    pub fn rotate(mut self, rotate: i32) -> Self {
        self.rotate = Some(rotate);
        self
    }

    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub fn on_items_loaded(mut self, observer: impl FnMut(&[TextItem]) + 'static) -> Self {
        self.on_items_loaded = Some(Box::new(observer));
        self
    }

    #[must_use]
    pub fn on_load_error(mut self, observer: impl FnMut(&ExtractFault) + 'static) -> Self {
        self.on_load_error = Some(Box::new(observer));
        self
    }

    /// Start the layer and issue the first extraction
    pub fn mount(self) -> Result<TextLayer<S>, LayerError> {
        let page = self.page.ok_or(LayerError::MissingPage)?;

        let mut layer = TextLayer {
            state: LayerState::new(page, self.scale, self.rotate),
            service: ExtractService::with_workers(self.source, self.workers),
            running: None,
            on_items_loaded: self.on_items_loaded,
            on_load_error: self.on_load_error,
            torn_down: false,
        };
        layer.apply_command(Command::Load);

        Ok(layer)
    }
}

/// Positions the text of one page over its rendered image
pub struct TextLayer<S: TextSource> {
    state: LayerState<S::Page>,
    service: ExtractService<S>,
    running: Option<RunningTask>,
    on_items_loaded: Option<ItemsObserver>,
    on_load_error: Option<ErrorObserver>,
    torn_down: bool,
}

impl<S: TextSource> TextLayer<S> {
    #[must_use]
    pub fn builder(source: Arc<S>) -> TextLayerBuilder<S> {
        TextLayerBuilder {
            source,
            page: None,
            scale: 1.0,
            rotate: None,
            workers: DEFAULT_WORKERS,
            on_items_loaded: None,
            on_load_error: None,
        }
    }

    /// Switch to another page. Passing the current page does nothing.
    pub fn set_page(&mut self, page: Arc<S::Page>) {
        self.apply_command(Command::SetPage(page));
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.apply_command(Command::SetScale(scale));
    }

    pub fn set_rotate(&mut self, rotate: i32) {
        self.apply_command(Command::SetRotate(rotate));
    }

    /// Apply every response that has already arrived
    pub fn poll(&mut self) {
        if self.torn_down {
            return;
        }
        for response in self.service.poll_responses() {
            self.handle_response(response);
        }
    }

    /// Block until a response arrives or `timeout` elapses, then apply it and
    /// anything else pending. Returns true once the current page has settled.
    pub fn wait(&mut self, timeout: Duration) -> bool {
        if self.torn_down {
            return false;
        }
        if let Some(response) = self.service.wait_response(timeout) {
            self.handle_response(response);
            self.poll();
        }
        !self.state.load.is_loading()
    }

    /// Cancel outstanding work. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.apply_command(Command::Teardown);
        self.torn_down = true;
    }

    #[must_use]
    pub fn load_state(&self) -> &LoadState {
        &self.state.load
    }

    #[must_use]
    pub fn page(&self) -> &Arc<S::Page> {
        &self.state.page
    }

    #[must_use]
    pub fn scale(&self) -> f32 {
        self.state.scale
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.state.viewport()
    }

    #[must_use]
    pub fn effective_rotation(&self) -> i32 {
        self.state.effective_rotation()
    }

    /// Whether an extraction is outstanding
    #[must_use]
    pub fn has_running_task(&self) -> bool {
        self.running.is_some()
    }

    /// Position the loaded text items for the current inputs
    #[must_use]
    pub fn fragments(&self) -> Vec<PositionedFragment> {
        let Some(items) = self.state.load.items() else {
            return Vec::new();
        };

        let view_box = self.viewport().view_box;
        let rotation = self.effective_rotation();
        let scale = self.state.scale;

        items
            .iter()
            .map(|item| {
                let rect = fragment_rect(&view_box, rotation, &item.transform);
                PositionedFragment {
                    top: rect.top,
                    left: rect.left,
                    height: rect.height,
                    scale,
                    text: item.text.clone(),
                }
            })
            .collect()
    }

    /// Render model: the overlay frame and its positioned fragments
    #[must_use]
    pub fn render(&self) -> LayerView {
        let viewport = self.viewport();

        LayerView {
            frame: OverlayFrame {
                width: viewport.width,
                height: viewport.height,
                rotation: self.state.rotate - viewport.rotation,
            },
            fragments: self.fragments(),
        }
    }

    fn handle_response(&mut self, response: ExtractResponse) {
        let id = response.id();
        if self.running.as_ref().map(RunningTask::id) != Some(id) {
            debug!("Discarding stale extraction {id:?}");
            return;
        }
        self.running = None;

        match response {
            ExtractResponse::Text { content, .. } => {
                debug!("Extraction {id:?} produced {} items", content.items.len());
                self.apply_command(Command::Loaded(Arc::new(content.items)));
            }
            ExtractResponse::Error { error, .. } => {
                error!("Failed to load page text content: {error}");
                self.apply_command(Command::Failed(Arc::new(error)));
            }
        }
    }

    fn apply_command(&mut self, cmd: Command<S::Page>) {
        if self.torn_down {
            warn!("Ignoring command on a torn down text layer");
            return;
        }
        let effects = self.state.apply(cmd);
        self.execute_effects(effects);
    }

    fn execute_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::CancelRunning => {
                    if let Some(task) = self.running.take() {
                        debug!("Cancelling extraction {:?}", task.id());
                        task.cancel();
                    }
                }

                Effect::StartExtraction => {
                    let page = Arc::clone(&self.state.page);
                    let task = self.service.request_text(page);
                    if let Some(previous) = self.running.replace(task) {
                        previous.cancel();
                    }
                }

                Effect::NotifyLoaded => {
                    if let (Some(observer), Some(items)) =
                        (self.on_items_loaded.as_mut(), self.state.load.items())
                    {
                        observer(items.as_slice());
                    }
                }

                Effect::NotifyFailed => {
                    if let (Some(observer), Some(error)) =
                        (self.on_load_error.as_mut(), self.state.load.error())
                    {
                        observer(&**error);
                    }
                }
            }
        }
    }
}

impl<S: TextSource> Drop for TextLayer<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::layer::request::RequestId;
    use crate::layer::types::{TextContent, Transform};
    use crate::test_utils::test_helpers::{ScriptedSource, StaticPage};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn mount_on(page: &Arc<StaticPage>) -> TextLayer<ScriptedSource> {
        TextLayer::builder(Arc::new(ScriptedSource::new()))
            .page(Arc::clone(page))
            .mount()
            .expect("page is set")
    }

    #[test]
    fn mount_without_page_is_rejected() {
        let result = TextLayer::builder(Arc::new(ScriptedSource::new())).mount();
        assert!(matches!(result, Err(LayerError::MissingPage)));
    }

    #[test]
    fn response_for_another_request_is_discarded() {
        let page = Arc::new(StaticPage::with_text("current").gated());
        let loaded = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&loaded);
        let mut layer = TextLayer::builder(Arc::new(ScriptedSource::new()))
            .page(Arc::clone(&page))
            .on_items_loaded(move |_| *counter.borrow_mut() += 1)
            .mount()
            .expect("page is set");

        layer.handle_response(ExtractResponse::Text {
            id: RequestId::new(999),
            content: TextContent::new(vec![TextItem::new(
                Transform::from_placement(1.0, 1.0, 0.0, 0.0),
                "stale",
            )]),
        });

        assert!(layer.load_state().is_loading());
        assert!(layer.has_running_task());
        assert_eq!(*loaded.borrow(), 0);

        page.release();
        assert!(layer.wait(TIMEOUT));
        assert_eq!(*loaded.borrow(), 1);
        assert_eq!(layer.fragments()[0].text, "current");
    }

    #[test]
    fn render_is_empty_until_loaded() {
        let page = Arc::new(StaticPage::with_text("later").gated());
        let mut layer = mount_on(&page);

        assert!(layer.render().fragments.is_empty());

        page.release();
        assert!(layer.wait(TIMEOUT));
        assert_eq!(layer.render().fragments.len(), 1);
    }

    #[test]
    fn frame_counter_rotates_by_page_rotation() {
        let page = Arc::new(StaticPage::with_text("x").rotated(90));
        let mut layer = TextLayer::builder(Arc::new(ScriptedSource::new()))
            .page(page)
            .scale(2.0)
            .rotate(180)
            .mount()
            .expect("page is set");
        assert!(layer.wait(TIMEOUT));

        let view = layer.render();
        assert_eq!(view.frame.rotation, 90);
        assert_eq!((view.frame.width, view.frame.height), (400.0, 200.0));
        assert_eq!(layer.effective_rotation(), 90);

        let fragment = &view.fragments[0];
        assert_eq!((fragment.top, fragment.left, fragment.height), (20.0, 30.0, 10.0));
        assert_eq!(fragment.font_size_px(), 20.0);
    }

    #[test]
    fn scale_change_relayouts_without_refetch() {
        let source = Arc::new(ScriptedSource::new());
        let mut layer = TextLayer::builder(Arc::clone(&source))
            .page(Arc::new(StaticPage::with_text("x")))
            .mount()
            .expect("page is set");
        assert!(layer.wait(TIMEOUT));

        layer.set_scale(3.0);
        layer.set_rotate(180);

        assert!(!layer.has_running_task());
        let fragment = &layer.fragments()[0];
        assert_eq!(fragment.scale, 3.0);
        assert_eq!((fragment.top_px(), fragment.left_px()), (90.0, 240.0));
        assert_eq!(source.extraction_count(), 1);
    }
}
