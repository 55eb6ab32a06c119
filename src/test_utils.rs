pub mod test_helpers {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use flume::{Receiver, Sender};

    use crate::layer::{
        ExtractFault, PageHandle, TextContent, TextItem, TextSource, Transform, ViewBox,
    };

    /// In-memory page with scripted extraction behavior
    pub struct StaticPage {
        rotation: i32,
        view_box: ViewBox,
        items: Vec<TextItem>,
        failure: Option<String>,
        gate: Option<(Sender<()>, Receiver<()>)>,
    }

    impl StaticPage {
        /// A 100x200 upright page holding `items`
        pub fn new(items: Vec<TextItem>) -> Self {
            Self {
                rotation: 0,
                view_box: ViewBox::new(0.0, 0.0, 100.0, 200.0),
                items,
                failure: None,
                gate: None,
            }
        }

        /// A page with a single item whose text is `text`
        pub fn with_text(text: &str) -> Self {
            Self::new(vec![TextItem::new(
                Transform::new([12.0, 12.0, 10.0, 5.0, 20.0, 30.0]),
                text,
            )])
        }

        pub fn rotated(mut self, rotation: i32) -> Self {
            self.rotation = rotation;
            self
        }

        pub fn with_view_box(mut self, view_box: ViewBox) -> Self {
            self.view_box = view_box;
            self
        }

        /// Make extraction of this page fail with `detail`
        pub fn failing(mut self, detail: &str) -> Self {
            self.failure = Some(detail.to_string());
            self
        }

        /// Hold extraction of this page until [`StaticPage::release`]
        pub fn gated(mut self) -> Self {
            self.gate = Some(flume::unbounded());
            self
        }

        /// Let one pending extraction of this page finish
        pub fn release(&self) {
            if let Some((tx, _)) = &self.gate {
                let _ = tx.send(());
            }
        }
    }

    impl PageHandle for StaticPage {
        fn rotation(&self) -> i32 {
            self.rotation
        }

        fn view_box(&self) -> ViewBox {
            self.view_box
        }
    }

    /// Source serving [`StaticPage`]s and counting extractions
    #[derive(Default)]
    pub struct ScriptedSource {
        extractions: AtomicUsize,
    }

    impl ScriptedSource {
        pub fn new() -> Self {
            Self::default()
        }

        /// Number of extractions that reached the source
        pub fn extraction_count(&self) -> usize {
            self.extractions.load(Ordering::SeqCst)
        }
    }

    impl TextSource for ScriptedSource {
        type Page = StaticPage;

        fn text_content(&self, page: &StaticPage) -> Result<TextContent, ExtractFault> {
            self.extractions.fetch_add(1, Ordering::SeqCst);

            if let Some((_, rx)) = &page.gate {
                rx.recv()
                    .map_err(|_| ExtractFault::generic("gate closed"))?;
            }

            match &page.failure {
                Some(detail) => Err(ExtractFault::generic(detail.clone())),
                None => Ok(TextContent::new(page.items.clone())),
            }
        }
    }
}
