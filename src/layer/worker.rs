//! Text extraction worker - runs in separate thread(s)

use std::sync::{Arc, Mutex, PoisonError};

use flume::{Receiver, Sender};
use log::debug;

use super::request::{CancelFlag, ExtractRequest, ExtractResponse};
use super::source::TextSource;

/// The cancel flag of the request a worker is extracting, if any
#[derive(Clone, Debug, Default)]
pub struct WorkerSlot(Arc<Mutex<Option<CancelFlag>>>);

impl WorkerSlot {
    fn occupy(&self, cancel: &CancelFlag) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(cancel.clone());
    }

    fn vacate(&self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Busy on a request that nobody will read the result of
    pub fn is_stale(&self) -> bool {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(CancelFlag::is_cancelled)
    }
}

/// Main worker function - runs in a dedicated thread
#[expect(
    clippy::needless_pass_by_value,
    reason = "Values moved into thread, need ownership"
)]
pub fn extract_worker<S: TextSource>(
    source: Arc<S>,
    slot: WorkerSlot,
    requests: Receiver<ExtractRequest<S::Page>>,
    responses: Sender<ExtractResponse>,
) {
    for request in requests {
        match request {
            ExtractRequest::Text { id, page, cancel } => {
                // Occupy before the check so the service never misses a stale slot
                slot.occupy(&cancel);
                if cancel.is_cancelled() {
                    debug!("Skipping cancelled extraction {id:?}");
                    slot.vacate();
                    continue;
                }

                let response = match source.text_content(&page) {
                    Ok(content) => ExtractResponse::Text { id, content },
                    Err(error) => ExtractResponse::Error { id, error },
                };
                slot.vacate();

                // Work already done is dropped, never delivered
                if cancel.is_cancelled() {
                    debug!("Dropping result of cancelled extraction {id:?}");
                    continue;
                }

                let _ = responses.send(response);
            }

            ExtractRequest::Shutdown => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::request::RequestId;
    use crate::test_utils::test_helpers::{ScriptedSource, StaticPage};

    fn run_to_completion(
        source: &Arc<ScriptedSource>,
        requests: Vec<ExtractRequest<StaticPage>>,
    ) -> Vec<ExtractResponse> {
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();
        for request in requests {
            request_tx.send(request).unwrap();
        }
        request_tx.send(ExtractRequest::Shutdown).unwrap();

        extract_worker(
            Arc::clone(source),
            WorkerSlot::default(),
            request_rx,
            response_tx,
        );
        response_rx.try_iter().collect()
    }

    #[test]
    fn request_cancelled_before_start_never_reaches_the_source() {
        let source = Arc::new(ScriptedSource::new());
        let skipped = CancelFlag::new();
        skipped.cancel();

        let responses = run_to_completion(
            &source,
            vec![
                ExtractRequest::Text {
                    id: RequestId::new(1),
                    page: Arc::new(StaticPage::with_text("skipped")),
                    cancel: skipped,
                },
                ExtractRequest::Text {
                    id: RequestId::new(2),
                    page: Arc::new(StaticPage::with_text("served")),
                    cancel: CancelFlag::new(),
                },
            ],
        );

        assert_eq!(source.extraction_count(), 1);
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].id(), RequestId::new(2));
    }

    #[test]
    fn result_cancelled_during_extraction_is_dropped() {
        let source = Arc::new(ScriptedSource::new());
        let page = Arc::new(StaticPage::with_text("late").gated());
        let cancel = CancelFlag::new();
        let slot = WorkerSlot::default();
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        let worker = {
            let source = Arc::clone(&source);
            let slot = slot.clone();
            std::thread::spawn(move || extract_worker(source, slot, request_rx, response_tx))
        };
        request_tx
            .send(ExtractRequest::Text {
                id: RequestId::new(1),
                page: Arc::clone(&page),
                cancel: cancel.clone(),
            })
            .unwrap();

        while source.extraction_count() == 0 {
            std::thread::yield_now();
        }
        assert!(!slot.is_stale());
        cancel.cancel();
        assert!(slot.is_stale());

        page.release();
        request_tx.send(ExtractRequest::Shutdown).unwrap();
        worker.join().unwrap();

        assert!(!slot.is_stale());
        assert!(response_rx.try_iter().next().is_none());
    }
}
