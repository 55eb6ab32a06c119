//! Extraction service - manages the worker pool

use std::sync::Arc;
use std::time::Duration;

use flume::{Receiver, RecvTimeoutError, Sender};
use log::{debug, info};

use super::request::{CancelFlag, ExtractRequest, ExtractResponse, RequestId};
use super::source::TextSource;
use super::worker::{WorkerSlot, extract_worker};

/// Handle to an outstanding extraction
#[derive(Debug)]
pub struct RunningTask {
    id: RequestId,
    cancel: CancelFlag,
}

impl RunningTask {
    #[must_use]
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Stop the worker from starting or delivering this request
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Runs text extraction on worker threads
///
/// A cancelled extraction that is already inside the source keeps its worker
/// until the source returns. When every worker is stuck like that, the pool
/// grows by one so a new request never queues behind abandoned work.
pub struct ExtractService<S: TextSource> {
    source: Arc<S>,
    request_tx: Sender<ExtractRequest<S::Page>>,
    request_rx: Receiver<ExtractRequest<S::Page>>,
    response_tx: Sender<ExtractResponse>,
    response_rx: Receiver<ExtractResponse>,
    slots: Vec<WorkerSlot>,
    next_request_id: u64,
}

impl<S: TextSource> ExtractService<S> {
    /// Create a new extraction service with `num_workers` initial workers
    #[must_use]
    pub fn with_workers(source: Arc<S>, num_workers: usize) -> Self {
        // Workers share one request queue, which needs an MPMC receiver
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        let mut service = Self {
            source,
            request_tx,
            request_rx,
            response_tx,
            response_rx,
            slots: Vec::new(),
            next_request_id: 1,
        };
        for _ in 0..num_workers.max(1) {
            service.spawn_worker();
        }
        service
    }

    /// Queue text extraction for a page
    pub fn request_text(&mut self, page: Arc<S::Page>) -> RunningTask {
        if self.slots.iter().all(WorkerSlot::is_stale) {
            info!(
                "All {} extraction workers are held by cancelled requests, adding one",
                self.slots.len()
            );
            self.spawn_worker();
        }

        let id = self.next_id();
        let cancel = CancelFlag::new();

        debug!("Requesting text content {id:?}");
        let _ = self.request_tx.send(ExtractRequest::Text {
            id,
            page,
            cancel: cancel.clone(),
        });

        RunningTask { id, cancel }
    }

    /// Drain completed responses without blocking
    pub fn poll_responses(&self) -> Vec<ExtractResponse> {
        self.response_rx.try_iter().collect()
    }

    /// Block until a response arrives or `timeout` elapses
    pub fn wait_response(&self, timeout: Duration) -> Option<ExtractResponse> {
        match self.response_rx.recv_timeout(timeout) {
            Ok(response) => Some(response),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Shutdown all workers
    pub fn shutdown(&self) {
        for _ in &self.slots {
            let _ = self.request_tx.send(ExtractRequest::Shutdown);
        }
    }

    fn spawn_worker(&mut self) {
        let source = Arc::clone(&self.source);
        let slot = WorkerSlot::default();
        let rx = self.request_rx.clone();
        let tx = self.response_tx.clone();

        let worker_slot = slot.clone();
        std::thread::spawn(move || {
            extract_worker(source, worker_slot, rx, tx);
        });
        self.slots.push(slot);
    }

    fn next_id(&mut self) -> RequestId {
        let id = RequestId::new(self.next_request_id);
        self.next_request_id += 1;
        id
    }
}

impl<S: TextSource> Drop for ExtractService<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
