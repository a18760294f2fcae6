//! Debounced extract-and-upload pipeline
//!
//! A single task owns the extractor and the batcher. File events are turned
//! into summaries and queued; once no event has arrived for the debounce
//! interval the queue is drained and uploaded as one batch.
//!
//! The queue is emptied before the upload starts, and the upload runs as a
//! separate task, so events arriving while a request is in flight start a
//! fresh batch. Failed batches are logged and dropped.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};

use crate::batch::{Batcher, DebounceState};
use crate::client::MemorySink;
use crate::extract::{is_supported, Extractor, Summary};
use crate::types::{ItemDefaults, MemoryItem};
use crate::watch::FileEvent;

/// Upload `items` once. Logs the outcome; never fails and never retries.
///
/// Returns the number of items accepted, or `None` if the batch was dropped.
pub async fn upload_batch(sink: &dyn MemorySink, items: Vec<MemoryItem>) -> Option<usize> {
    let count = items.len();
    match sink.add_batch(&items).await {
        Ok(accepted) => {
            tracing::info!("Uploaded {} code summaries", accepted);
            Some(accepted)
        }
        Err(e) => {
            tracing::error!(
                retryable = e.is_retryable(),
                "Dropping batch of {} summaries: {}",
                count,
                e
            );
            None
        }
    }
}

/// Owns the queue and debounce timer for one watcher run
pub struct SyncPipeline {
    extractor: Arc<Extractor>,
    batcher: Batcher,
    defaults: ItemDefaults,
    sink: Arc<dyn MemorySink>,
    uploads: JoinSet<Option<usize>>,
}

impl SyncPipeline {
    pub fn new(
        extractor: Extractor,
        debounce: Duration,
        defaults: ItemDefaults,
        sink: Arc<dyn MemorySink>,
    ) -> Self {
        Self {
            extractor: Arc::new(extractor),
            batcher: Batcher::new(debounce),
            defaults,
            sink,
            uploads: JoinSet::new(),
        }
    }

    pub fn batcher(&self) -> &Batcher {
        &self.batcher
    }

    pub fn state(&self) -> DebounceState {
        self.batcher.state()
    }

    /// Apply one file event to the queue.
    ///
    /// A supported file that no longer yields a summary (emptied, unreadable,
    /// too large) also drops whatever was queued for it.
    pub async fn handle_event(&mut self, event: FileEvent) {
        match event {
            FileEvent::Added(path) | FileEvent::Changed(path) => {
                match self.extract(path.clone()).await {
                    Some(summary) => {
                        let item = summary.into_item(&path, &self.defaults);
                        let replaced = self.batcher.upsert(path.clone(), item, Instant::now());
                        tracing::debug!(
                            "Queued {} ({}, {} pending)",
                            path.display(),
                            if replaced { "replaced" } else { "new" },
                            self.batcher.len()
                        );
                    }
                    None => {
                        if is_supported(&path) && self.batcher.remove(&path).is_some() {
                            tracing::debug!("Dropped stale entry for {}", path.display());
                        }
                    }
                }
            }
            FileEvent::Removed(path) => {
                if self.batcher.remove(&path).is_some() {
                    tracing::debug!("Removed pending entry for {}", path.display());
                }
            }
            FileEvent::RemovedDir(dir) => {
                let removed = self.batcher.remove_under(&dir);
                if removed > 0 {
                    tracing::debug!("Removed {} pending entries under {}", removed, dir.display());
                }
            }
        }
    }

    /// Read and parse off the async workers
    async fn extract(&self, path: PathBuf) -> Option<Summary> {
        let extractor = Arc::clone(&self.extractor);
        match tokio::task::spawn_blocking(move || extractor.extract_file(&path)).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!("Extraction task failed: {}", e);
                None
            }
        }
    }

    /// Drain the queue and start uploading it.
    ///
    /// Returns the batch size, or `None` when there was nothing to send.
    pub fn flush(&mut self) -> Option<usize> {
        let items = self.batcher.take_batch();
        if items.is_empty() {
            return None;
        }

        let count = items.len();
        let sink = Arc::clone(&self.sink);
        self.uploads
            .spawn(async move { upload_batch(sink.as_ref(), items).await });
        Some(count)
    }

    /// Wait for every in-flight upload to finish
    pub async fn drain_uploads(&mut self) {
        while let Some(result) = self.uploads.join_next().await {
            if let Err(e) = result {
                tracing::error!("Upload task failed: {}", e);
            }
        }
    }

    /// Process events until the channel closes or `shutdown` resolves.
    ///
    /// Pending items are flushed one last time before returning.
    pub async fn run<F>(mut self, mut events: UnboundedReceiver<FileEvent>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let deadline = self.batcher.deadline();

            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => break,
                },
                _ = wait_until(deadline) => {
                    self.flush();
                }
                Some(result) = self.uploads.join_next(), if !self.uploads.is_empty() => {
                    if let Err(e) = result {
                        tracing::error!("Upload task failed: {}", e);
                    }
                }
                _ = &mut shutdown => {
                    tracing::info!("Shutting down pipeline");
                    break;
                }
            }
        }

        self.flush();
        self.drain_uploads().await;
        tracing::info!("Pipeline stopped");
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
