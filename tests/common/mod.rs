//! Shared helpers for integration tests

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use memsync::client::{MemoryApiClient, BATCH_ADD_PATH};
use memsync::extract::{ExtractLimits, Extractor};
use memsync::pipeline::SyncPipeline;
use memsync::types::ItemDefaults;
use memsync::watch::FileEvent;

/// Debounce used by the end-to-end tests
pub const TEST_DEBOUNCE: Duration = Duration::from_millis(200);

/// Comfortably longer than the debounce interval
pub const SETTLE: Duration = Duration::from_millis(800);

pub fn defaults() -> ItemDefaults {
    ItemDefaults {
        category: Some("code".to_string()),
        tags: vec!["code".to_string()],
    }
}

/// Mount a batch endpoint answering `status`
pub async fn mount_batch_endpoint(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path(BATCH_ADD_PATH))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Pipeline for `root` uploading to `server`
pub fn pipeline_for(server: &MockServer, root: &Path) -> SyncPipeline {
    let client = MemoryApiClient::new(&server.uri(), None).expect("client");
    SyncPipeline::new(
        Extractor::new(root, ExtractLimits::default()),
        TEST_DEBOUNCE,
        defaults(),
        Arc::new(client),
    )
}

/// Spawn a pipeline that runs until the returned sender is dropped
pub fn spawn_pipeline(
    server: &MockServer,
    root: &Path,
) -> (UnboundedSender<FileEvent>, JoinHandle<()>) {
    let pipeline = pipeline_for(server, root);
    let (tx, rx) = unbounded_channel();
    let handle = tokio::spawn(pipeline.run(rx, std::future::pending()));
    (tx, handle)
}

/// JSON bodies of every batch upload received so far
pub async fn batch_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == BATCH_ADD_PATH)
        .map(|r| r.body_json::<Value>().expect("JSON body"))
        .collect()
}
