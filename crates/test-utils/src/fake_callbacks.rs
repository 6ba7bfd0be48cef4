use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use parking_lot::Mutex;
use archivist::callback::{Callback, CallbackFuture, SpliceResult};

/// Always returns the same splice result.
pub struct StaticCallback {
    result: SpliceResult,
}

impl StaticCallback {
    pub fn new(result: SpliceResult) -> Self {
        Self { result }
    }
}

impl Callback for StaticCallback {
    fn invoke(&self, _path: PathBuf) -> CallbackFuture<'_> {
        let result = self.result.clone();
        Box::pin(async move { Ok(result) })
    }
}

/// Always fails with the given message.
pub struct FailingCallback {
    message: String,
}

impl FailingCallback {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl Callback for FailingCallback {
    fn invoke(&self, _path: PathBuf) -> CallbackFuture<'_> {
        let message = self.message.clone();
        Box::pin(async move { Err(anyhow!(message)) })
    }
}

/// Panics inside its future.
pub struct PanickingCallback;

impl Callback for PanickingCallback {
    fn invoke(&self, _path: PathBuf) -> CallbackFuture<'_> {
        Box::pin(async move { explode() })
    }
}

fn explode() -> anyhow::Result<SpliceResult> {
    panic!("callback exploded")
}

/// Records every path it is invoked with, then returns an empty result.
#[derive(Clone, Default)]
pub struct RecordingCallback {
    seen: Arc<Mutex<Vec<PathBuf>>>,
}

impl RecordingCallback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> Vec<PathBuf> {
        self.seen.lock().clone()
    }
}

impl Callback for RecordingCallback {
    fn invoke(&self, path: PathBuf) -> CallbackFuture<'_> {
        let seen = Arc::clone(&self.seen);
        Box::pin(async move {
            seen.lock().push(path);
            Ok(SpliceResult::new())
        })
    }
}
