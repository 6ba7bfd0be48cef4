// src/callback/chain.rs

//! Sequential callback execution for a finished job.

use std::any::Any;
use std::path::PathBuf;

use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::callback::{CallbackRegistry, SpliceResult};
use crate::job::{extract_final_path, SharedRecord};
use crate::types::JobStatus;

/// Cursor over a job's callback queue.
///
/// Each `resume()` hands out the next callback to run and moves the cursor
/// forward; once the queue is exhausted the cursor is cleared and `resume()`
/// keeps returning `None`.
#[derive(Debug, Clone)]
pub struct CallbackChain {
    queue: Vec<String>,
    cursor: Option<usize>,
    next: usize,
    failures: usize,
}

impl CallbackChain {
    pub fn new(queue: Vec<String>) -> Self {
        Self {
            queue,
            cursor: None,
            next: 0,
            failures: 0,
        }
    }

    pub fn resume(&mut self) -> Option<(usize, String)> {
        match self.queue.get(self.next) {
            Some(id) => {
                let index = self.next;
                self.cursor = Some(index);
                self.next += 1;
                Some((index, id.clone()))
            }
            None => {
                self.cursor = None;
                None
            }
        }
    }

    /// Index of the callback currently running.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.queue.len() && self.cursor.is_none()
    }
}

/// Splice a callback's blocks around the two sides of the final output.
///
/// `front` blocks are prepended in order, so the last one ends up first;
/// `end` blocks are appended in order. A block's `err` text goes to the
/// error side under the same key, and only when non-empty.
pub fn splice(out: &mut String, err: &mut String, result: &SpliceResult) {
    for (key, block) in result.front.iter() {
        *out = format!("{key}:\n{}\n\n{out}", block.out);
        if !block.err.is_empty() {
            *err = format!("{key}:\n{}\n\n{err}", block.err);
        }
    }

    for (key, block) in result.end.iter() {
        out.push_str(&format!("\n\n{key}:\n{}", block.out));
        if !block.err.is_empty() {
            err.push_str(&format!("\n\n{key}:\n{}", block.err));
        }
    }
}

/// Text appended to the final log when a callback fails.
pub fn failure_block(id: &str, detail: &str) -> String {
    format!("\n\n[CALLBACK ERROR: {id}]\n{detail}")
}

/// Run the callbacks a finished job asked for.
///
/// Skipped (with the job status untouched) when the job requested none, when
/// no callbacks are configured at all, or when the produced file cannot be
/// found in the log. Otherwise the job sits in `CallbackPending` while each
/// callback runs; a failing callback is recorded in the log and downgrades
/// `Done` to `Warning` but never stops the chain.
pub async fn run_post_processing(record: &SharedRecord, registry: &CallbackRegistry) {
    let (id, queue, resolved, path) = {
        let rec = record.lock();
        let path = rec
            .final_log()
            .and_then(|log| extract_final_path(log, rec.binary()));
        (
            rec.id().to_string(),
            rec.callback_queue().to_vec(),
            rec.status(),
            path,
        )
    };

    if queue.is_empty() {
        return;
    }

    if registry.is_empty() {
        debug!(job = %id, ?queue, "no callbacks configured; ignoring requested callbacks");
        return;
    }

    let Some(path) = path else {
        warn!(job = %id, "final file path not detected; callbacks skipped");
        return;
    };

    info!(job = %id, path = %path.display(), ?queue, "running callbacks");
    record.lock().set_status(JobStatus::CallbackPending);

    let mut chain = CallbackChain::new(queue);
    while let Some((index, cb_id)) = chain.resume() {
        record.lock().set_callback_cursor(chain.cursor());
        debug!(job = %id, callback = %cb_id, index, "running callback");

        let outcome = invoke_isolated(registry, &cb_id, path.clone()).await;

        let mut rec = record.lock();
        let (out, err) = rec.final_logs_mut();
        match outcome {
            Ok(result) => {
                splice(out, err, &result);
                info!(job = %id, callback = %cb_id, "callback finished");
            }
            Err(detail) => {
                warn!(job = %id, callback = %cb_id, error = %detail, "callback failed");
                out.push_str(&failure_block(&cb_id, &detail));
                chain.record_failure();
            }
        }
    }

    let final_status = if chain.failures() > 0 && resolved == JobStatus::Done {
        JobStatus::Warning
    } else {
        resolved
    };

    let mut rec = record.lock();
    rec.set_callback_cursor(None);
    rec.set_status(final_status);
}

/// Run one callback on its own task so a panic is contained like an error.
async fn invoke_isolated(
    registry: &CallbackRegistry,
    cb_id: &str,
    path: PathBuf,
) -> Result<SpliceResult, String> {
    let Some(callback) = registry.get(cb_id) else {
        return Err(format!("unknown callback id '{cb_id}'"));
    };

    let handle = tokio::spawn(async move { callback.invoke(path).await });
    let _abort = AbortOnDrop(handle.abort_handle());

    match handle.await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => Err(format!("{e:#}")),
        Err(join_err) if join_err.is_panic() => Err(format!(
            "callback panicked: {}",
            panic_message(join_err.into_panic())
        )),
        Err(join_err) => Err(join_err.to_string()),
    }
}

/// Aborts the callback task when the chain is abandoned mid-callback.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
