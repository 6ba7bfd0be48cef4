// src/registry.rs

//! The process-wide job table.
//!
//! Maps job ids to their records plus the handles needed to cancel them.
//! This is the only structure touched by more than one job; each record is
//! otherwise written only by its own supervision task.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::errors::{ArchivistError, Result};
use crate::job::{JobStatusView, SharedRecord};
use crate::types::DuplicatePolicy;

/// Extra time on top of the grace period for a cancelled supervision task
/// to report back before it is aborted.
const SHUTDOWN_MARGIN: Duration = Duration::from_secs(1);

/// Handle to a job's supervision task.
#[derive(Debug)]
pub struct JobControl {
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl JobControl {
    pub fn new(cancel: oneshot::Sender<()>, handle: JoinHandle<()>) -> Self {
        Self {
            cancel: Some(cancel),
            handle,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Ask the supervision task to terminate its process and wait for it.
    ///
    /// The task gets `grace_period` plus a small margin; after that it is
    /// aborted, which drops (and kills) the child process.
    async fn shutdown(mut self, grace_period: Duration, job_id: &str) {
        if self.handle.is_finished() {
            return;
        }

        if let Some(cancel) = self.cancel.take() {
            if cancel.send(()).is_err() {
                debug!(job = %job_id, "supervision task already gone while cancelling");
            }
        }

        match timeout(grace_period + SHUTDOWN_MARGIN, &mut self.handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(job = %job_id, error = %e, "supervision task ended abnormally"),
            Err(_) => {
                warn!(job = %job_id, "supervision task did not stop in time; aborting");
                self.handle.abort();
            }
        }
    }
}

#[derive(Debug)]
struct JobEntry {
    record: SharedRecord,
    control: Option<JobControl>,
    /// Present while a removal is terminating the job; hides it from polls.
    /// Flips to `true` once the entry is gone.
    removal: Option<watch::Receiver<bool>>,
}

/// Returns `base` if free, otherwise the first free `base.N` for N = 0, 1, ...
fn free_id(jobs: &HashMap<String, JobEntry>, base: &str) -> String {
    if !jobs.contains_key(base) {
        return base.to_string();
    }

    (0u64..)
        .map(|i| format!("{base}.{i}"))
        .find(|candidate| !jobs.contains_key(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[derive(Debug, Default)]
pub struct JobTable {
    jobs: Arc<Mutex<HashMap<String, JobEntry>>>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id a new job with this base would get right now.
    pub fn allocate_id(&self, base: &str) -> String {
        free_id(&self.jobs.lock(), base)
    }

    /// Insert a record under an exact id. Fails if the id is taken.
    pub fn register(
        &self,
        id: impl Into<String>,
        record: SharedRecord,
        control: Option<JobControl>,
    ) -> Result<()> {
        let id = id.into();
        let mut jobs = self.jobs.lock();
        if jobs.contains_key(&id) {
            return Err(ArchivistError::DuplicateJob(id));
        }
        jobs.insert(
            id,
            JobEntry {
                record,
                control,
                removal: None,
            },
        );
        Ok(())
    }

    /// Pick an id for `base` under `policy` and insert whatever `build`
    /// produces for it, all under one lock so two requests can never end
    /// up with the same id.
    pub fn insert_new<F>(&self, base: &str, policy: DuplicatePolicy, build: F) -> Result<String>
    where
        F: FnOnce(&str) -> (SharedRecord, Option<JobControl>),
    {
        let mut jobs = self.jobs.lock();

        let id = match policy {
            DuplicatePolicy::Reject if jobs.contains_key(base) => {
                return Err(ArchivistError::DuplicateJob(base.to_string()));
            }
            DuplicatePolicy::Reject => base.to_string(),
            DuplicatePolicy::Suffix => free_id(&jobs, base),
        };

        let (record, control) = build(&id);
        jobs.insert(
            id.clone(),
            JobEntry {
                record,
                control,
                removal: None,
            },
        );
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Option<SharedRecord> {
        self.jobs.lock().get(id).map(|entry| entry.record.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.jobs.lock().contains_key(id)
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.jobs.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    /// Remove a job, terminating its process first if it is still running.
    ///
    /// Termination and the final removal run on their own task, so the
    /// entry is always cleaned up even if the caller stops waiting. The
    /// entry stays in the table (hidden from snapshots) until the process is
    /// gone, so its id cannot be handed out again too early. A second
    /// removal racing the first waits for the same completion.
    pub async fn remove(&self, id: &str, grace_period: Duration) -> Result<()> {
        let mut done = {
            let mut jobs = self.jobs.lock();
            let entry = jobs
                .get_mut(id)
                .ok_or_else(|| ArchivistError::JobNotFound(id.to_string()))?;

            match &entry.removal {
                Some(rx) => {
                    debug!(job = %id, "removal already in progress; waiting for it");
                    rx.clone()
                }
                None => {
                    let (tx, rx) = watch::channel(false);
                    entry.removal = Some(rx.clone());
                    let control = entry.control.take();
                    let table = Arc::clone(&self.jobs);
                    let job_id = id.to_string();

                    tokio::spawn(async move {
                        if let Some(control) = control {
                            if !control.is_finished() {
                                warn!(job = %job_id, "terminating running job before removal");
                            }
                            control.shutdown(grace_period, &job_id).await;
                        }
                        table.lock().remove(&job_id);
                        info!(job = %job_id, "job entry removed");
                        let _ = tx.send(true);
                    });
                    rx
                }
            }
        };

        if done.wait_for(|removed| *removed).await.is_err() {
            warn!(job = %id, "removal task ended without reporting completion");
        }
        Ok(())
    }

    /// Status of every job not currently being removed, as of now.
    pub fn snapshot(&self) -> BTreeMap<String, JobStatusView> {
        self.jobs
            .lock()
            .iter()
            .filter(|(_, entry)| entry.removal.is_none())
            .map(|(id, entry)| (id.clone(), entry.record.lock().view()))
            .collect()
    }
}
