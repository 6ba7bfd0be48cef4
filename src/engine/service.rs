// src/engine/service.rs

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::callback::CallbackRegistry;
use crate::config::ConfigFile;
use crate::errors::{ArchivistError, Result};
use crate::exec::Supervisor;
use crate::job::{JobRecord, JobStatusView};
use crate::registry::{JobControl, JobTable};
use crate::types::{BinaryKind, DuplicatePolicy};

/// Everything needed to start one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    /// Requested id, typically the video id. May receive a `.N` suffix.
    pub base_id: String,
    pub binary: BinaryKind,
    /// Fully rendered command line.
    pub command: String,
    /// Callback ids to run, in order, once the process has exited.
    pub callbacks: Vec<String>,
}

/// Front door used by whatever transport sits on top (CLI, HTTP, ...).
///
/// Owns the single job table for the lifetime of the process. Cloning is
/// cheap and every clone talks to the same table.
#[derive(Debug, Clone)]
pub struct JobService {
    table: Arc<JobTable>,
    supervisor: Arc<Supervisor>,
    policy: DuplicatePolicy,
}

impl JobService {
    pub fn new(cfg: &ConfigFile, callbacks: CallbackRegistry) -> Self {
        Self::with_supervisor(Supervisor::from_config(cfg, callbacks), cfg.duplicate_policy)
    }

    pub fn with_supervisor(supervisor: Supervisor, policy: DuplicatePolicy) -> Self {
        Self {
            table: Arc::new(JobTable::new()),
            supervisor: Arc::new(supervisor),
            policy,
        }
    }

    pub fn table(&self) -> &JobTable {
        &self.table
    }

    pub fn grace_period(&self) -> Duration {
        self.supervisor.grace_period()
    }

    /// Register a `Pending` job and start supervising it. Returns its id.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn create_job(&self, request: JobRequest) -> Result<String> {
        if request.base_id.trim().is_empty() {
            return Err(ArchivistError::InvalidRequest(
                "job id must not be empty".to_string(),
            ));
        }
        if request.command.trim().is_empty() {
            return Err(ArchivistError::InvalidRequest(
                "job command must not be empty".to_string(),
            ));
        }

        let supervisor = Arc::clone(&self.supervisor);
        let id = self.table.insert_new(&request.base_id, self.policy, |id| {
            let record = JobRecord::new(
                id,
                request.binary,
                request.command.clone(),
                request.callbacks.clone(),
            )
            .into_shared();

            let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
            let task_record = record.clone();
            let handle = tokio::spawn(async move {
                supervisor.run_job(task_record, cancel_rx).await;
            });

            (record, Some(JobControl::new(cancel_tx, handle)))
        })?;

        info!(
            job = %id,
            binary = %request.binary,
            callbacks = ?request.callbacks,
            "job accepted"
        );
        Ok(id)
    }

    /// Current status of every job. Never waits on job work.
    pub fn poll(&self) -> BTreeMap<String, JobStatusView> {
        self.table.snapshot()
    }

    pub fn get(&self, id: &str) -> Option<JobStatusView> {
        self.table.get(id).map(|record| record.lock().view())
    }

    /// Cancel (if still running) and forget a job.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.table.remove(id, self.supervisor.grace_period()).await
    }

    /// Ids of the configured callbacks.
    pub fn callback_ids(&self) -> Vec<String> {
        self.supervisor.callbacks().ids()
    }

    /// Cancel and remove every job, concurrently.
    pub async fn shutdown(&self) {
        let mut set = JoinSet::new();
        for id in self.table.ids() {
            let table = Arc::clone(&self.table);
            let grace = self.supervisor.grace_period();
            set.spawn(async move {
                if let Err(e) = table.remove(&id, grace).await {
                    warn!(job = %id, error = %e, "failed to remove job during shutdown");
                }
            });
        }

        while let Some(res) = set.join_next().await {
            if let Err(e) = res {
                warn!(error = %e, "shutdown task failed");
            }
        }
    }
}
