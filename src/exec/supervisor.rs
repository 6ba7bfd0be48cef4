// src/exec/supervisor.rs

//! Process lifecycle for a single job.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::callback::{run_post_processing, CallbackRegistry};
use crate::config::{ConfigFile, ShellSpec};
use crate::errors::{ArchivistError, Result};
use crate::exec::drain::drain_both;
use crate::job::{resolve_status, SharedRecord};
use crate::types::JobStatus;

/// Build a command that runs `line` through the configured shell.
pub fn shell_command(shell: &ShellSpec, line: &str) -> Command {
    let mut cmd = Command::new(&shell.program);
    cmd.args(&shell.args).arg(line);
    cmd
}

/// Launches job processes and drives each one to a terminal state.
#[derive(Debug, Clone)]
pub struct Supervisor {
    shell: ShellSpec,
    grace_period: Duration,
    callbacks: Arc<CallbackRegistry>,
}

impl Supervisor {
    pub fn new(shell: ShellSpec, grace_period: Duration, callbacks: CallbackRegistry) -> Self {
        Self {
            shell,
            grace_period,
            callbacks: Arc::new(callbacks),
        }
    }

    pub fn from_config(cfg: &ConfigFile, callbacks: CallbackRegistry) -> Self {
        Self::new(cfg.shell.clone(), cfg.grace_period, callbacks)
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.callbacks
    }

    /// Launch `command` with piped stdout/stderr.
    ///
    /// On unix the child leads its own process group so termination also
    /// reaches whatever the shell started.
    pub fn spawn(&self, command: &str) -> Result<Child> {
        let mut cmd = shell_command(&self.shell, command);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        cmd.spawn().map_err(|source| ArchivistError::Spawn {
            command: command.to_string(),
            source,
        })
    }

    /// Run a registered job from launch to its terminal status.
    ///
    /// If `cancel_rx` fires (or its sender goes away) before the job is done,
    /// the process is terminated, the record is marked `Cancelled` and no
    /// further output is written to it.
    pub async fn run_job(&self, record: SharedRecord, mut cancel_rx: oneshot::Receiver<()>) {
        let (job_id, command) = {
            let rec = record.lock();
            (rec.id().to_string(), rec.command().to_string())
        };

        info!(job = %job_id, cmd = %command, "starting job process");

        let mut child = match self.spawn(&command) {
            Ok(child) => child,
            Err(e) => {
                error!(job = %job_id, error = %e, "failed to launch job process");
                record.lock().fail_spawn(&e.to_string());
                return;
            }
        };

        record.lock().mark_spawned(child.id());
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let exit = tokio::select! {
            res = drain_then_wait(&mut child, stdout, stderr, &record) => res,
            _ = &mut cancel_rx => {
                info!(job = %job_id, "cancellation requested; terminating job process");
                record.lock().set_status(JobStatus::Cancelled);
                terminate(&mut child, self.grace_period, &job_id).await;
                return;
            }
        };

        let exit_code = match exit {
            Ok(status) => status.code(),
            Err(e) => {
                error!(job = %job_id, error = %e, "waiting for job process failed");
                None
            }
        };

        let resolved = {
            let mut rec = record.lock();
            let status = resolve_status(exit_code, rec.stderr_log());
            rec.settle(status);
            status
        };

        match resolved {
            JobStatus::Error => warn!(job = %job_id, ?exit_code, "job process failed"),
            _ => info!(job = %job_id, ?exit_code, status = %resolved, "job process exited"),
        }

        tokio::select! {
            _ = run_post_processing(&record, &self.callbacks) => {}
            _ = &mut cancel_rx => {
                info!(job = %job_id, "cancellation requested during callbacks; abandoning chain");
                let mut rec = record.lock();
                rec.set_callback_cursor(None);
                rec.set_status(JobStatus::Cancelled);
                return;
            }
        }

        let final_status = {
            let mut rec = record.lock();
            rec.mark_completed();
            rec.status()
        };
        info!(job = %job_id, status = %final_status, "job finished");
    }
}

/// Wait for both pipes to close, then reap the process. Waiting before the
/// drains finish could drop output still buffered in the pipes.
async fn drain_then_wait(
    child: &mut Child,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    record: &SharedRecord,
) -> std::io::Result<ExitStatus> {
    drain_both(stdout, stderr, record).await;
    child.wait().await
}

/// Stop a running process: graceful signal first, forced kill once
/// `grace_period` has passed. Failures are logged, never returned.
pub async fn terminate(child: &mut Child, grace_period: Duration, job_id: &str) {
    match child.try_wait() {
        Ok(Some(status)) => {
            debug!(job = %job_id, ?status, "process already exited");
            return;
        }
        Ok(None) => {}
        Err(e) => warn!(job = %job_id, error = %e, "could not query process state"),
    }

    if !signal_graceful(child, job_id) {
        force_kill(child, job_id).await;
        return;
    }

    match timeout(grace_period, child.wait()).await {
        Ok(Ok(status)) => {
            info!(job = %job_id, ?status, "process exited after termination signal");
        }
        Ok(Err(e)) => {
            warn!(job = %job_id, error = %e, "waiting for terminated process failed");
            force_kill(child, job_id).await;
        }
        Err(_) => {
            warn!(
                job = %job_id,
                grace_ms = grace_period.as_millis() as u64,
                "process still running after grace period; killing"
            );
            force_kill(child, job_id).await;
        }
    }
}

#[cfg(unix)]
fn signal_graceful(child: &Child, job_id: &str) -> bool {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return false;
    };

    match killpg(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        Ok(()) => true,
        Err(e) => {
            warn!(job = %job_id, pid, error = %e, "sending SIGTERM failed");
            false
        }
    }
}

#[cfg(not(unix))]
fn signal_graceful(_child: &Child, _job_id: &str) -> bool {
    false
}

async fn force_kill(child: &mut Child, job_id: &str) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            debug!(job = %job_id, pid, error = %e, "SIGKILL to process group failed");
        }
    }

    if let Err(e) = child.kill().await {
        warn!(job = %job_id, error = %e, "failed to kill job process");
    }
}
