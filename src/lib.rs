// src/lib.rs

pub mod callback;
pub mod cli;
pub mod command_line;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod job;
pub mod logging;
pub mod registry;
pub mod types;

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use tracing::{debug, info, warn};

use crate::callback::CallbackRegistry;
use crate::cli::CliArgs;
use crate::command_line::{build_command, video_url, ParamValue};
use crate::config::{default_config_path, defaults_from_env, load_and_validate, ConfigFile};
use crate::engine::{JobRequest, JobService};
use crate::job::JobStatusView;
use crate::types::{BinaryKind, JobStatus};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and the callback registry
/// - one job per requested video id
/// - the polling loop that reports progress until every job has finished
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let callbacks = CallbackRegistry::from_config(&cfg);

    if args.list_callbacks {
        for id in callbacks.ids() {
            println!("{id}");
        }
        return Ok(());
    }

    let binary = BinaryKind::from(args.binary);
    let params: BTreeMap<String, ParamValue> = args.params.iter().cloned().collect();
    let commands: Vec<(String, String)> = args
        .video_ids
        .iter()
        .map(|vid| {
            let cmd = build_command(&cfg, binary, &video_url(vid), &args.quality, &params);
            (vid.clone(), cmd)
        })
        .collect();

    if args.dry_run {
        for (vid, cmd) in &commands {
            println!("{vid}: {cmd}");
        }
        return Ok(());
    }

    let service = JobService::new(&cfg, callbacks);

    let mut ids = Vec::with_capacity(commands.len());
    for (vid, command) in commands {
        let request = JobRequest {
            base_id: vid,
            binary,
            command,
            callbacks: args.callbacks.clone(),
        };
        ids.push(service.create_job(request)?);
    }
    info!(jobs = ?ids, "jobs started");

    let interval = Duration::from_millis(args.poll_interval.max(1));
    let finals = tokio::select! {
        finals = watch_jobs(&service, interval) => finals,
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                warn!(error = %e, "failed to listen for Ctrl+C");
            }
            info!("Ctrl-C received; cancelling all jobs");
            service.shutdown().await;
            bail!("interrupted");
        }
    };

    print_finals(&finals, args.json)?;

    let failed: Vec<&String> = finals
        .iter()
        .filter(|(_, view)| view.status == JobStatus::Error)
        .map(|(id, _)| id)
        .collect();

    service.shutdown().await;

    if !failed.is_empty() {
        bail!("{} job(s) failed: {:?}", failed.len(), failed);
    }
    Ok(())
}

fn load_config(path: Option<&str>) -> Result<ConfigFile> {
    let cfg = match path {
        Some(p) => load_and_validate(PathBuf::from(p))?,
        None => {
            let default_path = default_config_path();
            if default_path.exists() {
                load_and_validate(&default_path)?
            } else {
                debug!("no config file found; using built-in defaults");
                defaults_from_env()?
            }
        }
    };
    Ok(cfg)
}

/// Poll until every job reports `completed`, printing the newest line of
/// each job whenever it changes.
async fn watch_jobs(service: &JobService, interval: Duration) -> BTreeMap<String, JobStatusView> {
    let mut ticker = tokio::time::interval(interval);
    let mut last_seen: HashMap<String, (JobStatus, String)> = HashMap::new();

    loop {
        ticker.tick().await;
        let snapshot = service.poll();

        for (id, view) in &snapshot {
            let tail = view.output.lines().last().unwrap_or_default().to_string();
            let current = (view.status, tail);
            if last_seen.get(id) != Some(&current) {
                println!("[{id}] {}: {}", current.0, current.1);
                last_seen.insert(id.clone(), current);
            }
        }

        if !snapshot.is_empty() && snapshot.values().all(|v| v.completed) {
            return snapshot;
        }
    }
}

fn print_finals(finals: &BTreeMap<String, JobStatusView>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(finals)?);
        return Ok(());
    }

    for (id, view) in finals {
        println!("== {id} ({}) ==", view.status);
        println!("{}", view.output);
        if let Some(err) = &view.error {
            println!("-- stderr --");
            println!("{err}");
        }
    }
    Ok(())
}
