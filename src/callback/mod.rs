// src/callback/mod.rs

//! Post-processing callbacks.
//!
//! A callback receives the path of the file a job produced and hands back
//! named text blocks that get spliced around the job's final log. The engine
//! never looks at what a callback does; it only needs the [`Callback`]
//! capability.
//!
//! - [`chain`] runs a job's requested callbacks one after another.
//! - [`command`] is the config-driven implementation that runs a shell
//!   command against the file.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::ConfigFile;

pub mod chain;
pub mod command;

pub use chain::{failure_block, run_post_processing, splice, CallbackChain};
pub use command::CommandCallback;

/// One named block of callback output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBlock {
    pub out: String,
    pub err: String,
}

impl TextBlock {
    pub fn new(out: impl Into<String>, err: impl Into<String>) -> Self {
        Self {
            out: out.into(),
            err: err.into(),
        }
    }
}

/// What a callback wants spliced into the log.
///
/// Both sides keep insertion order; each entry is `(display key, block)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpliceResult {
    pub front: Vec<(String, TextBlock)>,
    pub end: Vec<(String, TextBlock)>,
}

impl SpliceResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_front(mut self, key: impl Into<String>, block: TextBlock) -> Self {
        self.front.push((key.into(), block));
        self
    }

    pub fn with_end(mut self, key: impl Into<String>, block: TextBlock) -> Self {
        self.end.push((key.into(), block));
        self
    }
}

pub type CallbackFuture<'a> =
    Pin<Box<dyn Future<Output = anyhow::Result<SpliceResult>> + Send + 'a>>;

/// Capability implemented by every post-processing callback.
pub trait Callback: Send + Sync {
    fn invoke(&self, path: PathBuf) -> CallbackFuture<'_>;
}

/// Callbacks available to jobs, looked up by id.
#[derive(Clone, Default)]
pub struct CallbackRegistry {
    callbacks: BTreeMap<String, Arc<dyn Callback>>,
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("ids", &self.callbacks.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One [`CommandCallback`] per `[callback.<id>]` section.
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let mut registry = Self::new();
        for (id, cb_cfg) in cfg.callbacks.iter() {
            registry.insert(
                id.clone(),
                Arc::new(CommandCallback::from_config(id, cb_cfg, cfg.shell.clone())),
            );
        }
        registry
    }

    pub fn insert(&mut self, id: impl Into<String>, callback: Arc<dyn Callback>) {
        self.callbacks.insert(id.into(), callback);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Callback>> {
        self.callbacks.get(id).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        self.callbacks.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}
