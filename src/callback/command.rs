// src/callback/command.rs

use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{anyhow, Context};
use tracing::debug;

use crate::callback::{Callback, CallbackFuture, SpliceResult, TextBlock};
use crate::command_line::shell_quote;
use crate::config::{CallbackConfig, Placement, ShellSpec};
use crate::exec::shell_command;

/// Callback that runs a shell command against the finished file.
///
/// `{file}` in the template is replaced by the single-quoted path. The
/// command's stdout and stderr become one block under `label`.
#[derive(Debug, Clone)]
pub struct CommandCallback {
    id: String,
    label: String,
    template: String,
    placement: Placement,
    shell: ShellSpec,
}

impl CommandCallback {
    pub fn new(
        id: impl Into<String>,
        template: impl Into<String>,
        placement: Placement,
        shell: ShellSpec,
    ) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            template: template.into(),
            placement,
            shell,
        }
    }

    pub fn from_config(id: &str, cfg: &CallbackConfig, shell: ShellSpec) -> Self {
        let mut cb = Self::new(id, cfg.cmd.clone(), cfg.placement, shell);
        if let Some(label) = &cfg.label {
            cb.label = label.clone();
        }
        cb
    }

    /// The command line that would run for `path`.
    pub fn render(&self, path: &std::path::Path) -> String {
        self.template
            .replace("{file}", &shell_quote(&path.to_string_lossy()))
    }
}

impl Callback for CommandCallback {
    fn invoke(&self, path: PathBuf) -> CallbackFuture<'_> {
        Box::pin(async move {
            let line = self.render(&path);
            debug!(callback = %self.id, cmd = %line, "running callback command");

            let output = shell_command(&self.shell, &line)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output()
                .await
                .with_context(|| format!("running callback '{}'", self.id))?;

            let out = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
            let err = String::from_utf8_lossy(&output.stderr).trim_end().to_string();

            if !output.status.success() {
                return Err(anyhow!(
                    "callback '{}' exited with {}: {}",
                    self.id,
                    output
                        .status
                        .code()
                        .map_or_else(|| "a signal".to_string(), |c| format!("code {c}")),
                    err
                ));
            }

            let block = TextBlock::new(out, err);
            Ok(match self.placement {
                Placement::Front => SpliceResult::new().with_front(self.label.clone(), block),
                Placement::End => SpliceResult::new().with_end(self.label.clone(), block),
            })
        })
    }
}
