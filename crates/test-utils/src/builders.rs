#![allow(dead_code)]

use archivist::config::{CallbackConfig, ConfigFile, Placement, RawConfigFile};
use archivist::engine::JobRequest;
use archivist::types::BinaryKind;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Goes through the same validation as a real config file but never reads
/// the environment.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn grace_period(mut self, value: &str) -> Self {
        self.config.config.grace_period = value.to_string();
        self
    }

    pub fn duplicate_ids(mut self, value: &str) -> Self {
        self.config.config.duplicate_ids = value.to_string();
        self
    }

    pub fn download_dir(mut self, dir: &str) -> Self {
        self.config.config.download_dir = dir.to_string();
        self
    }

    pub fn cookie_file(mut self, path: &str) -> Self {
        self.config.config.cookie_file = Some(path.to_string());
        self
    }

    pub fn shell(mut self, argv: &[&str]) -> Self {
        self.config.config.shell = Some(argv.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn ytarchive(mut self, path: &str) -> Self {
        self.config.binaries.ytarchive = Some(path.to_string());
        self
    }

    pub fn ytdlp(mut self, path: &str) -> Self {
        self.config.binaries.ytdlp = Some(path.to_string());
        self
    }

    pub fn with_callback(mut self, id: &str, cmd: &str, placement: Placement) -> Self {
        self.config.callback.insert(
            id.to_string(),
            CallbackConfig {
                cmd: cmd.to_string(),
                placement,
                label: None,
            },
        );
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobRequest`. Defaults to a yt-dlp job with no callbacks.
pub struct JobRequestBuilder {
    request: JobRequest,
}

impl JobRequestBuilder {
    pub fn new(base_id: &str, command: &str) -> Self {
        Self {
            request: JobRequest {
                base_id: base_id.to_string(),
                binary: BinaryKind::Ytdlp,
                command: command.to_string(),
                callbacks: vec![],
            },
        }
    }

    pub fn binary(mut self, kind: BinaryKind) -> Self {
        self.request.binary = kind;
        self
    }

    pub fn callback(mut self, id: &str) -> Self {
        self.request.callbacks.push(id.to_string());
        self
    }

    pub fn build(self) -> JobRequest {
        self.request
    }
}
