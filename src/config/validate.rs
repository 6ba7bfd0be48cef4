// src/config/validate.rs

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::config::model::{BinaryPaths, ConfigFile, RawConfigFile, ShellSpec};
use crate::errors::{ArchivistError, Result};
use crate::types::DuplicatePolicy;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ArchivistError;

    /// Validate a raw config:
    /// - `grace_period` parses and is non-zero
    /// - `duplicate_ids` is a known policy
    /// - `shell`, when given, names a program
    /// - every `[callback.<id>]` has a non-empty `cmd`
    fn try_from(raw: RawConfigFile) -> Result<Self> {
        let grace_period = parse_duration(&raw.config.grace_period).map_err(|e| {
            ArchivistError::ConfigError(format!("invalid [config].grace_period: {e}"))
        })?;
        if grace_period.is_zero() {
            return Err(ArchivistError::ConfigError(
                "[config].grace_period must be greater than zero".to_string(),
            ));
        }

        let duplicate_policy = DuplicatePolicy::from_str(&raw.config.duplicate_ids)
            .map_err(|e| ArchivistError::ConfigError(format!("invalid [config].duplicate_ids: {e}")))?;

        let shell = match raw.config.shell {
            Some(parts) => shell_from_parts(parts)?,
            None => ShellSpec::default(),
        };

        for (id, cb) in raw.callback.iter() {
            if cb.cmd.trim().is_empty() {
                return Err(ArchivistError::ConfigError(format!(
                    "callback '{id}' has an empty `cmd`"
                )));
            }
        }

        let defaults = BinaryPaths::default();
        let binaries = BinaryPaths {
            ytarchive: raw
                .binaries
                .ytarchive
                .map(PathBuf::from)
                .unwrap_or(defaults.ytarchive),
            ytdlp: raw.binaries.ytdlp.map(PathBuf::from).unwrap_or(defaults.ytdlp),
        };

        Ok(ConfigFile {
            grace_period,
            duplicate_policy,
            download_dir: raw.config.download_dir,
            cookie_file: PathBuf::from(
                raw.config
                    .cookie_file
                    .unwrap_or_else(|| "./cookie.txt".to_string()),
            ),
            shell,
            binaries,
            callbacks: raw.callback,
        })
    }
}

fn shell_from_parts(mut parts: Vec<String>) -> Result<ShellSpec> {
    if parts.is_empty() || parts[0].trim().is_empty() {
        return Err(ArchivistError::ConfigError(
            "[config].shell must name a program".to_string(),
        ));
    }
    let program = parts.remove(0);
    Ok(ShellSpec {
        program,
        args: parts,
    })
}

/// Parse a simple duration string like `"5s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;

    let secs_per_unit = match unit_part.trim().to_lowercase().as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        unit => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}
