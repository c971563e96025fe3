//! Configuration schema and persistence for oscbridge.
//!
//! The config file is JSON, rewritten wholesale on every mutating command.
//! Absent fields take their defaults, so hand-edited or older files stay
//! loadable. Last-execution bookkeeping is persisted; live match counts and
//! receipt timestamps are not.

use std::{fs, io, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod defaults;

pub use defaults::{DEFAULT_FILTERS, DefaultFilter};

/// Default minimum match-count delta between action executions.
pub const DEFAULT_RATE_LIMIT_COUNT: u32 = 2;
/// Default minimum seconds between action executions.
pub const DEFAULT_RATE_LIMIT_SECONDS: u32 = 1;

/// File name used when no explicit config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Error type for config persistence.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading or writing the file failed.
    #[error("config file {path}: {source}")]
    Io {
        /// Path of the file involved.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The file contents are not valid JSON for the schema.
    #[error("config file {path}: {source}")]
    Parse {
        /// Path of the file involved.
        path: String,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

/// One persisted filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterEntry {
    /// Match pattern (substring containment against inbound messages).
    pub pattern: String,
    /// Whether the filter participates in matching.
    pub enabled: bool,
    /// Whether a match may dispatch the action.
    pub trigger_action: bool,
    /// Action string; empty means none.
    pub action: String,
    /// Match count at the last action execution.
    pub last_execution_count: u64,
    /// Unix seconds of the last action execution; 0 means never.
    pub last_execution_time: u64,
    /// Per-filter minimum match-count delta.
    pub rate_limit_count: u32,
    /// Per-filter minimum seconds between executions.
    pub rate_limit_seconds: u32,
}

impl Default for FilterEntry {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            enabled: true,
            trigger_action: false,
            action: String::new(),
            last_execution_count: 0,
            last_execution_time: 0,
            rate_limit_count: DEFAULT_RATE_LIMIT_COUNT,
            rate_limit_seconds: DEFAULT_RATE_LIMIT_SECONDS,
        }
    }
}

/// The whole config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigFile {
    /// Whether per-message logging is enabled.
    pub message_printing_enabled: bool,
    /// Default rate-limit count applied to newly added filters.
    pub rate_limit_count: u32,
    /// Default rate-limit seconds applied to newly added filters.
    pub rate_limit_seconds: u32,
    /// The filter set.
    pub filters: Vec<FilterEntry>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            message_printing_enabled: false,
            rate_limit_count: DEFAULT_RATE_LIMIT_COUNT,
            rate_limit_seconds: DEFAULT_RATE_LIMIT_SECONDS,
            filters: Vec::new(),
        }
    }
}

/// Load the config from `path`. Returns `Ok(None)` when the file does not
/// exist (first run).
pub fn load(path: &Path) -> Result<Option<ConfigFile>, Error> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(Error::Io {
                path: path.display().to_string(),
                source: e,
            });
        }
    };
    let cfg = serde_json::from_str(&raw).map_err(|e| Error::Parse {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(Some(cfg))
}

/// Write the config to `path`, replacing any existing file.
pub fn save(path: &Path, cfg: &ConfigFile) -> Result<(), Error> {
    let mut raw = serde_json::to_string_pretty(cfg).map_err(|e| Error::Parse {
        path: path.display().to_string(),
        source: e,
    })?;
    raw.push('\n');
    fs::write(path, raw).map_err(|e| Error::Io {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_take_defaults() {
        let cfg: ConfigFile = serde_json::from_str(r#"{"filters":[{"pattern":"foo"}]}"#)
            .expect("parse");
        assert!(!cfg.message_printing_enabled);
        assert_eq!(cfg.rate_limit_count, DEFAULT_RATE_LIMIT_COUNT);
        assert_eq!(cfg.rate_limit_seconds, DEFAULT_RATE_LIMIT_SECONDS);
        let f = &cfg.filters[0];
        assert_eq!(f.pattern, "foo");
        assert!(f.enabled);
        assert!(!f.trigger_action);
        assert_eq!(f.last_execution_time, 0);
        assert_eq!(f.rate_limit_count, DEFAULT_RATE_LIMIT_COUNT);
    }

    #[test]
    fn field_names_are_camel_case() {
        let mut cfg = ConfigFile::default();
        cfg.filters.push(FilterEntry {
            pattern: "/avatar/parameters/MediaPlay".to_string(),
            action: "@media-play".to_string(),
            trigger_action: true,
            ..FilterEntry::default()
        });
        let raw = serde_json::to_string(&cfg).expect("serialize");
        for field in [
            "messagePrintingEnabled",
            "rateLimitCount",
            "rateLimitSeconds",
            "triggerAction",
            "lastExecutionCount",
            "lastExecutionTime",
        ] {
            assert!(raw.contains(field), "missing {field} in {raw}");
        }
    }

    #[test]
    fn file_round_trip() {
        let mut cfg = ConfigFile::default();
        cfg.message_printing_enabled = true;
        cfg.filters.push(FilterEntry {
            pattern: "foo".to_string(),
            action: "@key:a".to_string(),
            trigger_action: true,
            rate_limit_count: 1,
            rate_limit_seconds: 0,
            ..FilterEntry::default()
        });

        let path = std::env::temp_dir().join(format!(
            "oscbridge-config-test-{}.json",
            std::process::id()
        ));
        save(&path, &cfg).expect("save");
        let loaded = load(&path).expect("load").expect("present");
        assert_eq!(loaded, cfg);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_is_none() {
        let path = Path::new("/nonexistent/oscbridge/config.json");
        assert!(load(path).expect("load").is_none());
    }
}
