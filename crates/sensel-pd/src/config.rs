//! Object configuration schema and loader
//!
//! Configuration is stored as YAML. Default location:
//! `<config dir>/sensel-pd/sensel.yaml`. A missing or invalid file falls
//! back to defaults so the object always instantiates.

use crate::decoder::ContactSchema;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Runtime policy knobs
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SenselConfig {
    /// Emit an empty list when a poll cycle sees no contacts.
    /// Off by default: silent downstream, matching the external's later
    /// revisions.
    pub emit_empty_frames: bool,

    /// Outlet list shape (19-value full form vs 18-value legacy form)
    pub schema: ContactSchema,
}

impl Default for SenselConfig {
    fn default() -> Self {
        Self {
            emit_empty_frames: false,
            schema: ContactSchema::Full,
        }
    }
}

/// Default config file path under the user's config directory
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sensel-pd")
        .join("sensel.yaml")
}

fn try_load(path: &Path) -> anyhow::Result<SenselConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {path:?}"))?;
    serde_yaml::from_str(&contents).with_context(|| format!("invalid config file {path:?}"))
}

/// Load configuration from a YAML file
///
/// If the file doesn't exist, returns defaults silently. If it exists but
/// is invalid, logs a warning and returns defaults.
pub fn load_config(path: &Path) -> SenselConfig {
    if !path.exists() {
        log::debug!("load_config: no config at {path:?}, using defaults");
        return SenselConfig::default();
    }

    match try_load(path) {
        Ok(config) => {
            log::info!(
                "load_config: loaded from {:?} (emit_empty_frames={}, schema={:?})",
                path,
                config.emit_empty_frames,
                config.schema
            );
            config
        }
        Err(e) => {
            log::warn!("load_config: {e:#}, using defaults");
            SenselConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SenselConfig::default();
        assert!(!config.emit_empty_frames);
        assert_eq!(config.schema, ContactSchema::Full);
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = "emit_empty_frames: true\nschema: legacy\n";
        let config: SenselConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.emit_empty_frames);
        assert_eq!(config.schema, ContactSchema::Legacy);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let yaml = "emit_empty_frames: true\n";
        let config: SenselConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.emit_empty_frames);
        assert_eq!(config.schema, ContactSchema::Full);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = load_config(Path::new("/nonexistent/sensel.yaml"));
        assert!(!config.emit_empty_frames);
    }
}
