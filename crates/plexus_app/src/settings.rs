// SPDX-License-Identifier: MIT OR Apache-2.0
//! Application settings.
//!
//! Read from a RON file next to the working directory (`plexus.ron` unless
//! `--config` says otherwise). Every field has a default, so a partial file
//! or no file at all is fine.

use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Default settings file name
pub const SETTINGS_FILE_NAME: &str = "plexus.ron";

/// Default `tracing` filter directive when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "plexus=info,plexus_network=info";

/// Settings for the `plexus` command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Format version
    pub version: u32,
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub log_filter: String,
    /// Network file to load when none is given on the command line
    pub network: Option<PathBuf>,
    /// Where to write the network after loading
    pub output: Option<PathBuf>,
    /// Raise every loaded processor to `InvalidResample`
    pub invalidate_all_on_load: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            network: None,
            output: None,
            invalidate_all_on_load: false,
        }
    }
}

impl AppSettings {
    /// Load settings from file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        let settings: AppSettings = ron::from_str(&content)?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }

        Ok(settings)
    }

    /// Load settings, or the defaults if the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save settings to file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);

        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
