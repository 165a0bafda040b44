// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for the command-line driver.

use plexus_network::PersistError;

/// Error when reading or writing the settings file
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// File I/O failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file is not valid RON
    #[error("RON parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Settings could not be serialized
    #[error("RON serialization error: {0}")]
    Encode(#[from] ron::Error),

    /// Settings were written by a newer version
    #[error("Settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Latest version this build reads
        supported: u32,
    },
}

/// Top-level error of the `plexus` command
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Bad command line
    #[error("{0}")]
    Usage(String),

    /// Settings could not be loaded
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Network could not be loaded or saved
    #[error("Network error: {0}")]
    Persist(#[from] PersistError),
}
