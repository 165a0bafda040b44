// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command-line arguments.

use crate::error::AppError;
use crate::settings::SETTINGS_FILE_NAME;
use std::path::PathBuf;

/// Usage text
pub const USAGE: &str = "\
Usage: plexus [OPTIONS] [NETWORK]

Loads a processor network, reports its state and optionally saves it.
Without a network, lists the registered processor types.

Options:
  -c, --config <PATH>   Settings file (default: plexus.ron)
  -o, --output <PATH>   Save the loaded network here (.ron, .plexus or .json)
  -h, --help            Print this help";

/// Parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    /// Settings file
    pub config: PathBuf,
    /// Network to load, overriding the settings
    pub network: Option<PathBuf>,
    /// Output path, overriding the settings
    pub output: Option<PathBuf>,
    /// Print usage and exit
    pub help: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            config: PathBuf::from(SETTINGS_FILE_NAME),
            network: None,
            output: None,
            help: false,
        }
    }
}

impl Args {
    /// Parse arguments, excluding the program name
    pub fn parse<I>(args: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => parsed.help = true,
                "-c" | "--config" => parsed.config = value_of(&arg, args.next())?,
                "-o" | "--output" => parsed.output = Some(value_of(&arg, args.next())?),
                flag if flag.starts_with('-') => {
                    return Err(AppError::Usage(format!("Unknown option '{flag}'")));
                }
                _ if parsed.network.is_some() => {
                    return Err(AppError::Usage(format!("Unexpected argument '{arg}'")));
                }
                _ => parsed.network = Some(PathBuf::from(arg)),
            }
        }

        Ok(parsed)
    }
}

fn value_of(flag: &str, value: Option<String>) -> Result<PathBuf, AppError> {
    value
        .map(PathBuf::from)
        .ok_or_else(|| AppError::Usage(format!("Missing value for '{flag}'")))
}
