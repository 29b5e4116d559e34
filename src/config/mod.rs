//! Process configuration, read from a single file at startup.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

use crate::{
    cli::LogFormat,
    internal_events::{ConfigLoadError, ConfigLoaded},
    sinks::SinkConfig,
};

pub mod format;

pub use format::Format;

#[derive(Debug, Snafu)]
pub enum LoadError {
    #[snafu(display("could not read {}: {}", path.display(), source))]
    Read { path: PathBuf, source: io::Error },

    #[snafu(display("could not parse {} as {}: {}", path.display(), format, message))]
    Parse {
        path: PathBuf,
        format: Format,
        message: String,
    },
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// Namespace whose events are watched. Empty or absent watches every
    /// namespace.
    pub namespace: Option<String>,

    /// Format of the internal logs, unless overridden on the command line.
    pub log_format: Option<LogFormat>,

    pub sink: SinkConfig,
}

impl Config {
    /// The namespace to watch, `None` for all of them.
    pub fn watched_namespace(&self) -> Option<&str> {
        self.namespace
            .as_deref()
            .map(str::trim)
            .filter(|namespace| !namespace.is_empty())
    }
}

/// Reads the configuration in `path`, guessing its format from the file
/// extension.
pub fn load_from_path(path: &Path) -> Result<Config, LoadError> {
    let result = read(path);
    match &result {
        Ok(_) => emit!(ConfigLoaded { path }),
        Err(error) => emit!(ConfigLoadError { error }),
    }
    result
}

fn read(path: &Path) -> Result<Config, LoadError> {
    let content = fs::read_to_string(path).context(ReadSnafu { path })?;
    let format = Format::detect(path);
    load_from_str(&content, format).map_err(|message| {
        ParseSnafu {
            path,
            format,
            message,
        }
        .build()
    })
}

/// Parses a configuration document.
pub fn load_from_str(content: &str, format: Format) -> Result<Config, String> {
    format.deserialize(content)
}
