use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::get_version;

#[derive(Parser, Debug)]
#[command(name = "kube-event-exporter", rename_all = "kebab-case")]
pub struct Opts {
    /// Read configuration from this file. The format is detected from the
    /// file name, YAML is assumed when it cannot be.
    ///
    /// Without a configuration file every namespace is watched and events
    /// are written to stdout.
    #[arg(short, long, env = "EXPORTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable more detailed internal logging. Repeat to increase level. Overridden by `--quiet`.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Reduce detail of internal logging. Repeat to reduce further. Overrides `--verbose`.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Set the logging format. Takes precedence over the configuration file.
    #[arg(long, env = "EXPORTER_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Control when ANSI terminal formatting is used.
    ///
    /// By default ANSI is enabled when stdout is a terminal. `--color always`
    /// forces it on, `--color never` forces it off.
    #[arg(long, default_value = "auto", env = "EXPORTER_COLOR")]
    pub color: Color,
}

impl Opts {
    pub fn get_matches() -> Result<Self, clap::Error> {
        use clap::{CommandFactory, FromArgMatches};

        let version = get_version();
        let matches = Opts::command().version(version).try_get_matches()?;
        Opts::from_arg_matches(&matches)
    }

    /// The log filter, from `EXPORTER_LOG` when set or from the verbosity
    /// flags otherwise.
    pub fn log_level(&self) -> String {
        std::env::var("EXPORTER_LOG").unwrap_or_else(|_| {
            format!(
                "kube_event_exporter={level},kube={level}",
                level = self.verbosity()
            )
        })
    }

    pub const fn verbosity(&self) -> &'static str {
        match self.quiet {
            0 => match self.verbose {
                0 => "info",
                1 => "debug",
                2..=255 => "trace",
            },
            1 => "warn",
            2 => "error",
            3..=255 => "off",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Color {
    Auto,
    Always,
    Never,
}

impl Color {
    pub fn use_color(self) -> bool {
        match self {
            Color::Auto => {
                use std::io::IsTerminal;
                std::io::stdout().is_terminal()
            }
            Color::Always => true,
            Color::Never => false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}
