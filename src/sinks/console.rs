use std::{
    io::{self, Write},
    sync::{Mutex, PoisonError},
};

use serde::{Deserialize, Serialize};

use super::EventHandler;
use crate::{
    event::EnrichedEvent,
    internal_events::{ConsoleEncodeError, ConsoleEventProcessed, ConsoleWriteError},
};

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    #[default]
    Stdout,
    Stderr,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConsoleSinkConfig {
    #[serde(default)]
    pub target: Target,

    /// Indent the JSON output instead of writing one line per event.
    #[serde(default)]
    pub pretty: bool,
}

/// Writes every event as JSON to the standard output or error stream.
pub struct ConsoleSink {
    output: Mutex<Box<dyn Write + Send>>,
    pretty: bool,
}

impl ConsoleSink {
    pub fn new(config: &ConsoleSinkConfig) -> Self {
        let output: Box<dyn Write + Send> = match config.target {
            Target::Stdout => Box::new(io::stdout()),
            Target::Stderr => Box::new(io::stderr()),
        };
        Self::with_writer(output, config.pretty)
    }

    pub fn with_writer(output: Box<dyn Write + Send>, pretty: bool) -> Self {
        Self {
            output: Mutex::new(output),
            pretty,
        }
    }

    fn encode(&self, event: &EnrichedEvent) -> Result<String, serde_json::Error> {
        if self.pretty {
            serde_json::to_string_pretty(event)
        } else {
            serde_json::to_string(event)
        }
    }
}

impl EventHandler for ConsoleSink {
    fn handle(&self, event: EnrichedEvent) {
        let mut buf = match self.encode(&event) {
            Ok(buf) => buf,
            Err(error) => {
                emit!(ConsoleEncodeError { error: &error });
                return;
            }
        };
        buf.push('\n');

        let mut output = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        match output.write_all(buf.as_bytes()).and_then(|()| output.flush()) {
            Ok(()) => emit!(ConsoleEventProcessed {
                byte_size: buf.len(),
            }),
            // Losing the output stream is not a reason to stop watching.
            Err(error) => emit!(ConsoleWriteError { error: &error }),
        }
    }
}
