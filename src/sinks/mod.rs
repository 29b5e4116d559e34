//! Destinations for enriched events.

use serde::{Deserialize, Serialize};

use crate::event::EnrichedEvent;

pub mod console;

pub use self::console::{ConsoleSink, ConsoleSinkConfig, Target};

/// Receives every enriched event the pipeline forwards.
///
/// Called on the consumer task; the next notification is not processed until
/// `handle` returns. Failures are the handler's own to report.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: EnrichedEvent);
}

impl<F> EventHandler for F
where
    F: Fn(EnrichedEvent) + Send + Sync,
{
    fn handle(&self, event: EnrichedEvent) {
        self(event)
    }
}

/// Configures the sink enriched events are handed to.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkConfig {
    Console(ConsoleSinkConfig),
}

impl Default for SinkConfig {
    fn default() -> Self {
        SinkConfig::Console(ConsoleSinkConfig::default())
    }
}

impl SinkConfig {
    pub const fn sink_type(&self) -> &'static str {
        match self {
            SinkConfig::Console(_) => "console",
        }
    }
}

/// Builds the handler described by `config`.
pub fn build(config: &SinkConfig) -> Box<dyn EventHandler> {
    debug!(message = "Building sink.", sink_type = config.sink_type());
    match config {
        SinkConfig::Console(config) => Box::new(ConsoleSink::new(config)),
    }
}
