#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]

//! Watches Kubernetes events and forwards every new occurrence, enriched with
//! the labels and annotations of the involved object, to a sink.

#[macro_use]
extern crate tracing;

#[macro_use]
pub mod internal_events;

pub mod cli;
pub mod config;
pub mod event;
pub mod kubernetes;
pub mod pipeline;
pub mod shutdown;
pub mod signal;
pub mod sinks;
#[cfg(test)]
pub mod test_util;
pub mod trace;
pub mod watermark;

pub use event::EnrichedEvent;
pub use pipeline::EventPipeline;

/// The basic error type, dynamically dispatched and safe to send across
/// threads.
pub type Error = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The basic result type, defined in terms of [`Error`] and generic over `T`.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the package version, as reported by `--version`.
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_owned()
}
