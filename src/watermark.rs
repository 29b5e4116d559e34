//! Source-side de-duplication.
//!
//! The highest occurrence count already forwarded for an event is stored as an
//! annotation on the event record itself. Nothing is kept in process memory,
//! so the gate picks up where it left off after a restart.

use std::num::ParseIntError;

use k8s_openapi::api::core::v1::Event;
use serde_json::json;
use snafu::{ResultExt, Snafu, ensure};

use crate::internal_events::{KubernetesEventDeduplicated, WatermarkParseError};

/// Annotation holding the watermark of an event record.
pub const ANNOTATION_KEY: &str = "event-exporter.wandera.com/last-count";

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum ParseError {
    #[snafu(display("watermark is not an integer: {}", source))]
    NotAnInteger { source: ParseIntError },

    #[snafu(display("watermark is negative: {}", value))]
    Negative { value: i64 },
}

/// De-duplication state of a single event record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Nothing was forwarded for this record yet.
    Unseen,
    /// Occurrences up to and including this count were forwarded.
    Seen(i64),
}

/// What to do with a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Forward,
    Discard { watermark: i64 },
}

impl State {
    /// Reads the state persisted on `event`.
    ///
    /// A malformed watermark is reported and treated as absent: re-forwarding
    /// an occurrence is preferable to dropping a new one.
    pub fn of(event: &Event) -> Self {
        let Some(value) = event
            .metadata
            .annotations
            .as_ref()
            .and_then(|annotations| annotations.get(ANNOTATION_KEY))
        else {
            return State::Unseen;
        };

        match parse(value) {
            Ok(watermark) => State::Seen(watermark),
            Err(error) => {
                emit!(WatermarkParseError {
                    value,
                    error: &error,
                });
                State::Unseen
            }
        }
    }

    /// Decides on a notification carrying `count`.
    ///
    /// A count equal to the watermark is a duplicate.
    pub const fn decide(self, count: i64) -> Decision {
        match self {
            State::Seen(watermark) if watermark >= count => Decision::Discard { watermark },
            State::Unseen | State::Seen(_) => Decision::Forward,
        }
    }

    /// The state after `count` was forwarded.
    pub const fn advance(self, count: i64) -> Self {
        match self.decide(count) {
            Decision::Forward => State::Seen(count),
            Decision::Discard { .. } => self,
        }
    }
}

/// Decides whether `event` carries an occurrence that was not forwarded yet.
pub fn should_process(event: &Event) -> bool {
    let count = count(event);
    match State::of(event).decide(count) {
        Decision::Forward => true,
        Decision::Discard { watermark } => {
            emit!(KubernetesEventDeduplicated { count, watermark });
            false
        }
    }
}

/// The occurrence count of `event`, zero when the producer left it unset.
pub fn count(event: &Event) -> i64 {
    event.count.map(i64::from).unwrap_or_default()
}

/// Parses a persisted watermark.
pub fn parse(value: &str) -> Result<i64, ParseError> {
    let watermark = value.parse::<i64>().context(NotAnIntegerSnafu)?;
    ensure!(watermark >= 0, NegativeSnafu { value: watermark });
    Ok(watermark)
}

/// The JSON merge patch that stores `count` as the watermark.
pub fn merge_patch(count: i64) -> serde_json::Value {
    json!({
        "metadata": {
            "annotations": {
                ANNOTATION_KEY: count.to_string(),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{raw_event, with_watermark};

    fn annotated(count: i32, watermark: &str) -> Event {
        with_watermark(raw_event("ev", count), watermark)
    }

    #[test]
    fn parse_watermark() {
        assert_eq!(parse("0"), Ok(0));
        assert_eq!(parse("42"), Ok(42));
        assert!(matches!(parse("-1"), Err(ParseError::Negative { value: -1 })));
        assert!(matches!(parse(""), Err(ParseError::NotAnInteger { .. })));
        assert!(matches!(parse("4 2"), Err(ParseError::NotAnInteger { .. })));
        assert!(matches!(parse("abc"), Err(ParseError::NotAnInteger { .. })));
    }

    #[test]
    fn state_of_event() {
        assert_eq!(State::of(&raw_event("ev", 3)), State::Unseen);
        assert_eq!(State::of(&annotated(3, "2")), State::Seen(2));
        assert_eq!(State::of(&annotated(3, "garbage")), State::Unseen);
        assert_eq!(State::of(&annotated(3, "-5")), State::Unseen);
    }

    #[test]
    fn decide() {
        let cases = vec![
            (State::Unseen, 0, Decision::Forward),
            (State::Unseen, 7, Decision::Forward),
            (State::Seen(1), 2, Decision::Forward),
            (State::Seen(1), 1, Decision::Discard { watermark: 1 }),
            (State::Seen(3), 2, Decision::Discard { watermark: 3 }),
            (State::Seen(0), 0, Decision::Discard { watermark: 0 }),
        ];

        for (state, count, expected) in cases {
            assert_eq!(state.decide(count), expected, "{:?} with count {}", state, count);
        }
    }

    #[test]
    fn repeated_occurrences() {
        // count 1, duplicate 1, 3, then a stale 2.
        let mut state = State::Unseen;
        let mut forwarded = Vec::new();
        for count in [1, 1, 3, 2] {
            if state.decide(count) == Decision::Forward {
                forwarded.push(count);
            }
            state = state.advance(count);
        }

        assert_eq!(forwarded, vec![1, 3]);
        assert_eq!(state, State::Seen(3));
    }

    #[test]
    fn should_process_event() {
        assert!(should_process(&raw_event("ev", 1)));
        assert!(should_process(&annotated(2, "1")));
        assert!(!should_process(&annotated(1, "1")));
        assert!(!should_process(&annotated(1, "3")));
        assert!(should_process(&annotated(1, "not-a-number")));
    }

    #[test]
    fn missing_count_is_zero() {
        let mut event = raw_event("ev", 0);
        event.count = None;
        assert_eq!(count(&event), 0);
        assert!(should_process(&event));
    }

    #[test]
    fn merge_patch_shape() {
        assert_eq!(
            merge_patch(3),
            json!({"metadata": {"annotations": {"event-exporter.wandera.com/last-count": "3"}}})
        );
    }
}
