//! Events as they are handed to the sink.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Event, ObjectReference};
use serde::{Serialize, Serializer, ser::Error as _};
use serde_json::Value;

use crate::watermark;

/// A [`Event`] together with the metadata of its involved object.
///
/// Built from a deep copy of the watched record, so the handler owns
/// everything it receives.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnrichedEvent {
    pub event: Event,
    /// Copy of the involved object reference, set when at least one of the
    /// metadata lookups succeeded.
    pub involved_object: Option<ObjectReference>,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
}

impl EnrichedEvent {
    pub fn new(raw: &Event) -> Self {
        Self {
            event: raw.clone(),
            ..Self::default()
        }
    }

    pub fn count(&self) -> i64 {
        watermark::count(&self.event)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.event.metadata.namespace.as_deref()
    }

    pub fn reason(&self) -> Option<&str> {
        self.event.reason.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.event.message.as_deref()
    }
}

impl Serialize for EnrichedEvent {
    /// Serializes as the event document, with `involvedObject` extended by
    /// the `labels` and `annotations` of the object.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut document = serde_json::to_value(&self.event).map_err(S::Error::custom)?;

        let reference = self
            .involved_object
            .as_ref()
            .unwrap_or(&self.event.involved_object);
        let mut involved_object = serde_json::to_value(reference).map_err(S::Error::custom)?;
        if let Value::Object(fields) = &mut involved_object {
            for (key, metadata) in [("labels", &self.labels), ("annotations", &self.annotations)] {
                if !metadata.is_empty() {
                    let metadata = serde_json::to_value(metadata).map_err(S::Error::custom)?;
                    fields.insert(key.to_owned(), metadata);
                }
            }
        }

        if let Value::Object(fields) = &mut document {
            fields.insert("involvedObject".to_owned(), involved_object);
        }
        document.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use similar_asserts::assert_eq;

    use super::*;
    use crate::test_util::raw_event;

    #[test]
    fn new_copies_raw_event() {
        let raw = raw_event("ev", 4);
        let enriched = EnrichedEvent::new(&raw);

        assert_eq!(enriched.event, raw);
        assert_eq!(enriched.count(), 4);
        assert_eq!(enriched.namespace(), Some("default"));
        assert_eq!(enriched.reason(), Some("BackOff"));
        assert_eq!(enriched.involved_object, None);
        assert!(enriched.labels.is_empty());
    }

    #[test]
    fn serializes_metadata_into_involved_object() {
        let raw = raw_event("ev", 2);
        let mut enriched = EnrichedEvent::new(&raw);
        enriched.involved_object = Some(raw.involved_object.clone());
        enriched.labels.insert("app".to_owned(), "x".to_owned());

        let value = serde_json::to_value(&enriched).unwrap();

        assert_eq!(
            value["involvedObject"],
            json!({
                "apiVersion": "v1",
                "kind": "Pod",
                "namespace": "default",
                "name": "x",
                "uid": "uid-x",
                "labels": {"app": "x"},
            })
        );
        assert_eq!(value["reason"], json!("BackOff"));
        assert_eq!(value["count"], json!(2));
    }

    #[test]
    fn serializes_without_metadata() {
        let raw = raw_event("ev", 1);
        let value = serde_json::to_value(EnrichedEvent::new(&raw)).unwrap();

        assert_eq!(
            value["involvedObject"],
            serde_json::to_value(&raw.involved_object).unwrap()
        );
    }
}
