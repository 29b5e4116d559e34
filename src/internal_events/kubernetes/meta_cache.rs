use metrics::counter;

use crate::internal_events::InternalEvent;
use crate::kubernetes::{MetadataField, ObjectKey};

#[derive(Debug)]
pub struct MetadataCacheHit {
    pub field: MetadataField,
}

impl InternalEvent for MetadataCacheHit {
    fn emit(self) {
        counter!("k8s_metadata_cache_hits_total", "field" => self.field.as_str()).increment(1);
    }
}

/// Emitted when the cache has to go to the cluster for an object.
#[derive(Debug)]
pub struct MetadataCacheMiss<'a> {
    pub field: MetadataField,
    pub key: &'a ObjectKey,
}

impl InternalEvent for MetadataCacheMiss<'_> {
    fn emit(self) {
        trace!(message = "Fetching metadata.", field = %self.field, object = %self.key);
        counter!("k8s_metadata_cache_misses_total", "field" => self.field.as_str()).increment(1);
    }
}

/// Emitted when a caller joins a fetch that is already in flight.
#[derive(Debug)]
pub struct MetadataFetchJoined<'a> {
    pub field: MetadataField,
    pub key: &'a ObjectKey,
}

impl InternalEvent for MetadataFetchJoined<'_> {
    fn emit(self) {
        trace!(message = "Waiting on in-flight metadata fetch.", field = %self.field, object = %self.key);
        counter!("k8s_metadata_fetches_joined_total", "field" => self.field.as_str()).increment(1);
    }
}
