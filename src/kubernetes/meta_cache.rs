//! Memoized metadata of involved objects.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use super::{FetchError, MetadataFetcher, ObjectKey};
use crate::internal_events::kubernetes::meta_cache::{
    MetadataCacheHit, MetadataCacheMiss, MetadataFetchJoined,
};

/// A labels or annotations mapping, shared between the cache and its callers.
pub type Metadata = Arc<BTreeMap<String, String>>;

/// The error of a fetch, shared by every caller that waited on it.
pub type SharedFetchError = Arc<FetchError>;

type SharedFetch = Shared<BoxFuture<'static, Result<Metadata, SharedFetchError>>>;

/// Which part of the object metadata a cache holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetadataField {
    Labels,
    Annotations,
}

impl MetadataField {
    pub const fn as_str(self) -> &'static str {
        match self {
            MetadataField::Labels => "labels",
            MetadataField::Annotations => "annotations",
        }
    }

    fn extract(self, metadata: ObjectMeta) -> BTreeMap<String, String> {
        match self {
            MetadataField::Labels => metadata.labels,
            MetadataField::Annotations => metadata.annotations,
        }
        .unwrap_or_default()
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

enum Entry {
    Ready(Metadata),
    Pending { id: u64, fetch: SharedFetch },
}

/// Caches one metadata field of involved objects for the process lifetime.
///
/// Lookups for the same [`ObjectKey`] are collapsed: while a fetch is in
/// flight, every other caller for that key awaits the same fetch and gets the
/// same result. Lookups for different keys never wait on each other, the map
/// lock is only held for bookkeeping.
///
/// Successful fetches are kept forever. Failed fetches are not kept, the next
/// lookup for the key fetches again.
pub struct MetadataCache {
    field: MetadataField,
    fetcher: Arc<dyn MetadataFetcher>,
    entries: Mutex<HashMap<ObjectKey, Entry>>,
    next_id: AtomicU64,
}

impl MetadataCache {
    /// Create a new [`MetadataCache`].
    pub fn new(field: MetadataField, fetcher: Arc<dyn MetadataFetcher>) -> Self {
        Self {
            field,
            fetcher,
            entries: Mutex::default(),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn labels(fetcher: Arc<dyn MetadataFetcher>) -> Self {
        Self::new(MetadataField::Labels, fetcher)
    }

    pub fn annotations(fetcher: Arc<dyn MetadataFetcher>) -> Self {
        Self::new(MetadataField::Annotations, fetcher)
    }

    pub const fn field(&self) -> MetadataField {
        self.field
    }

    /// Number of objects whose metadata is cached.
    pub fn len(&self) -> usize {
        self.lock()
            .values()
            .filter(|entry| matches!(entry, Entry::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the metadata of `key`, fetching it on a miss.
    pub async fn get(&self, key: &ObjectKey) -> Result<Metadata, SharedFetchError> {
        let (id, fetch) = {
            let mut entries = self.lock();
            match entries.get(key) {
                Some(Entry::Ready(metadata)) => {
                    emit!(MetadataCacheHit { field: self.field });
                    return Ok(Arc::clone(metadata));
                }
                Some(Entry::Pending { id, fetch }) => {
                    emit!(MetadataFetchJoined {
                        field: self.field,
                        key,
                    });
                    (*id, fetch.clone())
                }
                None => {
                    emit!(MetadataCacheMiss {
                        field: self.field,
                        key,
                    });
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let fetch = self.start_fetch(key.clone());
                    entries.insert(
                        key.clone(),
                        Entry::Pending {
                            id,
                            fetch: fetch.clone(),
                        },
                    );
                    (id, fetch)
                }
            }
        };

        let result = fetch.await;
        self.settle(key, id, &result);
        result
    }

    fn start_fetch(&self, key: ObjectKey) -> SharedFetch {
        let fetcher = Arc::clone(&self.fetcher);
        let field = self.field;
        async move {
            fetcher
                .fetch(&key)
                .await
                .map(|metadata| Arc::new(field.extract(metadata)))
                .map_err(Arc::new)
        }
        .boxed()
        .shared()
    }

    /// Records the outcome of fetch `id`. Only the first waiter to get here
    /// changes the map, the rest find the entry already settled.
    fn settle(&self, key: &ObjectKey, id: u64, result: &Result<Metadata, SharedFetchError>) {
        let mut entries = self.lock();
        let is_current = matches!(
            entries.get(key),
            Some(Entry::Pending { id: pending, .. }) if *pending == id
        );
        if !is_current {
            return;
        }
        match result {
            Ok(metadata) => {
                entries.insert(key.clone(), Entry::Ready(Arc::clone(metadata)));
            }
            Err(_) => {
                entries.remove(key);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ObjectKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for MetadataCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataCache")
            .field("field", &self.field)
            .field("len", &self.len())
            .finish()
    }
}
