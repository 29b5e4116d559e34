//! This mod contains the shared Kubernetes plumbing: the watch subscription,
//! the informer that turns it into notifications, and the metadata caches.

pub mod client;
pub mod informer;
pub mod meta_cache;
pub mod object_key;
pub mod watcher;

pub use client::{FetchError, KubeClient, MetadataFetcher, PatchError, WatermarkWriter};
pub use informer::{Informer, NotificationSink};
pub use meta_cache::{Metadata, MetadataCache, MetadataField, SharedFetchError};
pub use object_key::ObjectKey;
pub use watcher::{EventSource, KubeEventSource, SubscribeError, WatchStream};
