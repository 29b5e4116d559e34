//! Turns a [`kube::runtime::watcher`] stream into add, update and delete
//! notifications.

use std::{
    collections::{HashMap, HashSet},
    fmt::Debug,
};

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use kube::{Resource, ResourceExt, runtime::watcher};

use crate::{
    internal_events::kubernetes::{
        informer::{StateItemAdded, StateItemDeleted, StateItemUpdated, StateResynced},
        watcher::WatchStreamError,
    },
    shutdown::ShutdownHandle,
};

/// Receives the notifications an [`Informer`] dispatches.
#[async_trait]
pub trait NotificationSink<K: Sync>: Send + Sync {
    /// An object was seen for the first time.
    async fn on_add(&self, obj: &K);

    /// A known object changed.
    async fn on_update(&self, old: &K, new: &K);

    /// An object went away.
    async fn on_delete(&self, obj: &K);
}

/// Keeps the last seen version of every watched object, so that watch
/// events can be told apart into adds and updates, and objects that vanished
/// while the watch was down can be reported as deletes after a relist.
#[derive(Debug)]
pub struct Informer<K> {
    store: HashMap<String, K>,
    relist: Option<HashSet<String>>,
}

impl<K> Default for Informer<K> {
    fn default() -> Self {
        Self {
            store: HashMap::new(),
            relist: None,
        }
    }
}

impl<K> Informer<K>
where
    K: Resource + Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects currently known.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Dispatches watch events to `sink` until the stream ends or shutdown is
    /// requested.
    ///
    /// Each notification is handled to completion before the next one is
    /// pulled from the stream, so a slow sink slows the watch down.
    pub async fn run<S, E, N>(mut self, mut stream: S, sink: &N, mut shutdown: ShutdownHandle)
    where
        S: Stream<Item = Result<watcher::Event<K>, E>> + Unpin,
        E: Debug,
        N: NotificationSink<K> + ?Sized,
    {
        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    debug!(message = "Informer shutting down.");
                    break;
                }
                item = stream.next() => match item {
                    Some(Ok(event)) => self.apply(event, sink).await,
                    Some(Err(error)) => emit!(WatchStreamError { error }),
                    None => {
                        info!(message = "Watch stream ended.");
                        break;
                    }
                },
            }
        }
    }

    /// Applies a single watch event to the store and notifies `sink`.
    pub async fn apply<N>(&mut self, event: watcher::Event<K>, sink: &N)
    where
        N: NotificationSink<K> + ?Sized,
    {
        match event {
            watcher::Event::Apply(obj) => self.upsert(obj, sink).await,
            watcher::Event::Delete(obj) => {
                self.store.remove(&store_key(&obj));
                emit!(StateItemDeleted);
                sink.on_delete(&obj).await;
            }
            watcher::Event::Init => {
                trace!(message = "Relist started.");
                self.relist = Some(HashSet::new());
            }
            watcher::Event::InitApply(obj) => {
                if let Some(seen) = self.relist.as_mut() {
                    seen.insert(store_key(&obj));
                }
                self.upsert(obj, sink).await;
            }
            watcher::Event::InitDone => {
                let Some(seen) = self.relist.take() else {
                    return;
                };
                let stale = self
                    .store
                    .keys()
                    .filter(|key| !seen.contains(*key))
                    .cloned()
                    .collect::<Vec<_>>();
                for key in &stale {
                    if let Some(obj) = self.store.remove(key) {
                        emit!(StateItemDeleted);
                        sink.on_delete(&obj).await;
                    }
                }
                emit!(StateResynced {
                    retained: self.store.len(),
                    removed: stale.len(),
                });
            }
        }
    }

    async fn upsert<N>(&mut self, obj: K, sink: &N)
    where
        N: NotificationSink<K> + ?Sized,
    {
        match self.store.insert(store_key(&obj), obj.clone()) {
            Some(old) => {
                emit!(StateItemUpdated);
                sink.on_update(&old, &obj).await;
            }
            None => {
                emit!(StateItemAdded);
                sink.on_add(&obj).await;
            }
        }
    }
}

fn store_key<K: Resource>(obj: &K) -> String {
    match obj.namespace() {
        Some(namespace) => format!("{}/{}", namespace, obj.name_any()),
        None => obj.name_any(),
    }
}
