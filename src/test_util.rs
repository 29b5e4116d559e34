//! Fakes for the cluster-facing traits, and event builders.

use std::{
    collections::{BTreeMap, HashMap},
    io,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use futures::{StreamExt, channel::mpsc};
use k8s_openapi::{
    api::core::v1::{Event, ObjectReference},
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
use kube::{error::ErrorResponse, runtime::watcher};

use crate::{
    event::EnrichedEvent,
    kubernetes::{
        EventSource, FetchError, MetadataFetcher, ObjectKey, PatchError, SubscribeError,
        WatchStream, WatermarkWriter, client::NotFoundSnafu,
    },
    sinks::EventHandler,
    watermark::ANNOTATION_KEY,
};

fn to_map(pairs: &[(&str, &str)]) -> Option<BTreeMap<String, String>> {
    Some(
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect(),
    )
}

pub fn object_meta(labels: &[(&str, &str)], annotations: &[(&str, &str)]) -> ObjectMeta {
    ObjectMeta {
        labels: to_map(labels),
        annotations: to_map(annotations),
        ..ObjectMeta::default()
    }
}

/// The key of the object every [`raw_event`] is about.
pub fn involved_pod() -> ObjectKey {
    ObjectKey::new("v1", "Pod", Some("default"), "x").with_uid("uid-x")
}

/// An event named `name` in `default` about the pod `default/x`.
pub fn raw_event(name: &str, count: i32) -> Event {
    Event {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            namespace: Some("default".to_owned()),
            ..ObjectMeta::default()
        },
        involved_object: ObjectReference {
            api_version: Some("v1".to_owned()),
            kind: Some("Pod".to_owned()),
            namespace: Some("default".to_owned()),
            name: Some("x".to_owned()),
            uid: Some("uid-x".to_owned()),
            ..ObjectReference::default()
        },
        reason: Some("BackOff".to_owned()),
        message: Some("Back-off restarting failed container".to_owned()),
        count: Some(count),
        ..Event::default()
    }
}

/// Returns `event` with its watermark annotation set to `watermark`.
pub fn with_watermark(mut event: Event, watermark: &str) -> Event {
    event
        .metadata
        .annotations
        .get_or_insert_with(Default::default)
        .insert(ANNOTATION_KEY.to_owned(), watermark.to_owned());
    event
}

/// A [`MetadataFetcher`] serving objects from memory. Unknown keys are not
/// found.
#[derive(Default)]
pub struct FakeFetcher {
    objects: Mutex<HashMap<ObjectKey, ObjectMeta>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl FakeFetcher {
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn insert(&self, key: ObjectKey, metadata: ObjectMeta) {
        self.objects.lock().unwrap().insert(key, metadata);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataFetcher for FakeFetcher {
    async fn fetch(&self, key: &ObjectKey) -> Result<ObjectMeta, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let found = self.objects.lock().unwrap().get(key).cloned();
        found.ok_or_else(|| NotFoundSnafu { key: key.clone() }.build())
    }
}

/// A [`WatermarkWriter`] recording the `(event name, count)` of every write,
/// or failing all of them.
#[derive(Default)]
pub struct FakeWriter {
    written: Mutex<Vec<(String, i64)>>,
    fail: bool,
}

impl FakeWriter {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// `(event name, count)` of every successful write, in order.
    pub fn written(&self) -> Vec<(String, i64)> {
        self.written.lock().unwrap().clone()
    }

    /// The last count written for the event `name`.
    pub fn watermark(&self, name: &str) -> Option<i64> {
        self.written
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(written, _)| written == name)
            .map(|(_, count)| *count)
    }
}

#[async_trait]
impl WatermarkWriter for FakeWriter {
    async fn write(&self, event: &Event, count: i64) -> Result<(), PatchError> {
        if self.fail {
            return Err(PatchError::MissingEventField { field: "name" });
        }
        let name = event.metadata.name.clone().unwrap_or_default();
        self.written.lock().unwrap().push((name, count));
        Ok(())
    }
}

/// An [`EventHandler`] keeping everything it receives.
#[derive(Clone, Default)]
pub struct CollectingHandler(Arc<Mutex<Vec<EnrichedEvent>>>);

impl CollectingHandler {
    pub fn events(&self) -> Vec<EnrichedEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn counts(&self) -> Vec<i64> {
        self.events().iter().map(EnrichedEvent::count).collect()
    }
}

impl EventHandler for CollectingHandler {
    fn handle(&self, event: EnrichedEvent) {
        self.0.lock().unwrap().push(event);
    }
}

type Item = Result<watcher::Event<Event>, watcher::Error>;

/// An [`EventSource`] fed through a channel. Subscribing hands out the
/// receiving end, so it can only be subscribed to once.
pub struct FakeSource {
    rx: Mutex<Option<mpsc::UnboundedReceiver<Item>>>,
}

impl FakeSource {
    pub fn new() -> (mpsc::UnboundedSender<Item>, Self) {
        let (tx, rx) = mpsc::unbounded();
        (
            tx,
            Self {
                rx: Mutex::new(Some(rx)),
            },
        )
    }

    /// A source whose subscription is always refused by the API server.
    pub fn unreachable() -> Self {
        Self {
            rx: Mutex::new(None),
        }
    }
}

#[async_trait]
impl EventSource for FakeSource {
    async fn subscribe(&self) -> Result<WatchStream, SubscribeError> {
        let rx = self.rx.lock().unwrap().take();
        match rx {
            Some(rx) => Ok(rx.boxed()),
            None => Err(SubscribeError::Unreachable {
                scope: "all namespaces".to_owned(),
                source: kube::Error::Api(ErrorResponse {
                    status: "Failure".to_owned(),
                    message: "events is forbidden".to_owned(),
                    reason: "Forbidden".to_owned(),
                    code: 403,
                }),
            }),
        }
    }
}

/// Collects the log lines emitted on the current thread while its guard is
/// alive.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn start() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = Self::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        (capture, tracing::subscriber::set_default(subscriber))
    }

    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
