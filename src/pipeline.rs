//! The watch, de-duplicate, enrich, forward and acknowledge loop.

use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Event;
use tokio::task::JoinHandle;

use crate::{
    event::EnrichedEvent,
    internal_events::{
        KubernetesEventForwarded, KubernetesEventReceived, MetadataFetchError, WatermarkPatchError,
    },
    kubernetes::{
        EventSource, Informer, Metadata, MetadataCache, MetadataFetcher, NotificationSink,
        ObjectKey, SubscribeError, WatermarkWriter,
    },
    shutdown::{ShutdownTrigger, shutdown_pair},
    sinks::EventHandler,
    watermark,
};


/// Handles the notifications of a single event watch.
///
/// The metadata caches live as long as the processor and are shared by every
/// notification it handles.
pub struct EventProcessor {
    labels: MetadataCache,
    annotations: MetadataCache,
    writer: Arc<dyn WatermarkWriter>,
    handler: Arc<dyn EventHandler>,
}

impl EventProcessor {
    pub fn new(
        fetcher: Arc<dyn MetadataFetcher>,
        writer: Arc<dyn WatermarkWriter>,
        handler: Arc<dyn EventHandler>,
    ) -> Self {
        Self::with_caches(
            MetadataCache::labels(Arc::clone(&fetcher)),
            MetadataCache::annotations(fetcher),
            writer,
            handler,
        )
    }

    pub fn with_caches(
        labels: MetadataCache,
        annotations: MetadataCache,
        writer: Arc<dyn WatermarkWriter>,
        handler: Arc<dyn EventHandler>,
    ) -> Self {
        Self {
            labels,
            annotations,
            writer,
            handler,
        }
    }

    pub const fn labels(&self) -> &MetadataCache {
        &self.labels
    }

    pub const fn annotations(&self) -> &MetadataCache {
        &self.annotations
    }

    /// Forwards `raw` to the handler unless its occurrence was forwarded
    /// before, then records the occurrence on the event record.
    ///
    /// Metadata lookup and write-back failures are reported and otherwise
    /// ignored: an event is never dropped because its involved object could
    /// not be read, and a failed write-back at worst forwards an occurrence
    /// twice.
    pub async fn handle_event(&self, raw: &Event) {
        let count = watermark::count(raw);
        let key = ObjectKey::from_reference(&raw.involved_object);
        emit!(KubernetesEventReceived {
            namespace: raw.metadata.namespace.as_deref().unwrap_or_default(),
            reason: raw.reason.as_deref().unwrap_or_default(),
            message: raw.message.as_deref().unwrap_or_default(),
            involved_object: &key.to_string(),
            count,
        });

        if !watermark::should_process(raw) {
            return;
        }

        let mut enriched = EnrichedEvent::new(raw);
        let (labels, annotations) =
            tokio::join!(lookup(&self.labels, &key), lookup(&self.annotations, &key));
        if labels.is_some() || annotations.is_some() {
            enriched.involved_object = Some(raw.involved_object.clone());
        }
        if let Some(labels) = labels {
            enriched.labels = Arc::unwrap_or_clone(labels);
        }
        if let Some(annotations) = annotations {
            enriched.annotations = Arc::unwrap_or_clone(annotations);
        }

        self.handler.handle(enriched);
        emit!(KubernetesEventForwarded { count });

        if let Err(error) = self.writer.write(raw, count).await {
            emit!(WatermarkPatchError {
                namespace: raw.metadata.namespace.as_deref().unwrap_or_default(),
                name: raw.metadata.name.as_deref().unwrap_or_default(),
                error: &error,
            });
        }
    }
}

async fn lookup(cache: &MetadataCache, key: &ObjectKey) -> Option<Metadata> {
    match cache.get(key).await {
        Ok(metadata) => Some(metadata),
        Err(error) => {
            emit!(MetadataFetchError {
                field: cache.field(),
                key,
                error: &error,
            });
            None
        }
    }
}

#[async_trait]
impl NotificationSink<Event> for EventProcessor {
    async fn on_add(&self, obj: &Event) {
        self.handle_event(obj).await;
    }

    async fn on_update(&self, _old: &Event, new: &Event) {
        self.handle_event(new).await;
    }

    async fn on_delete(&self, _obj: &Event) {}
}

struct Running {
    trigger: ShutdownTrigger,
    task: JoinHandle<()>,
}

/// Runs an [`EventProcessor`] over the notifications of an [`EventSource`].
///
/// Notifications are handled one at a time on a single task, in the order the
/// source delivers them. A slow handler or a slow cluster lookup delays every
/// later notification, and the watch stream is not polled in the meantime.
pub struct EventPipeline {
    source: Arc<dyn EventSource>,
    processor: Arc<EventProcessor>,
    running: Option<Running>,
}

impl EventPipeline {
    pub fn new(source: Arc<dyn EventSource>, processor: EventProcessor) -> Self {
        Self {
            source,
            processor: Arc::new(processor),
            running: None,
        }
    }

    pub fn processor(&self) -> &EventProcessor {
        &self.processor
    }

    pub const fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Subscribes to the source and starts handling its notifications in the
    /// background.
    ///
    /// Must not be called again before [`EventPipeline::stop`].
    pub async fn start(&mut self) -> Result<(), SubscribeError> {
        let stream = self.source.subscribe().await?;
        let (trigger, shutdown) = shutdown_pair();
        let processor = Arc::clone(&self.processor);

        let task = tokio::spawn(async move {
            Informer::new().run(stream, &*processor, shutdown).await;
        });

        self.running = Some(Running { trigger, task });
        info!(message = "Event pipeline started.");
        Ok(())
    }

    /// Drops the subscription and waits for the notification being handled,
    /// if any, to finish.
    pub async fn stop(&mut self) {
        let Some(Running { trigger, task }) = self.running.take() else {
            return;
        };

        trigger.trigger();
        if let Err(error) = task.await {
            error!(message = "Event pipeline task failed.", %error);
        }
        info!(message = "Event pipeline stopped.");
    }
}
