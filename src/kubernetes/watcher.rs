//! Watcher abstraction.

use async_trait::async_trait;
use futures::{StreamExt, stream::BoxStream};
use k8s_openapi::api::core::v1::Event;
use kube::{
    Api, Client,
    api::ListParams,
    runtime::{WatchStreamExt, watcher},
};
use snafu::{ResultExt, Snafu};

use crate::internal_events::kubernetes::watcher::WatchSubscribed;

/// The stream of watch notifications a subscription yields.
pub type WatchStream = BoxStream<'static, Result<watcher::Event<Event>, watcher::Error>>;

/// Errors that can occur while establishing a subscription.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SubscribeError {
    /// The API server rejected or failed the initial request.
    #[snafu(display("unable to reach the events API in {}: {}", scope, source))]
    Unreachable { scope: String, source: kube::Error },
}

/// Delivers the notifications about [`Event`] records in a namespace scope.
#[async_trait]
pub trait EventSource: Send + Sync + 'static {
    /// Opens a subscription.
    ///
    /// Failing here is fatal to the caller. Once a stream is handed out,
    /// transient failures show up as stream items and the source is
    /// responsible for reconnecting.
    async fn subscribe(&self) -> Result<WatchStream, SubscribeError>;
}

/// An [`EventSource`] atop of [`kube::runtime::watcher`].
#[derive(Clone)]
pub struct KubeEventSource {
    client: Client,
    namespace: Option<String>,
}

impl KubeEventSource {
    /// Watch the `namespace`, or all namespaces when it's `None`.
    pub fn new(client: Client, namespace: Option<String>) -> Self {
        Self { client, namespace }
    }

    fn api(&self) -> Api<Event> {
        match &self.namespace {
            Some(namespace) => Api::namespaced(self.client.clone(), namespace),
            None => Api::all(self.client.clone()),
        }
    }

    fn scope(&self) -> String {
        match &self.namespace {
            Some(namespace) => format!("namespace {:?}", namespace),
            None => "all namespaces".to_owned(),
        }
    }
}

#[async_trait]
impl EventSource for KubeEventSource {
    async fn subscribe(&self) -> Result<WatchStream, SubscribeError> {
        let api = self.api();

        // The watcher only surfaces connection problems as stream items, so
        // probe once to fail fast on a bad configuration.
        api.list(&ListParams::default().limit(1))
            .await
            .context(UnreachableSnafu { scope: self.scope() })?;

        emit!(WatchSubscribed {
            namespace: self.namespace.as_deref(),
        });

        Ok(watcher(api, watcher::Config::default())
            .default_backoff()
            .boxed())
    }
}
