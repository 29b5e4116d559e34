//! Cluster access for metadata lookups and watermark write-back.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use k8s_openapi::{api::core::v1::Event, apimachinery::pkg::apis::meta::v1::ObjectMeta};
use kube::{
    Api, Client,
    api::{DynamicObject, Patch, PatchParams},
    core::GroupVersionKind,
    discovery::{self, ApiCapabilities, ApiResource, Scope},
};
use snafu::{OptionExt, ResultExt, Snafu, ensure};

use super::ObjectKey;
use crate::watermark;

/// Errors that can occur while fetching the metadata of an involved object.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum FetchError {
    /// The involved object reference lacks a field needed to address it.
    #[snafu(display("incomplete object reference: missing {}", field))]
    IncompleteReference { field: &'static str },

    /// The kind could not be mapped to an API resource.
    #[snafu(display("failed to discover API resource for {}/{}: {}", api_version, kind, source))]
    Discovery {
        api_version: String,
        kind: String,
        source: kube::Error,
    },

    #[snafu(display("{} not found", key))]
    NotFound { key: ObjectKey },

    /// The API request failed.
    #[snafu(display("failed to get {}: {}", key, source))]
    Get { key: ObjectKey, source: kube::Error },

    /// The object exists under the same name, but it is not the one the
    /// event refers to.
    #[snafu(display("{} was replaced by an object with uid {}", key, actual))]
    UidMismatch { key: ObjectKey, actual: String },
}

/// Errors that can occur while writing the watermark back to an event.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PatchError {
    #[snafu(display("event has no {}", field))]
    MissingEventField { field: &'static str },

    #[snafu(display("failed to patch event {}/{}: {}", namespace, name, source))]
    Request {
        namespace: String,
        name: String,
        source: kube::Error,
    },
}

/// Looks up the current metadata of an object.
#[async_trait]
pub trait MetadataFetcher: Send + Sync + 'static {
    async fn fetch(&self, key: &ObjectKey) -> Result<ObjectMeta, FetchError>;
}

/// Persists the watermark annotation on an event record.
///
/// Applying the same value twice must be a no-op.
#[async_trait]
pub trait WatermarkWriter: Send + Sync + 'static {
    async fn write(&self, event: &Event, count: i64) -> Result<(), PatchError>;
}

type ResourceKey = (String, String, String);

/// [`MetadataFetcher`] and [`WatermarkWriter`] atop of a [`kube::Client`].
#[derive(Clone)]
pub struct KubeClient {
    client: Client,
    resources: Arc<Mutex<HashMap<ResourceKey, (ApiResource, ApiCapabilities)>>>,
}

impl KubeClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            resources: Arc::default(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Maps the kind of `key` to its API resource, asking the API server only
    /// the first time a kind is seen.
    async fn resolve(&self, key: &ObjectKey) -> Result<(ApiResource, ApiCapabilities), FetchError> {
        let (group, version) = key.group_version();
        let resource_key = (group.to_owned(), version.to_owned(), key.kind.clone());

        if let Some(resolved) = self
            .resources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&resource_key)
        {
            return Ok(resolved.clone());
        }

        let gvk = GroupVersionKind::gvk(group, version, &key.kind);
        let resolved = discovery::pinned_kind(&self.client, &gvk)
            .await
            .context(DiscoverySnafu {
                api_version: key.api_version.clone(),
                kind: key.kind.clone(),
            })?;

        self.resources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(resource_key, resolved.clone());
        Ok(resolved)
    }
}

#[async_trait]
impl MetadataFetcher for KubeClient {
    async fn fetch(&self, key: &ObjectKey) -> Result<ObjectMeta, FetchError> {
        ensure!(
            !key.api_version.is_empty(),
            IncompleteReferenceSnafu { field: "apiVersion" }
        );
        ensure!(!key.kind.is_empty(), IncompleteReferenceSnafu { field: "kind" });
        ensure!(!key.name.is_empty(), IncompleteReferenceSnafu { field: "name" });

        let (resource, capabilities) = self.resolve(key).await?;
        let api: Api<DynamicObject> = match capabilities.scope {
            Scope::Namespaced => {
                let namespace = key
                    .namespace
                    .as_deref()
                    .context(IncompleteReferenceSnafu { field: "namespace" })?;
                Api::namespaced_with(self.client.clone(), namespace, &resource)
            }
            Scope::Cluster => Api::all_with(self.client.clone(), &resource),
        };

        let object = api.get_metadata(&key.name).await.map_err(|source| match source {
            kube::Error::Api(ref response) if response.code == 404 => {
                FetchError::NotFound { key: key.clone() }
            }
            source => FetchError::Get {
                key: key.clone(),
                source,
            },
        })?;

        let metadata = object.metadata;
        if let (Some(expected), Some(actual)) = (&key.uid, &metadata.uid) {
            ensure!(
                expected == actual,
                UidMismatchSnafu {
                    key: key.clone(),
                    actual: actual.clone(),
                }
            );
        }
        Ok(metadata)
    }
}

#[async_trait]
impl WatermarkWriter for KubeClient {
    async fn write(&self, event: &Event, count: i64) -> Result<(), PatchError> {
        let name = event
            .metadata
            .name
            .as_deref()
            .context(MissingEventFieldSnafu { field: "name" })?;
        let namespace = event
            .metadata
            .namespace
            .as_deref()
            .context(MissingEventFieldSnafu { field: "namespace" })?;

        let api: Api<Event> = Api::namespaced(self.client.clone(), namespace);
        let patch = watermark::merge_patch(count);
        api.patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .context(RequestSnafu { namespace, name })?;
        Ok(())
    }
}
