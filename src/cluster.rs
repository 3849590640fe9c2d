//! The cluster-facing capability this crate is injected with.
//!
//! Core scheduling logic depends only on this trait, never on `kube` directly,
//! so it can be driven by a fake in tests. See `kube_client.rs` for the real
//! Kubernetes-backed implementation.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::SchedulerError;
use crate::models::{NodeRecord, PodIdentity, PodRecord};

#[derive(Debug, Clone)]
pub enum PodEvent {
    Added(PodRecord),
    Modified(PodRecord),
    Deleted(PodIdentity),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    Committed,
    /// The pod was already bound elsewhere (a 409 Conflict); not an error.
    Conflicted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The pod was already gone; deletion is idempotent.
    AlreadyGone,
}

pub type PodEventStream = BoxStream<'static, Result<PodEvent, SchedulerError>>;

#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn watch_pods(&self) -> Result<PodEventStream, SchedulerError>;

    async fn list_nodes(&self) -> Result<Vec<NodeRecord>, SchedulerError>;

    async fn list_pods_on_node(&self, node_name: &str) -> Result<Vec<PodRecord>, SchedulerError>;

    async fn bind(
        &self,
        pod: &PodIdentity,
        node_name: &str,
    ) -> Result<BindOutcome, SchedulerError>;

    async fn delete_pod(&self, pod: &PodIdentity) -> Result<DeleteOutcome, SchedulerError>;
}

#[async_trait]
impl<T: ClusterClient + ?Sized> ClusterClient for std::sync::Arc<T> {
    async fn watch_pods(&self) -> Result<PodEventStream, SchedulerError> {
        (**self).watch_pods().await
    }

    async fn list_nodes(&self) -> Result<Vec<NodeRecord>, SchedulerError> {
        (**self).list_nodes().await
    }

    async fn list_pods_on_node(&self, node_name: &str) -> Result<Vec<PodRecord>, SchedulerError> {
        (**self).list_pods_on_node(node_name).await
    }

    async fn bind(
        &self,
        pod: &PodIdentity,
        node_name: &str,
    ) -> Result<BindOutcome, SchedulerError> {
        (**self).bind(pod, node_name).await
    }

    async fn delete_pod(&self, pod: &PodIdentity) -> Result<DeleteOutcome, SchedulerError> {
        (**self).delete_pod(pod).await
    }
}
