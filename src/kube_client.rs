//! The real `ClusterClient` implementation, backed by a live Kubernetes API server.

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use k8s_openapi::api::core::v1::{Binding, Node, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectReference;
use kube::api::{Api, DeleteParams, ListParams, ObjectMeta, PropagationPolicy};
use kube::runtime::watcher::{self, Event};
use kube::ResourceExt;

use crate::cluster::{BindOutcome, ClusterClient, DeleteOutcome, PodEvent, PodEventStream};
use crate::error::SchedulerError;
use crate::models::{ConditionStatus, NodeCondition, NodeRecord, PodIdentity, PodPhase, PodRecord};

#[derive(Clone)]
pub struct KubeClusterClient {
    client: kube::Client,
    priority_annotation_key: String,
}

impl KubeClusterClient {
    pub fn new(client: kube::Client, priority_annotation_key: impl Into<String>) -> Self {
        Self {
            client,
            priority_annotation_key: priority_annotation_key.into(),
        }
    }

    fn convert_pod(&self, pod: &Pod) -> PodRecord {
        let identity = PodIdentity::new(
            pod.namespace().unwrap_or_default(),
            pod.name_any(),
        );
        let spec = pod.spec.as_ref();
        let scheduler_name = spec
            .and_then(|s| s.scheduler_name.clone())
            .unwrap_or_default();
        let node_name = spec.and_then(|s| s.node_name.clone());
        let phase = pod
            .status
            .as_ref()
            .and_then(|s| s.phase.as_deref())
            .map(parse_phase)
            .unwrap_or(PodPhase::Unknown);
        let priority = pod
            .annotations()
            .get(self.priority_annotation_key.as_str())
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0);

        PodRecord {
            identity,
            scheduler_name,
            node_name,
            phase,
            priority,
        }
    }

    fn convert_node(node: &Node) -> NodeRecord {
        let conditions = node
            .status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .map(|conditions| {
                conditions
                    .iter()
                    .map(|c| NodeCondition {
                        kind: c.type_.clone(),
                        status: parse_condition_status(&c.status),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let allocatable = node
            .status
            .as_ref()
            .and_then(|s| s.allocatable.as_ref())
            .map(|map| {
                map.iter()
                    .map(|(k, v)| (k.clone(), v.0.clone()))
                    .collect()
            })
            .unwrap_or_default();

        NodeRecord {
            name: node.name_any(),
            conditions,
            allocatable,
        }
    }
}

fn parse_phase(raw: &str) -> PodPhase {
    match raw {
        "Pending" => PodPhase::Pending,
        "Running" => PodPhase::Running,
        "Succeeded" => PodPhase::Succeeded,
        "Failed" => PodPhase::Failed,
        _ => PodPhase::Unknown,
    }
}

fn parse_condition_status(raw: &str) -> ConditionStatus {
    match raw {
        "True" => ConditionStatus::True,
        "False" => ConditionStatus::False,
        _ => ConditionStatus::Unknown,
    }
}

fn is_conflict(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.code == 409)
}

/// A victim already removed by another actor: 404 (gone) or 410 (Gone status,
/// returned when the delete races a prior deletion's finalizer teardown).
fn is_already_gone(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.code == 404 || resp.code == 410)
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn watch_pods(&self) -> Result<PodEventStream, SchedulerError> {
        let api: Api<Pod> = Api::all(self.client.clone());
        let this = self.clone();
        let stream = watcher::watcher(api, watcher::Config::default())
            .map_ok(move |event| -> Vec<PodEvent> {
                match event {
                    Event::Applied(pod) => vec![PodEvent::Modified(this.convert_pod(&pod))],
                    Event::Deleted(pod) => vec![PodEvent::Deleted(PodIdentity::new(
                        pod.namespace().unwrap_or_default(),
                        pod.name_any(),
                    ))],
                    Event::Restarted(pods) => pods
                        .iter()
                        .map(|pod| PodEvent::Modified(this.convert_pod(pod)))
                        .collect(),
                }
            })
            .map(|item| match item {
                Ok(events) => futures::stream::iter(events.into_iter().map(Ok)).left_stream(),
                Err(err) => {
                    futures::stream::once(async move {
                        Err(SchedulerError::transient("watch_pods", err.to_string()))
                    })
                    .right_stream()
                }
            })
            .flatten();

        Ok(Box::pin(stream))
    }

    async fn list_nodes(&self) -> Result<Vec<NodeRecord>, SchedulerError> {
        let api: Api<Node> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|err| SchedulerError::transient("list_nodes", err.to_string()))?;
        Ok(list.items.iter().map(Self::convert_node).collect())
    }

    async fn list_pods_on_node(&self, node_name: &str) -> Result<Vec<PodRecord>, SchedulerError> {
        let api: Api<Pod> = Api::all(self.client.clone());
        let params = ListParams::default().fields(&format!("spec.nodeName={node_name}"));
        let list = api
            .list(&params)
            .await
            .map_err(|err| SchedulerError::transient("list_pods_on_node", err.to_string()))?;
        Ok(list.items.iter().map(|pod| self.convert_pod(pod)).collect())
    }

    async fn bind(
        &self,
        pod: &PodIdentity,
        node_name: &str,
    ) -> Result<BindOutcome, SchedulerError> {
        let binding = Binding {
            metadata: ObjectMeta {
                name: Some(pod.name.clone()),
                namespace: Some(pod.namespace.clone()),
                ..Default::default()
            },
            target: ObjectReference {
                api_version: Some("v1".to_string()),
                kind: Some("Node".to_string()),
                name: Some(node_name.to_string()),
                ..Default::default()
            },
        };

        let body = serde_json::to_vec(&binding)
            .map_err(|err| SchedulerError::transient("bind", err.to_string()))?;
        let request = http::Request::post(format!(
            "/api/v1/namespaces/{}/pods/{}/binding",
            pod.namespace, pod.name
        ))
        .header("content-type", "application/json")
        .body(body)
        .map_err(|err| SchedulerError::transient("bind", err.to_string()))?;

        match self.client.request::<Binding>(request).await {
            Ok(_) => Ok(BindOutcome::Committed),
            Err(err) if is_conflict(&err) => Ok(BindOutcome::Conflicted),
            Err(err) => Err(SchedulerError::transient("bind", err.to_string())),
        }
    }

    async fn delete_pod(&self, pod: &PodIdentity) -> Result<DeleteOutcome, SchedulerError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), &pod.namespace);
        let params = DeleteParams {
            grace_period_seconds: Some(0),
            propagation_policy: Some(PropagationPolicy::Foreground),
            ..Default::default()
        };
        match api.delete(&pod.name, &params).await {
            Ok(_) => Ok(DeleteOutcome::Deleted),
            Err(err) if is_already_gone(&err) => Ok(DeleteOutcome::AlreadyGone),
            Err(err) => Err(SchedulerError::transient("delete_pod", err.to_string())),
        }
    }
}
