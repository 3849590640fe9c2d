//! Selecting and executing eviction of a single preemption victim.

use std::time::Duration;

use log::info;
use tokio::time::sleep;

use crate::cluster::{ClusterClient, DeleteOutcome};
use crate::error::SchedulerError;
use crate::models::{NodeRecord, PodIdentity};
use crate::node_eval::{in_preemption_domain, is_ready};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreemptionTarget {
    pub node_name: String,
    pub victim: PodIdentity,
    pub victim_priority: i64,
}

/// Finds the single lowest-priority preemption-domain pod, among ready
/// nodes, whose priority is strictly less than `incoming_priority`. Ties are
/// broken by encounter order over the node list.
pub async fn plan(
    client: &dyn ClusterClient,
    nodes: &[NodeRecord],
    incoming_priority: i64,
    domain_substring: &str,
) -> Result<Option<PreemptionTarget>, SchedulerError> {
    let mut best: Option<PreemptionTarget> = None;

    for node in nodes.iter().filter(|n| is_ready(n)) {
        let pods_on_node = client.list_pods_on_node(&node.name).await?;
        for pod in pods_on_node
            .iter()
            .filter(|p| !p.phase.is_terminal())
            .filter(|p| in_preemption_domain(&p.identity.name, domain_substring))
            .filter(|p| p.priority < incoming_priority)
        {
            let is_better = match &best {
                None => true,
                Some(current) => pod.priority < current.victim_priority,
            };
            if is_better {
                best = Some(PreemptionTarget {
                    node_name: node.name.clone(),
                    victim: pod.identity.clone(),
                    victim_priority: pod.priority,
                });
            }
        }
    }

    Ok(best)
}

/// Deletes the victim and waits `post_eviction_wait` before returning, so the
/// API server and kubelet have time to observe the removal before a bind is
/// attempted against the freed capacity.
pub async fn execute(
    client: &dyn ClusterClient,
    target: &PreemptionTarget,
    post_eviction_wait: Duration,
) -> Result<(), SchedulerError> {
    match client.delete_pod(&target.victim).await? {
        DeleteOutcome::Deleted => {
            info!("evicted {} from {}", target.victim, target.node_name);
        }
        DeleteOutcome::AlreadyGone => {
            info!(
                "preemption victim {} on {} was already gone",
                target.victim, target.node_name
            );
        }
    }
    sleep(post_eviction_wait).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{BindOutcome, PodEventStream};
    use crate::models::{ConditionStatus, NodeCondition, PodPhase, PodRecord};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeClient {
        pods_by_node: HashMap<String, Vec<PodRecord>>,
        deleted: Mutex<Vec<PodIdentity>>,
    }

    #[async_trait]
    impl ClusterClient for FakeClient {
        async fn watch_pods(&self) -> Result<PodEventStream, SchedulerError> {
            unimplemented!()
        }
        async fn list_nodes(&self) -> Result<Vec<NodeRecord>, SchedulerError> {
            unimplemented!()
        }
        async fn list_pods_on_node(
            &self,
            node_name: &str,
        ) -> Result<Vec<PodRecord>, SchedulerError> {
            Ok(self.pods_by_node.get(node_name).cloned().unwrap_or_default())
        }
        async fn bind(
            &self,
            _pod: &PodIdentity,
            _node_name: &str,
        ) -> Result<BindOutcome, SchedulerError> {
            unimplemented!()
        }
        async fn delete_pod(&self, pod: &PodIdentity) -> Result<DeleteOutcome, SchedulerError> {
            self.deleted.lock().unwrap().push(pod.clone());
            Ok(DeleteOutcome::Deleted)
        }
    }

    fn ready_node(name: &str) -> NodeRecord {
        NodeRecord {
            name: name.to_string(),
            conditions: vec![NodeCondition {
                kind: "Ready".to_string(),
                status: ConditionStatus::True,
            }],
            allocatable: HashMap::new(),
        }
    }

    fn pod(name: &str, node_name: &str, priority: i64) -> PodRecord {
        PodRecord {
            identity: PodIdentity::new("default", name),
            scheduler_name: "custom-scheduler".to_string(),
            node_name: Some(node_name.to_string()),
            phase: PodPhase::Running,
            priority,
        }
    }

    #[tokio::test]
    async fn selects_the_minimum_priority_eligible_victim() {
        let nodes = vec![ready_node("n1")];
        let client = FakeClient {
            pods_by_node: HashMap::from([(
                "n1".to_string(),
                vec![
                    pod("priority-a", "n1", 2),
                    pod("priority-b", "n1", 1),
                    pod("plain-job", "n1", 0),
                ],
            )]),
            deleted: Mutex::new(vec![]),
        };

        let target = plan(&client, &nodes, 5, "priority").await.unwrap().unwrap();
        assert_eq!(target.victim.name, "priority-b");
        assert_eq!(target.node_name, "n1");
    }

    #[tokio::test]
    async fn no_victim_below_incoming_priority_yields_none() {
        let nodes = vec![ready_node("n1")];
        let client = FakeClient {
            pods_by_node: HashMap::from([(
                "n1".to_string(),
                vec![pod("priority-a", "n1", 10)],
            )]),
            deleted: Mutex::new(vec![]),
        };

        let target = plan(&client, &nodes, 5, "priority").await.unwrap();
        assert!(target.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn execute_deletes_then_waits() {
        let client = FakeClient {
            pods_by_node: HashMap::new(),
            deleted: Mutex::new(vec![]),
        };
        let target = PreemptionTarget {
            node_name: "n1".to_string(),
            victim: PodIdentity::new("default", "priority-b"),
            victim_priority: 1,
        };

        let handle = tokio::spawn(async move {
            execute(&client, &target, Duration::from_secs(1)).await.unwrap();
            client
        });
        tokio::time::advance(Duration::from_secs(1)).await;
        let client = handle.await.unwrap();
        assert_eq!(client.deleted.lock().unwrap().len(), 1);
    }
}
