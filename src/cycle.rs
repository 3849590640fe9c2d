//! One pass over the currently-queued pods: score, bind, or preempt.

use log::{info, warn};
use tokio::time::Instant;

use crate::cluster::{BindOutcome, ClusterClient};
use crate::config::Config;
use crate::error::SchedulerError;
use crate::models::{Assignment, NodeRecord, QueueEntry};
use crate::node_eval::{is_ready, occupancy, score};
use crate::preemption;
use crate::queue::SchedulingQueue;

/// Picks the ready node with the highest finite score, breaking ties by
/// encounter order (the first node reaching a given score wins).
fn best_node(
    nodes: &[NodeRecord],
    occupancy_by_node: &dyn Fn(&str) -> usize,
    config: &Config,
) -> Option<String> {
    let mut best: Option<(String, f64)> = None;
    for node in nodes.iter().filter(|n| is_ready(n)) {
        let count = occupancy_by_node(&node.name);
        if let Some(candidate_score) = score(node, count, config.max_pods_per_node) {
            let is_better = match &best {
                None => true,
                Some((_, best_score)) => candidate_score > *best_score,
            };
            if is_better {
                best = Some((node.name.clone(), candidate_score));
            }
        }
    }
    best.map(|(name, _)| name)
}

enum EntryOutcome {
    Done(Option<Assignment>),
    Requeue(QueueEntry),
}

async fn schedule_entry(
    client: &dyn ClusterClient,
    entry: QueueEntry,
    config: &Config,
) -> EntryOutcome {
    let nodes = match client.list_nodes().await {
        Ok(nodes) => nodes,
        Err(err) => {
            warn!(
                "failed to list nodes while scheduling {}: {}",
                entry.pod.identity, err
            );
            return EntryOutcome::Requeue(refresh(entry));
        }
    };

    let pods_per_node = match list_occupancy(client, &nodes, config).await {
        Ok(map) => map,
        Err(err) => {
            warn!(
                "failed to list pods on a node while scheduling {}: {}",
                entry.pod.identity, err
            );
            return EntryOutcome::Requeue(refresh(entry));
        }
    };

    if let Some(node_name) = best_node(&nodes, &|name| *pods_per_node.get(name).unwrap_or(&0), config)
    {
        match client.bind(&entry.pod.identity, &node_name).await {
            Ok(BindOutcome::Committed) => {
                info!("bound {} to {}", entry.pod.identity, node_name);
                return EntryOutcome::Done(Some(Assignment {
                    pod: entry.pod.identity,
                    node_name,
                }));
            }
            Ok(BindOutcome::Conflicted) => {
                info!(
                    "{} was already bound by another actor",
                    entry.pod.identity
                );
                return EntryOutcome::Done(None);
            }
            Err(err) => {
                warn!("bind of {} to {} failed: {}", entry.pod.identity, node_name, err);
                return EntryOutcome::Requeue(refresh(entry));
            }
        }
    }

    match preemption::plan(
        client,
        &nodes,
        entry.priority,
        &config.preemption_domain_substring,
    )
    .await
    {
        Ok(Some(target)) => {
            if let Err(err) = preemption::execute(client, &target, config.post_eviction_wait).await
            {
                warn!(
                    "preemption of {} on {} failed: {}",
                    target.victim, target.node_name, err
                );
                return EntryOutcome::Requeue(refresh(entry));
            }
            match client.bind(&entry.pod.identity, &target.node_name).await {
                Ok(BindOutcome::Committed) => {
                    info!(
                        "bound {} to {} after preempting {}",
                        entry.pod.identity, target.node_name, target.victim
                    );
                    EntryOutcome::Done(Some(Assignment {
                        pod: entry.pod.identity,
                        node_name: target.node_name,
                    }))
                }
                Ok(BindOutcome::Conflicted) => EntryOutcome::Done(None),
                Err(err) => {
                    warn!(
                        "bind of {} to {} after preemption failed: {}",
                        entry.pod.identity, target.node_name, err
                    );
                    EntryOutcome::Requeue(refresh(entry))
                }
            }
        }
        Ok(None) => {
            info!(
                "no node and no preemption target for {}, requeuing",
                entry.pod.identity
            );
            EntryOutcome::Requeue(refresh(entry))
        }
        Err(err) => {
            warn!(
                "preemption planning failed for {}: {}",
                entry.pod.identity, err
            );
            EntryOutcome::Requeue(refresh(entry))
        }
    }
}

async fn list_occupancy(
    client: &dyn ClusterClient,
    nodes: &[NodeRecord],
    config: &Config,
) -> Result<std::collections::HashMap<String, usize>, SchedulerError> {
    let mut map = std::collections::HashMap::with_capacity(nodes.len());
    for node in nodes.iter().filter(|n| is_ready(n)) {
        let pods = client.list_pods_on_node(&node.name).await?;
        map.insert(
            node.name.clone(),
            occupancy(&node.name, &pods, &config.preemption_domain_substring),
        );
    }
    Ok(map)
}

fn refresh(entry: QueueEntry) -> QueueEntry {
    QueueEntry {
        priority: entry.priority,
        enqueue_time: Instant::now(),
        pod: entry.pod,
    }
}

/// Drains the queue into a snapshot and processes each entry once.
pub async fn run_cycle(
    client: &dyn ClusterClient,
    queue: &mut SchedulingQueue,
    config: &Config,
) -> Vec<Assignment> {
    let drained = queue.drain();
    let mut assignments = Vec::new();
    for entry in drained {
        match schedule_entry(client, entry, config).await {
            EntryOutcome::Done(Some(assignment)) => assignments.push(assignment),
            EntryOutcome::Done(None) => {}
            EntryOutcome::Requeue(entry) => {
                queue.insert(entry.pod, entry.priority, entry.enqueue_time);
            }
        }
    }
    assignments
}
