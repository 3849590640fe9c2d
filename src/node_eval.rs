//! Pure predicates over node/pod snapshots: readiness, occupancy, and scoring.

use crate::models::{ConditionStatus, NodeRecord, PodRecord};
use crate::quantity::parse_quantity;

const GIBIBYTE: f64 = 1024.0 * 1024.0 * 1024.0;

pub fn is_ready(node: &NodeRecord) -> bool {
    node.conditions
        .iter()
        .any(|c| c.kind == "Ready" && c.status == ConditionStatus::True)
}

/// A pod participates in occupancy accounting and preemption iff its name,
/// lowercased, contains `domain_substring` (also compared lowercased).
pub fn in_preemption_domain(pod_name: &str, domain_substring: &str) -> bool {
    pod_name
        .to_lowercase()
        .contains(&domain_substring.to_lowercase())
}

/// Count of live preemption-domain pods bound to `node_name`.
pub fn occupancy(node_name: &str, pods: &[PodRecord], domain_substring: &str) -> usize {
    pods.iter()
        .filter(|p| p.node_name.as_deref() == Some(node_name))
        .filter(|p| !p.phase.is_terminal())
        .filter(|p| in_preemption_domain(&p.identity.name, domain_substring))
        .count()
}

/// Returns `None` (treated as `-inf`) once occupancy has hit the cap;
/// otherwise the node's remaining allocatable capacity, cpu cores plus
/// memory gibibytes, favoring larger nodes.
pub fn score(node: &NodeRecord, occupancy_count: usize, max_pods_per_node: usize) -> Option<f64> {
    if occupancy_count >= max_pods_per_node {
        return None;
    }
    let cpu = node
        .allocatable
        .get("cpu")
        .and_then(|v| parse_quantity(v).ok())
        .unwrap_or(0.0);
    let memory = node
        .allocatable
        .get("memory")
        .and_then(|v| parse_quantity(v).ok())
        .unwrap_or(0.0);
    Some(cpu + memory / GIBIBYTE)
}
