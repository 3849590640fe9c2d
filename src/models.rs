use std::fmt;

use tokio::time::Instant;

/// The queue's equality key: a pod is uniquely identified by namespace + name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PodIdentity {
    pub namespace: String,
    pub name: String,
}

impl PodIdentity {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for PodIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    /// A pod in one of these phases can no longer occupy node capacity.
    pub fn is_terminal(self) -> bool {
        matches!(self, PodPhase::Succeeded | PodPhase::Failed)
    }
}

/// The subset of a pod object the core consumes. Fields beyond these are never read.
#[derive(Debug, Clone)]
pub struct PodRecord {
    pub identity: PodIdentity,
    pub scheduler_name: String,
    pub node_name: Option<String>,
    pub phase: PodPhase,
    pub priority: i64,
}

impl PodRecord {
    /// Eligible for the active queue: unbound, pending, and claiming this scheduler.
    pub fn is_admissible(&self, configured_scheduler_name: &str) -> bool {
        self.scheduler_name == configured_scheduler_name
            && self.node_name.is_none()
            && self.phase == PodPhase::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct NodeCondition {
    pub kind: String,
    pub status: ConditionStatus,
}

#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub name: String,
    pub conditions: Vec<NodeCondition>,
    /// Resource name (`cpu`, `memory`, ...) to quantity string (`"4"`, `"8Gi"`, ...).
    pub allocatable: std::collections::HashMap<String, String>,
}

/// A pending pod together with the ordering keys used by the scheduling queue.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub priority: i64,
    pub enqueue_time: Instant,
    pub pod: PodRecord,
}

/// The outcome of a successful placement, reported out of a scheduling cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub pod: PodIdentity,
    pub node_name: String,
}
