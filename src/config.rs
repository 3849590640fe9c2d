//! Runtime configuration, assembled by `cli.rs` and validated once at startup.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub scheduler_name: String,
    pub max_pods_per_node: usize,
    pub preemption_domain_substring: String,
    #[serde(with = "duration_secs")]
    pub post_eviction_wait: Duration,
    pub priority_annotation_key: String,
}

/// (De)serializes a `Duration` as a number of seconds, since `serde` has no
/// built-in representation for `std::time::Duration`.
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheduler_name: "custom-scheduler".to_string(),
            max_pods_per_node: 2,
            preemption_domain_substring: "priority".to_string(),
            post_eviction_wait: Duration::from_secs(1),
            priority_annotation_key: "scheduler.alpha.kubernetes.io/priority".to_string(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.max_pods_per_node < 1 {
            return Err(SchedulerError::InvalidConfig(
                "max_pods_per_node must be at least 1".to_string(),
            ));
        }
        if self.scheduler_name.trim().is_empty() {
            return Err(SchedulerError::InvalidConfig(
                "scheduler_name must not be empty".to_string(),
            ));
        }
        if self.preemption_domain_substring.trim().is_empty() {
            return Err(SchedulerError::InvalidConfig(
                "preemption_domain_substring must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
