use std::time::Duration;

use clap::Parser;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "podsched", version, about = "Custom priority scheduler for a container orchestration cluster")]
pub struct Cli {
    /// Scheduler name this process advertises and matches pods against.
    #[arg(long, env = "PODSCHED_SCHEDULER_NAME", default_value = "custom-scheduler")]
    pub scheduler_name: String,

    /// Hard cap on preemption-domain pods per node.
    #[arg(long, env = "PODSCHED_MAX_PODS_PER_NODE", default_value_t = 2)]
    pub max_pods_per_node: usize,

    /// Case-insensitive substring gating which pods count toward occupancy and eviction.
    #[arg(long, env = "PODSCHED_PREEMPTION_DOMAIN_SUBSTRING", default_value = "priority")]
    pub preemption_domain_substring: String,

    /// Quiet period after an eviction before the freed capacity is used, e.g. "1s", "500ms".
    #[arg(long, env = "PODSCHED_POST_EVICTION_WAIT", default_value = "1s", value_parser = parse_duration_arg)]
    pub post_eviction_wait: Duration,

    /// Annotation key carrying a pod's scheduling priority.
    #[arg(
        long,
        env = "PODSCHED_PRIORITY_ANNOTATION_KEY",
        default_value = "scheduler.alpha.kubernetes.io/priority"
    )]
    pub priority_annotation_key: String,
}

fn parse_duration_arg(raw: &str) -> Result<Duration, String> {
    parse_duration::parse(raw).map_err(|e| e.to_string())
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Config {
            scheduler_name: cli.scheduler_name,
            max_pods_per_node: cli.max_pods_per_node,
            preemption_domain_substring: cli.preemption_domain_substring,
            post_eviction_wait: cli.post_eviction_wait,
            priority_annotation_key: cli.priority_annotation_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_into_the_documented_config() {
        let cli = Cli::parse_from(["podsched"]);
        let config: Config = cli.into();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn duration_flag_accepts_human_readable_strings() {
        let cli = Cli::parse_from(["podsched", "--post-eviction-wait", "2s"]);
        assert_eq!(cli.post_eviction_wait, Duration::from_secs(2));
    }
}
