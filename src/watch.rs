//! Classifies cluster pod events into queue admission/removal and drives a
//! scheduling cycle after each one.

use futures::StreamExt;
use log::{error, warn};
use tokio::time::Instant;

use crate::cluster::{ClusterClient, PodEvent};
use crate::config::Config;
use crate::cycle::run_cycle;
use crate::error::SchedulerError;
use crate::models::{Assignment, PodRecord};
use crate::queue::SchedulingQueue;

/// Runs the watch loop until the underlying stream fails. Returns the fatal
/// error on exit; the caller (the binary edge) decides how to react.
pub async fn run(
    client: &dyn ClusterClient,
    queue: &mut SchedulingQueue,
    config: &Config,
) -> SchedulerError {
    let mut stream = match client.watch_pods().await {
        Ok(stream) => stream,
        Err(err) => return err,
    };

    loop {
        match stream.next().await {
            Some(Ok(event)) => {
                let assignments = handle_event(client, queue, config, event).await;
                for assignment in assignments {
                    log::debug!(
                        "cycle produced assignment {} -> {}",
                        assignment.pod,
                        assignment.node_name
                    );
                }
            }
            Some(Err(err)) => {
                warn!("transient error reading watch stream: {}", err);
            }
            None => {
                let err = SchedulerError::WatchStreamFatal("stream ended".to_string());
                error!("{}", err);
                return err;
            }
        }
    }
}

async fn handle_event(
    client: &dyn ClusterClient,
    queue: &mut SchedulingQueue,
    config: &Config,
    event: PodEvent,
) -> Vec<Assignment> {
    match event {
        PodEvent::Added(pod) | PodEvent::Modified(pod) => {
            admit(queue, config, pod);
            run_cycle(client, queue, config).await
        }
        PodEvent::Deleted(identity) => {
            queue.remove(&identity);
            run_cycle(client, queue, config).await
        }
    }
}

fn admit(queue: &mut SchedulingQueue, config: &Config, pod: PodRecord) {
    queue.remove(&pod.identity);
    if pod.is_admissible(&config.scheduler_name) {
        let priority = pod.priority;
        queue.insert(pod, priority, Instant::now());
    }
}
