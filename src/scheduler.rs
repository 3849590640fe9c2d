//! Top-level orchestrator: owns the queue and the injected cluster client,
//! wires them into the watch dispatcher.

use crate::cluster::ClusterClient;
use crate::config::Config;
use crate::error::SchedulerError;
use crate::queue::SchedulingQueue;
use crate::watch;

pub struct Scheduler<C: ClusterClient> {
    client: C,
    queue: SchedulingQueue,
    config: Config,
}

impl<C: ClusterClient> Scheduler<C> {
    pub fn new(client: C, config: Config) -> Self {
        Self {
            client,
            queue: SchedulingQueue::new(),
            config,
        }
    }

    /// Runs the watch loop until the cluster's event stream fails fatally.
    pub async fn run(&mut self) -> SchedulerError {
        watch::run(&self.client, &mut self.queue, &self.config).await
    }
}
