use anyhow::Context;
use clap::Parser;
use log::{error, info};

use podsched::cli::Cli;
use podsched::config::Config;
use podsched::kube_client::KubeClusterClient;
use podsched::scheduler::Scheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let priority_annotation_key = cli.priority_annotation_key.clone();
    let config: Config = cli.into();
    config.validate().context("invalid configuration")?;

    info!(
        "starting as scheduler_name={} max_pods_per_node={}",
        config.scheduler_name, config.max_pods_per_node
    );

    let k8s_client = kube::Client::try_default()
        .await
        .context("failed to build Kubernetes client")?;
    let cluster_client = KubeClusterClient::new(k8s_client, priority_annotation_key);

    let mut scheduler = Scheduler::new(cluster_client, config);
    let err = scheduler.run().await;
    error!("watch loop exited: {}", err);
    Err(err).context("scheduling loop terminated")
}
