// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use std::sync::Arc;
use tracing::{info, warn};

use work_manager_addon::addon::AgentAddon;
use work_manager_addon::config::Config;
use work_manager_addon::kubernetes::wait_for_crd;
use work_manager_addon::rbac::ensure_cluster_role;
use work_manager_addon::reconcilers::{AddonReconciler, ClusterReconciler, CsrReconciler};
use work_manager_addon::types::{ManagedCluster, ManagedClusterAddOn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting work-manager addon manager");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: addon={} image={} install_namespace={}",
        config.addon_name, config.addon_image, config.install_namespace
    );

    let addon = Arc::new(AgentAddon::from_config(&config)?);

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to hub cluster");

    ensure_cluster_role(&client, &config.cluster_role_name).await?;

    // Both CRDs must be served before the reconcilers start watching them
    info!("Waiting for ManagedCluster and ManagedClusterAddOn CRDs...");
    wait_for_crd::<ManagedCluster>(&client).await?;
    wait_for_crd::<ManagedClusterAddOn>(&client).await?;

    let cluster_reconciler = ClusterReconciler::new(client.clone(), addon.clone());
    let addon_reconciler = AddonReconciler::new(client.clone(), addon.clone());
    let csr_reconciler = CsrReconciler::new(client, addon);

    info!("Starting reconcilers...");

    tokio::try_join!(
        cluster_reconciler.run(),
        addon_reconciler.run(),
        csr_reconciler.run()
    )?;

    // This should never be reached as reconcilers run forever
    warn!("All reconcilers stopped unexpectedly");
    Ok(())
}
