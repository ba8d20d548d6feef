// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Addon reconciler - keeps the agent's hub permissions in place for each installed addon.

use crate::addon::AgentAddon;
use crate::error::{AddonError, Result};
use crate::types::{ManagedCluster, ManagedClusterAddOn};
use futures::StreamExt;
use kube::{
    runtime::{controller::Action, Controller},
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// RoleBindings are not watched, so drift is picked up on this interval
const RESYNC_INTERVAL: Duration = Duration::from_secs(600);

pub struct AddonReconciler {
    client: Client,
    addon: Arc<AgentAddon>,
}

impl AddonReconciler {
    pub fn new(client: Client, addon: Arc<AgentAddon>) -> Self {
        Self { client, addon }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let addons: Api<ManagedClusterAddOn> = Api::all(self.client.clone());
        let watcher_config =
            WatcherConfig::default().fields(&format!("metadata.name={}", self.addon.name()));
        let context = Arc::new(self);

        Controller::new(addons, watcher_config)
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled addon: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }
}

async fn reconcile(addon: Arc<ManagedClusterAddOn>, ctx: Arc<AddonReconciler>) -> Result<Action> {
    if addon.name_any() != ctx.addon.name() {
        return Ok(Action::await_change());
    }

    debug!(
        "Reconciling addon {} on cluster {}",
        addon.name_any(),
        addon.cluster_name()
    );
    apply_addon_permissions(&ctx.client, &ctx.addon, &addon).await?;

    Ok(Action::requeue(RESYNC_INTERVAL))
}

/// Look up the addon's managed cluster and apply the agent's permissions for it
pub async fn apply_addon_permissions(
    client: &Client,
    agent_addon: &AgentAddon,
    addon: &ManagedClusterAddOn,
) -> Result<()> {
    let cluster_name = addon.cluster_name();
    let clusters: Api<ManagedCluster> = Api::all(client.clone());

    let cluster = clusters
        .get_opt(&cluster_name)
        .await?
        .ok_or(AddonError::ClusterNotFound(cluster_name))?;

    agent_addon
        .registration()
        .apply_permissions(client, &cluster, addon)
        .await
}

fn error_policy(
    _addon: Arc<ManagedClusterAddOn>,
    error: &AddonError,
    _ctx: Arc<AddonReconciler>,
) -> Action {
    error!("Reconciliation error: {}", error);
    Action::requeue(Duration::from_secs(60))
}
