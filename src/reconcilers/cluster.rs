// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster reconciler - installs the addon on every managed cluster.

use crate::addon::AgentAddon;
use crate::error::{AddonError, Result};
use crate::types::addon::{ManagedClusterAddOn, ManagedClusterAddOnSpec};
use crate::types::ManagedCluster;
use futures::StreamExt;
use kube::{
    api::PostParams,
    runtime::{controller::Action, Controller},
    Api, Client, ResourceExt,
};
use kube_runtime::reflector::ObjectRef;
use kube_runtime::watcher::Config as WatcherConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

pub struct ClusterReconciler {
    client: Client,
    addon: Arc<AgentAddon>,
}

impl ClusterReconciler {
    pub fn new(client: Client, addon: Arc<AgentAddon>) -> Self {
        Self { client, addon }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let clusters: Api<ManagedCluster> = Api::all(self.client.clone());
        let addons: Api<ManagedClusterAddOn> = Api::all(self.client.clone());
        let addon_config =
            WatcherConfig::default().fields(&format!("metadata.name={}", self.addon.name()));
        let context = Arc::new(self);

        // A deleted addon re-triggers its cluster so the addon is installed again
        Controller::new(clusters, WatcherConfig::default())
            .watches(addons, addon_config, owning_cluster)
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled managed cluster: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }
}

fn owning_cluster(addon: ManagedClusterAddOn) -> Option<ObjectRef<ManagedCluster>> {
    let cluster_name = addon.cluster_name();
    (!cluster_name.is_empty()).then(|| ObjectRef::new(&cluster_name))
}

async fn reconcile(cluster: Arc<ManagedCluster>, ctx: Arc<ClusterReconciler>) -> Result<Action> {
    let name = cluster.name_any();

    if cluster.is_being_deleted() {
        debug!("Skipping managed cluster {} being deleted", name);
        return Ok(Action::await_change());
    }

    debug!("Reconciling managed cluster: {}", name);
    ensure_addon_installed(
        &ctx.client,
        &name,
        ctx.addon.name(),
        ctx.addon.install_namespace(),
    )
    .await?;

    Ok(Action::await_change())
}

/// Ensure the addon has a ManagedClusterAddOn in the cluster's namespace, create if it doesn't
#[instrument(skip(client))]
pub async fn ensure_addon_installed(
    client: &Client,
    cluster_name: &str,
    addon_name: &str,
    install_namespace: &str,
) -> Result<()> {
    let addons: Api<ManagedClusterAddOn> = Api::namespaced(client.clone(), cluster_name);

    match addons.get(addon_name).await {
        Ok(_) => {
            debug!("Addon {} already installed on cluster {}", addon_name, cluster_name);
            Ok(())
        }
        Err(kube::Error::Api(err)) if err.code == 404 => {
            info!("Installing addon {} on cluster {}", addon_name, cluster_name);
            let mut addon = ManagedClusterAddOn::new(
                addon_name,
                ManagedClusterAddOnSpec {
                    install_namespace: Some(install_namespace.to_string()),
                },
            );
            addon.metadata.namespace = Some(cluster_name.to_string());

            addons.create(&PostParams::default(), &addon).await?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn error_policy(
    _cluster: Arc<ManagedCluster>,
    error: &AddonError,
    _ctx: Arc<ClusterReconciler>,
) -> Action {
    error!("Reconciliation error: {}", error);
    Action::requeue(Duration::from_secs(60))
}
