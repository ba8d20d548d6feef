// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Waiting for the hub's open-cluster-management CRDs to be served

use crate::constants::crd::{POLL_INTERVAL_SECS, POLL_MAX_INTERVAL_SECS};
use crate::error::Result;
use kube::{core::GroupVersionKind, discovery::Discovery, Client, Resource};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Block until the API server serves `K`, backing off from POLL_INTERVAL_SECS up to POLL_MAX_INTERVAL_SECS.
pub async fn wait_for_crd<K>(client: &Client) -> Result<()>
where
    K: Resource<DynamicType = ()>,
{
    let gvk = gvk_of::<K>();
    let mut interval = POLL_INTERVAL_SECS;

    loop {
        match is_served(client, &gvk).await {
            Ok(true) => {
                info!("{}/{} {} is served", gvk.group, gvk.version, gvk.kind);
                return Ok(());
            }
            Ok(false) => info!(
                "{}/{} {} not served yet, next check in {}s",
                gvk.group, gvk.version, gvk.kind, interval
            ),
            Err(e) => warn!("Discovery of {} failed: {}, next check in {}s", gvk.kind, e, interval),
        }

        sleep(Duration::from_secs(interval)).await;
        interval = next_interval(interval);
    }
}

fn gvk_of<K>() -> GroupVersionKind
where
    K: Resource<DynamicType = ()>,
{
    GroupVersionKind::gvk(&K::group(&()), &K::version(&()), &K::kind(&()))
}

fn next_interval(interval: u64) -> u64 {
    (interval * 2).min(POLL_MAX_INTERVAL_SECS)
}

async fn is_served(client: &Client, gvk: &GroupVersionKind) -> Result<bool> {
    let discovery = Discovery::new(client.clone())
        .filter(&[gvk.group.as_str()])
        .run()
        .await?;

    let found = discovery.resolve_gvk(gvk).is_some();
    debug!("Discovery for {}: found={}", gvk.kind, found);
    Ok(found)
}
