// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! RoleBinding reconciliation for an addon's cluster namespace

use crate::addon::registration::default_groups;
use crate::constants::rbac::{API_GROUP, CLUSTER_ROLE_KIND, GROUP_KIND};
use crate::error::Result;
use k8s_openapi::api::rbac::v1::{RoleBinding, RoleRef, Subject};
use kube::{
    api::{ObjectMeta, PostParams},
    Api, Client,
};
use tracing::{debug, info, instrument};

/// Desired RoleBinding granting the addon's agent group the named ClusterRole.
///
/// The binding carries the role's name and lives in the cluster's namespace.
pub fn desired_role_binding(cluster_name: &str, role_name: &str, addon_name: &str) -> RoleBinding {
    let groups = default_groups(cluster_name, addon_name);

    RoleBinding {
        metadata: ObjectMeta {
            name: Some(role_name.to_string()),
            namespace: Some(cluster_name.to_string()),
            ..Default::default()
        },
        role_ref: RoleRef {
            api_group: API_GROUP.to_string(),
            kind: CLUSTER_ROLE_KIND.to_string(),
            name: role_name.to_string(),
        },
        subjects: Some(vec![Subject {
            kind: GROUP_KIND.to_string(),
            api_group: Some(API_GROUP.to_string()),
            name: groups[0].clone(),
            namespace: None,
        }]),
    }
}

/// Copy the desired roleRef and subjects onto an observed binding.
/// Returns whether anything changed. Labels, annotations and other metadata are left alone.
fn merge_binding(observed: &mut RoleBinding, desired: RoleBinding) -> bool {
    let mut changed = false;

    if observed.role_ref != desired.role_ref {
        observed.role_ref = desired.role_ref;
        changed = true;
    }
    if observed.subjects != desired.subjects {
        observed.subjects = desired.subjects;
        changed = true;
    }

    changed
}

/// Create the addon's RoleBinding in the cluster namespace, or update it when roleRef or subjects drifted.
///
/// Issues at most one write. Any error other than a missing binding is returned as is.
#[instrument(skip(client))]
pub async fn reconcile_role_binding(
    client: &Client,
    cluster_name: &str,
    role_name: &str,
    addon_name: &str,
) -> Result<()> {
    let desired = desired_role_binding(cluster_name, role_name, addon_name);
    let bindings: Api<RoleBinding> = Api::namespaced(client.clone(), cluster_name);

    let mut binding = match bindings.get(role_name).await {
        Ok(binding) => binding,
        Err(kube::Error::Api(err)) if err.code == 404 => {
            info!("Creating RoleBinding {}/{}", cluster_name, role_name);
            bindings.create(&PostParams::default(), &desired).await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if !merge_binding(&mut binding, desired) {
        debug!("RoleBinding {}/{} is up to date", cluster_name, role_name);
        return Ok(());
    }

    info!("Updating RoleBinding {}/{}", cluster_name, role_name);
    bindings
        .replace(role_name, &PostParams::default(), &binding)
        .await?;

    Ok(())
}
