// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Installation of the ClusterRole granted to the agent

use crate::constants::OPERATOR_NAME;
use crate::error::Result;
use crate::rbac::rules::build_role_rules;
use k8s_openapi::api::rbac::v1::ClusterRole;
use kube::{
    api::{ObjectMeta, Patch, PatchParams},
    Api, Client,
};
use tracing::{info, instrument};

/// Build the agent's ClusterRole from the fixed rule table
pub fn desired_cluster_role(name: &str) -> Result<ClusterRole> {
    Ok(ClusterRole {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        rules: Some(build_role_rules()?),
        ..Default::default()
    })
}

/// Apply the agent's ClusterRole (create or update)
#[instrument(skip(client))]
pub async fn ensure_cluster_role(client: &Client, name: &str) -> Result<()> {
    let roles: Api<ClusterRole> = Api::all(client.clone());
    let role = desired_cluster_role(name)?;

    let pp = PatchParams::apply(OPERATOR_NAME).force();
    roles.patch(name, &pp, &Patch::Apply(&role)).await?;

    info!("ClusterRole {} applied", name);
    Ok(())
}
