// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::types::cluster::Condition;
use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(
    group = "addon.open-cluster-management.io",
    version = "v1alpha1",
    kind = "ManagedClusterAddOn"
)]
#[kube(namespaced)]
#[kube(status = "ManagedClusterAddOnStatus")]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterAddOnSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_namespace: Option<String>,
}

impl ManagedClusterAddOn {
    /// Namespace on the managed cluster to install into, falling back to `default` when unset or empty
    pub fn install_namespace_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.spec
            .install_namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .unwrap_or(default)
    }

    /// The managed cluster this addon belongs to. Addons live in the cluster's namespace.
    pub fn cluster_name(&self) -> String {
        self.namespace().unwrap_or_default()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterAddOnStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
}
