// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::values::{OPENSHIFT_PRODUCT, PRODUCT_CLAIM};
use kube::CustomResource;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "cluster.open-cluster-management.io", version = "v1", kind = "ManagedCluster")]
#[kube(status = "ManagedClusterStatus")]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterSpec {
    #[serde(default)]
    pub hub_accepts_client: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lease_duration_seconds: Option<i32>,
}

impl ManagedCluster {
    /// Value of the named cluster claim, if the cluster reports it
    pub fn claim(&self, name: &str) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.cluster_claims.as_ref())
            .and_then(|claims| claims.iter().find(|c| c.name == name))
            .map(|c| c.value.as_str())
    }

    /// Check if the cluster reports itself as an OpenShift cluster
    pub fn is_openshift(&self) -> bool {
        self.claim(PRODUCT_CLAIM) == Some(OPENSHIFT_PRODUCT)
    }

    pub fn is_being_deleted(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_claims: Option<Vec<ClusterClaim>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<ClusterVersion>,
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
pub struct ClusterClaim {
    pub name: String,
    pub value: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
pub struct ClusterVersion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubernetes: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
