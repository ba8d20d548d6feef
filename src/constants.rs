// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Name under which the addon is registered with the hub
pub const WORK_MANAGER_ADDON_NAME: &str = "work-manager";

/// ClusterRole granted to the agent. The RoleBinding in each cluster namespace shares the name.
pub const CLUSTER_ROLE_NAME: &str = "managed-cluster-workmgr";

/// Namespace the agent is installed into when the addon does not name one
pub const DEFAULT_INSTALL_NAMESPACE: &str = "open-cluster-management-agent-addon";

/// The operator name used for server-side apply
pub const OPERATOR_NAME: &str = "work-manager-addon";

/// Kubernetes annotation keys read from ManagedClusterAddOn objects
pub mod annotations {
    /// JSON object merged over the computed chart values
    pub const VALUES: &str = "addon.open-cluster-management.io/values";
}

/// Labels set by the registration agent on addon CSRs
pub mod labels {
    pub const CLUSTER_NAME: &str = "open-cluster-management.io/cluster-name";
    pub const ADDON_NAME: &str = "open-cluster-management.io/addon-name";
}

/// RBAC identifiers
pub mod rbac {
    pub const API_GROUP: &str = "rbac.authorization.k8s.io";
    pub const CLUSTER_ROLE_KIND: &str = "ClusterRole";
    pub const GROUP_KIND: &str = "Group";
    pub const ALL_AUTHENTICATED: &str = "system:authenticated";
    /// Prefix shared by every identity issued for managed clusters
    pub const OCM_PREFIX: &str = "system:open-cluster-management";
}

/// Certificate signing
pub mod csr {
    pub const KUBE_APISERVER_CLIENT_SIGNER: &str = "kubernetes.io/kube-apiserver-client";
    pub const APPROVED_REASON: &str = "AutoApprovedByHubCSRApprovingController";
}

/// Chart value defaults
pub mod values {
    pub const IMAGE_PULL_POLICY: &str = "IfNotPresent";
    pub const IMAGE_PULL_SECRET: &str = "open-cluster-management-image-pull-credentials";
    /// Key under `global.imageOverrides` holding the agent image
    pub const IMAGE_KEY: &str = "multicloud_manager";
    /// Cluster claim identifying the managed cluster's product
    pub const PRODUCT_CLAIM: &str = "product.open-cluster-management.io";
    pub const OPENSHIFT_PRODUCT: &str = "OpenShift";
}

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}
