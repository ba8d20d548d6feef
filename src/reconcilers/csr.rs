// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CSR reconciler - approves client certificate requests filed by the addon's agents.

use crate::addon::AgentAddon;
use crate::constants::csr::APPROVED_REASON;
use crate::constants::labels;
use crate::error::{AddonError, Result};
use crate::types::{ManagedCluster, ManagedClusterAddOn};
use futures::StreamExt;
use k8s_openapi::api::certificates::v1::CertificateSigningRequest;
use kube::{
    api::{Patch, PatchParams},
    runtime::{controller::Action, Controller},
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

pub struct CsrReconciler {
    client: Client,
    addon: Arc<AgentAddon>,
}

impl CsrReconciler {
    pub fn new(client: Client, addon: Arc<AgentAddon>) -> Self {
        Self { client, addon }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let csrs: Api<CertificateSigningRequest> = Api::all(self.client.clone());
        let watcher_config = WatcherConfig::default()
            .labels(&format!("{}={}", labels::ADDON_NAME, self.addon.name()));
        let context = Arc::new(self);

        Controller::new(csrs, watcher_config)
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled CSR: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }
}

/// CSRs never change on their own, so one waiting on its cluster or addon is polled
const PENDING_RECHECK: Duration = Duration::from_secs(60);

/// Outcome of checking a CSR against the addon's registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approval {
    Approved,
    Skipped,
    /// The managed cluster or its addon does not exist yet
    Pending,
}

async fn reconcile(csr: Arc<CertificateSigningRequest>, ctx: Arc<CsrReconciler>) -> Result<Action> {
    match approve_if_eligible(&ctx.client, &ctx.addon, &csr).await? {
        Approval::Pending => Ok(Action::requeue(PENDING_RECHECK)),
        Approval::Approved | Approval::Skipped => Ok(Action::await_change()),
    }
}

/// Check if the CSR already carries an approval decision
pub fn is_decided(csr: &CertificateSigningRequest) -> bool {
    csr.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Approved" || c.type_ == "Denied")
        })
}

/// Approve the CSR when it belongs to the addon and passes the registration check
#[instrument(skip(client, agent_addon, csr), fields(csr = %csr.name_any()))]
pub async fn approve_if_eligible(
    client: &Client,
    agent_addon: &AgentAddon,
    csr: &CertificateSigningRequest,
) -> Result<Approval> {
    let csr_labels = csr.labels();

    let Some(cluster_name) = csr_labels.get(labels::CLUSTER_NAME) else {
        debug!("CSR has no cluster label, skipping");
        return Ok(Approval::Skipped);
    };
    if csr_labels.get(labels::ADDON_NAME).map(String::as_str) != Some(agent_addon.name()) {
        debug!("CSR belongs to another addon, skipping");
        return Ok(Approval::Skipped);
    }
    if is_decided(csr) {
        debug!("CSR already approved or denied");
        return Ok(Approval::Skipped);
    }

    let clusters: Api<ManagedCluster> = Api::all(client.clone());
    let Some(cluster) = clusters.get_opt(cluster_name).await? else {
        info!("Managed cluster {} not found yet, not approving", cluster_name);
        return Ok(Approval::Pending);
    };

    let addons: Api<ManagedClusterAddOn> = Api::namespaced(client.clone(), cluster_name);
    let Some(addon) = addons.get_opt(agent_addon.name()).await? else {
        info!(
            "Addon {} not installed on cluster {}, not approving",
            agent_addon.name(),
            cluster_name
        );
        return Ok(Approval::Pending);
    };

    if !agent_addon.registration().approve_csr(&cluster, &addon, csr) {
        return Ok(Approval::Skipped);
    }

    let patch = json!({
        "status": {
            "conditions": [{
                "type": "Approved",
                "status": "True",
                "reason": APPROVED_REASON,
                "message": format!("Auto approving {} agent certificate", agent_addon.name()),
            }]
        }
    });
    let csrs: Api<CertificateSigningRequest> = Api::all(client.clone());
    csrs.patch_approval(&csr.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
        .await?;

    info!("Approved CSR for addon {} on cluster {}", agent_addon.name(), cluster_name);
    Ok(Approval::Approved)
}

fn error_policy(
    _csr: Arc<CertificateSigningRequest>,
    error: &AddonError,
    _ctx: Arc<CsrReconciler>,
) -> Action {
    error!("Reconciliation error: {}", error);
    Action::requeue(Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addon::{ChartBundle, RegistrationOption};
    use crate::constants::csr::KUBE_APISERVER_CLIENT_SIGNER;
    use crate::test_utils::MockService;
    use k8s_openapi::api::certificates::v1::{
        CertificateSigningRequestCondition, CertificateSigningRequestSpec,
        CertificateSigningRequestStatus,
    };
    use k8s_openapi::ByteString;
    use kube::api::ObjectMeta;
    use std::collections::BTreeMap;

    const AGENT_CSR: &str = include_str!("../addon/testdata/agent.csr");
    const CLUSTER_PATH: &str = "/apis/cluster.open-cluster-management.io/v1/managedclusters/c1";
    const ADDON_PATH: &str =
        "/apis/addon.open-cluster-management.io/v1alpha1/namespaces/c1/managedclusteraddons/wm";
    const APPROVAL_PATH: &str =
        "/apis/certificates.k8s.io/v1/certificatesigningrequests/addon-c1-wm-abcde/approval";

    fn agent_addon() -> AgentAddon {
        AgentAddon::builder("wm", ChartBundle::embedded())
            .with_registration(RegistrationOption::new("wm", "managed-cluster-workmgr"))
            .build()
            .unwrap()
    }

    fn make_csr(addon_label: &str, conditions: Option<Vec<CertificateSigningRequestCondition>>) -> CertificateSigningRequest {
        CertificateSigningRequest {
            metadata: ObjectMeta {
                name: Some("addon-c1-wm-abcde".to_string()),
                labels: Some(BTreeMap::from([
                    (labels::CLUSTER_NAME.to_string(), "c1".to_string()),
                    (labels::ADDON_NAME.to_string(), addon_label.to_string()),
                ])),
                ..Default::default()
            },
            spec: CertificateSigningRequestSpec {
                request: ByteString(AGENT_CSR.as_bytes().to_vec()),
                signer_name: KUBE_APISERVER_CLIENT_SIGNER.to_string(),
                username: Some("system:open-cluster-management:c1:x7k2p".to_string()),
                ..Default::default()
            },
            status: conditions.map(|conditions| CertificateSigningRequestStatus {
                conditions: Some(conditions),
                ..Default::default()
            }),
        }
    }

    fn cluster_json() -> String {
        json!({
            "apiVersion": "cluster.open-cluster-management.io/v1",
            "kind": "ManagedCluster",
            "metadata": { "name": "c1" },
            "spec": { "hubAcceptsClient": true }
        })
        .to_string()
    }

    fn addon_json() -> String {
        json!({
            "apiVersion": "addon.open-cluster-management.io/v1alpha1",
            "kind": "ManagedClusterAddOn",
            "metadata": { "name": "wm", "namespace": "c1" },
            "spec": {}
        })
        .to_string()
    }

    fn approved_condition() -> CertificateSigningRequestCondition {
        CertificateSigningRequestCondition {
            type_: "Approved".to_string(),
            status: "True".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_is_decided() {
        assert!(!is_decided(&make_csr("wm", None)));
        assert!(!is_decided(&make_csr("wm", Some(vec![]))));
        assert!(is_decided(&make_csr("wm", Some(vec![approved_condition()]))));

        let denied = CertificateSigningRequestCondition {
            type_: "Denied".to_string(),
            status: "True".to_string(),
            ..Default::default()
        };
        assert!(is_decided(&make_csr("wm", Some(vec![denied]))));
    }

    #[tokio::test]
    async fn test_approves_agent_csr() {
        let csr = make_csr("wm", None);
        let mock = MockService::new()
            .on_get(CLUSTER_PATH, 200, &cluster_json())
            .on_get(ADDON_PATH, 200, &addon_json())
            .on_patch(APPROVAL_PATH, 200, &serde_json::to_string(&csr).unwrap());

        let outcome = approve_if_eligible(&mock.client(), &agent_addon(), &csr)
            .await
            .unwrap();

        assert_eq!(outcome, Approval::Approved);
        let writes = mock.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].path, APPROVAL_PATH);

        let patch: serde_json::Value = writes[0].json();
        assert_eq!(patch["status"]["conditions"][0]["type"], "Approved");
        assert_eq!(patch["status"]["conditions"][0]["reason"], APPROVED_REASON);
    }

    #[tokio::test]
    async fn test_skips_other_addon() {
        let csr = make_csr("other", None);
        let mock = MockService::new();

        let outcome = approve_if_eligible(&mock.client(), &agent_addon(), &csr)
            .await
            .unwrap();

        assert_eq!(outcome, Approval::Skipped);
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_skips_decided_csr() {
        let csr = make_csr("wm", Some(vec![approved_condition()]));
        let mock = MockService::new();

        let outcome = approve_if_eligible(&mock.client(), &agent_addon(), &csr)
            .await
            .unwrap();

        assert_eq!(outcome, Approval::Skipped);
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_cluster_is_pending() {
        let csr = make_csr("wm", None);
        let mock = MockService::new();

        let outcome = approve_if_eligible(&mock.client(), &agent_addon(), &csr)
            .await
            .unwrap();

        assert_eq!(outcome, Approval::Pending);
        assert!(mock.writes().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_foreign_requester() {
        let mut csr = make_csr("wm", None);
        csr.spec.username = Some("system:serviceaccount:default:builder".to_string());
        let mock = MockService::new()
            .on_get(CLUSTER_PATH, 200, &cluster_json())
            .on_get(ADDON_PATH, 200, &addon_json());

        let outcome = approve_if_eligible(&mock.client(), &agent_addon(), &csr)
            .await
            .unwrap();

        assert_eq!(outcome, Approval::Skipped);
        assert!(mock.writes().is_empty());
    }

    #[tokio::test]
    async fn test_addon_not_installed_is_rechecked() {
        let csr = make_csr("wm", None);
        let mock = MockService::new().on_get(CLUSTER_PATH, 200, &cluster_json());
        let ctx = Arc::new(CsrReconciler::new(mock.client(), Arc::new(agent_addon())));

        let action = reconcile(Arc::new(csr), ctx).await.unwrap();

        assert_eq!(action, Action::requeue(PENDING_RECHECK));
        assert!(mock.writes().is_empty());
    }

    #[tokio::test]
    async fn test_decided_csr_awaits_change() {
        let csr = make_csr("wm", Some(vec![approved_condition()]));
        let mock = MockService::new();
        let ctx = Arc::new(CsrReconciler::new(mock.client(), Arc::new(agent_addon())));

        let action = reconcile(Arc::new(csr), ctx).await.unwrap();

        assert_eq!(action, Action::await_change());
    }
}
