// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Agent registration: client certificate identity, CSR approval and hub permissions

use crate::constants::csr::KUBE_APISERVER_CLIENT_SIGNER;
use crate::constants::rbac::{ALL_AUTHENTICATED, OCM_PREFIX};
use crate::error::Result;
use crate::rbac::reconcile_role_binding;
use crate::types::{ManagedCluster, ManagedClusterAddOn};
use k8s_openapi::api::certificates::v1::CertificateSigningRequest;
use kube::{Client, ResourceExt};
use std::collections::BTreeSet;
use tracing::{info, instrument};
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::{FromDer, X509CertificationRequest};

const CSR_PEM_LABEL: &str = "CERTIFICATE REQUEST";

/// Groups carried by an addon agent's client certificate. The first is specific to the cluster.
pub fn default_groups(cluster_name: &str, addon_name: &str) -> Vec<String> {
    vec![
        format!("{}:cluster:{}:addon:{}", OCM_PREFIX, cluster_name, addon_name),
        format!("{}:addon:{}", OCM_PREFIX, addon_name),
        ALL_AUTHENTICATED.to_string(),
    ]
}

/// User name of an addon agent's client certificate
pub fn default_user(cluster_name: &str, addon_name: &str, agent_name: &str) -> String {
    format!(
        "{}:cluster:{}:addon:{}:agent:{}",
        OCM_PREFIX, cluster_name, addon_name, agent_name
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSubject {
    pub user: String,
    pub groups: Vec<String>,
}

/// A certificate the agent requests from the hub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationConfig {
    pub signer_name: String,
    pub subject: CertificateSubject,
}

/// How the addon's agent registers with the hub and what it is allowed to do there
#[derive(Debug, Clone)]
pub struct RegistrationOption {
    addon_name: String,
    agent_name: String,
    role_name: String,
}

impl RegistrationOption {
    /// The agent signs its requests under the addon's own name
    pub fn new(addon_name: &str, role_name: &str) -> Self {
        Self {
            addon_name: addon_name.to_string(),
            agent_name: addon_name.to_string(),
            role_name: role_name.to_string(),
        }
    }

    pub fn addon_name(&self) -> &str {
        &self.addon_name
    }

    /// Client certificates the agent on `cluster` should request
    pub fn csr_configurations(&self, cluster: &ManagedCluster) -> Vec<RegistrationConfig> {
        let cluster_name = cluster.name_any();

        vec![RegistrationConfig {
            signer_name: KUBE_APISERVER_CLIENT_SIGNER.to_string(),
            subject: CertificateSubject {
                user: default_user(&cluster_name, &self.addon_name, &self.agent_name),
                groups: default_groups(&cluster_name, &self.addon_name),
            },
        }]
    }

    /// Whether a CSR filed for the addon on `cluster` may be approved automatically.
    ///
    /// The request must target the kube-apiserver client signer, be filed by the cluster's
    /// registration agent, and ask for exactly the default user and groups.
    pub fn approve_csr(
        &self,
        cluster: &ManagedCluster,
        addon: &ManagedClusterAddOn,
        csr: &CertificateSigningRequest,
    ) -> bool {
        let cluster_name = cluster.name_any();
        let csr_name = csr.name_any();

        if csr.spec.signer_name != KUBE_APISERVER_CLIENT_SIGNER {
            info!("CSR {} uses signer {}, not approving", csr_name, csr.spec.signer_name);
            return false;
        }

        let requester_prefix = format!("{}:{}:", OCM_PREFIX, cluster_name);
        let from_cluster_agent = csr
            .spec
            .username
            .as_deref()
            .is_some_and(|u| u.starts_with(&requester_prefix));
        if !from_cluster_agent {
            info!(
                "CSR {} was not requested by the registration agent of cluster {}",
                csr_name, cluster_name
            );
            return false;
        }

        let Some(subject) = parse_csr_subject(&csr.spec.request.0) else {
            info!("CSR {} does not contain a PEM certificate request", csr_name);
            return false;
        };

        let expected_groups: BTreeSet<String> = default_groups(&cluster_name, &addon.name_any())
            .into_iter()
            .collect();
        let requested_groups: BTreeSet<String> = subject.groups.into_iter().collect();
        if requested_groups != expected_groups {
            info!(
                "CSR {} requests organizations {:?}, expected {:?}",
                csr_name, requested_groups, expected_groups
            );
            return false;
        }

        let expected_user = default_user(&cluster_name, &addon.name_any(), &self.agent_name);
        if subject.user != expected_user {
            info!(
                "CSR {} requests common name {}, expected {}",
                csr_name, subject.user, expected_user
            );
            return false;
        }

        true
    }

    /// Grant the agent on `cluster` its hub permissions
    #[instrument(skip(self, client, cluster, addon), fields(cluster = %cluster.name_any(), addon = %addon.name_any()))]
    pub async fn apply_permissions(
        &self,
        client: &Client,
        cluster: &ManagedCluster,
        addon: &ManagedClusterAddOn,
    ) -> Result<()> {
        reconcile_role_binding(client, &cluster.name_any(), &self.role_name, &self.addon_name).await
    }
}

/// Common name and organizations of a PEM encoded certificate request
fn parse_csr_subject(request: &[u8]) -> Option<CertificateSubject> {
    let (_, pem) = parse_x509_pem(request).ok()?;
    if pem.label != CSR_PEM_LABEL {
        return None;
    }

    let (_, csr) = X509CertificationRequest::from_der(&pem.contents).ok()?;
    let subject = &csr.certification_request_info.subject;

    let user = subject
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())?
        .to_string();
    let groups = subject
        .iter_organization()
        .map(|o| o.as_str().map(str::to_string))
        .collect::<std::result::Result<Vec<_>, _>>()
        .ok()?;

    Some(CertificateSubject { user, groups })
}
