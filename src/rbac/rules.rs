// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Policy rules granted to the work-manager agent

use crate::error::{AddonError, Result};
use k8s_openapi::api::rbac::v1::PolicyRule;

/// API groups served by the hub components the agent talks to
pub mod groups {
    pub const CORE: &str = "";
    pub const PROXY: &str = "proxy.open-cluster-management.io";
    pub const INTERNAL: &str = "internal.open-cluster-management.io";
    pub const ACTION: &str = "action.open-cluster-management.io";
    pub const VIEW: &str = "view.open-cluster-management.io";
    pub const APPS: &str = "apps.open-cluster-management.io";
}

/// Builds a validated [`PolicyRule`]
#[derive(Debug, Clone, Default)]
pub struct PolicyRuleBuilder {
    verbs: Vec<String>,
    api_groups: Vec<String>,
    resources: Vec<String>,
    resource_names: Vec<String>,
    non_resource_urls: Vec<String>,
}

impl PolicyRuleBuilder {
    pub fn new(verbs: &[&str]) -> Self {
        Self {
            verbs: to_strings(verbs),
            ..Default::default()
        }
    }

    pub fn groups(mut self, groups: &[&str]) -> Self {
        self.api_groups.extend(to_strings(groups));
        self
    }

    pub fn resources(mut self, resources: &[&str]) -> Self {
        self.resources.extend(to_strings(resources));
        self
    }

    pub fn names(mut self, names: &[&str]) -> Self {
        self.resource_names.extend(to_strings(names));
        self
    }

    pub fn urls(mut self, urls: &[&str]) -> Self {
        self.non_resource_urls.extend(to_strings(urls));
        self
    }

    /// Validate and produce the rule. Every list in the result is sorted.
    pub fn rule(self) -> Result<PolicyRule> {
        if self.verbs.is_empty() {
            return Err(AddonError::InvalidRule(format!(
                "verbs are required: {:?}",
                self
            )));
        }

        if !self.non_resource_urls.is_empty() {
            if !self.api_groups.is_empty()
                || !self.resources.is_empty()
                || !self.resource_names.is_empty()
            {
                return Err(AddonError::InvalidRule(format!(
                    "non-resource rule may not have apiGroups, resources, or resourceNames: {:?}",
                    self
                )));
            }
        } else if !self.resources.is_empty() {
            if self.api_groups.is_empty() {
                return Err(AddonError::InvalidRule(format!(
                    "resource rule must have apiGroups: {:?}",
                    self
                )));
            }
        } else {
            return Err(AddonError::InvalidRule(format!(
                "a rule must have either nonResourceURLs or resources: {:?}",
                self
            )));
        }

        Ok(PolicyRule {
            verbs: sorted(self.verbs),
            api_groups: non_empty(self.api_groups),
            resources: non_empty(self.resources),
            resource_names: non_empty(self.resource_names),
            non_resource_urls: non_empty(self.non_resource_urls),
        })
    }
}

/// Rules of the ClusterRole bound to the agent in every cluster namespace
pub fn build_role_rules() -> Result<Vec<PolicyRule>> {
    use groups::*;

    [
        PolicyRuleBuilder::new(&["create", "get"]).groups(&[PROXY]).resources(&["clusterstatuses/aggregator"]),
        PolicyRuleBuilder::new(&["get", "list", "watch"]).groups(&[INTERNAL]).resources(&["clusterinfos"]),
        PolicyRuleBuilder::new(&["update", "patch"]).groups(&[INTERNAL]).resources(&["clusterinfos/status"]),
        PolicyRuleBuilder::new(&["get", "list", "watch"]).groups(&[ACTION]).resources(&["clusteractions"]),
        PolicyRuleBuilder::new(&["update", "patch"]).groups(&[ACTION]).resources(&["clusteractions/status"]),
        PolicyRuleBuilder::new(&["get", "list", "watch"]).groups(&[VIEW]).resources(&["spokeviews"]),
        PolicyRuleBuilder::new(&["update", "patch"]).groups(&[VIEW]).resources(&["spokeviews/status"]),
        // deployables
        PolicyRuleBuilder::new(&["get", "list", "watch"]).groups(&[APPS]).resources(&["deployables"]),
        PolicyRuleBuilder::new(&["patch", "update"]).groups(&[APPS]).resources(&["deployables/status"]),
        PolicyRuleBuilder::new(&["create", "update", "patch"]).groups(&[CORE]).resources(&["events"]),
        PolicyRuleBuilder::new(&["create", "update", "delete"]).groups(&[CORE]).resources(&["secrets"]),
        PolicyRuleBuilder::new(&["create", "get", "list", "watch"]).groups(&[CORE]).resources(&["secrets"]),
    ]
    .into_iter()
    .map(PolicyRuleBuilder::rule)
    .collect()
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn sorted(mut values: Vec<String>) -> Vec<String> {
    values.sort();
    values
}

fn non_empty(values: Vec<String>) -> Option<Vec<String>> {
    (!values.is_empty()).then(|| sorted(values))
}
