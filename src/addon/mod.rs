// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Assembly of the work-manager addon: chart, values and registration.

pub mod chart;
pub mod registration;
pub mod values;

pub use chart::ChartBundle;
pub use registration::{default_groups, default_user, RegistrationOption};
pub use values::{AnnotationValues, ClusterValues, ValuesProvider};

use crate::config::Config;
use crate::constants::{CLUSTER_ROLE_NAME, DEFAULT_INSTALL_NAMESPACE};
use crate::error::{AddonError, Result};
use crate::types::{ManagedCluster, ManagedClusterAddOn};
use kube::ResourceExt;
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// A fully configured addon, shared read-only by the reconcilers
pub struct AgentAddon {
    name: String,
    chart: ChartBundle,
    providers: Vec<Box<dyn ValuesProvider>>,
    registration: RegistrationOption,
    install_namespace: String,
}

impl fmt::Debug for AgentAddon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentAddon")
            .field("name", &self.name)
            .field("chart", &self.chart.dir())
            .field("providers", &self.providers.len())
            .field("install_namespace", &self.install_namespace)
            .finish()
    }
}

impl AgentAddon {
    pub fn builder(name: &str, chart: ChartBundle) -> AgentAddonBuilder {
        AgentAddonBuilder {
            name: name.to_string(),
            chart,
            providers: Vec::new(),
            registration: None,
            install_namespace: DEFAULT_INSTALL_NAMESPACE.to_string(),
        }
    }

    /// The work-manager addon as configured for this operator
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::builder(&config.addon_name, ChartBundle::embedded())
            .with_values(ClusterValues::new(&config.addon_image))
            .with_values(AnnotationValues)
            .with_registration(RegistrationOption::new(
                &config.addon_name,
                &config.cluster_role_name,
            ))
            .with_install_namespace(&config.install_namespace)
            .build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chart(&self) -> &ChartBundle {
        &self.chart
    }

    pub fn registration(&self) -> &RegistrationOption {
        &self.registration
    }

    /// Default namespace on managed clusters for new addon installations
    pub fn install_namespace(&self) -> &str {
        &self.install_namespace
    }

    /// Chart values for `addon` on `cluster`: chart defaults, then built-in values, then each provider in order
    pub fn values(&self, cluster: &ManagedCluster, addon: &ManagedClusterAddOn) -> Result<Value> {
        let mut merged = self.chart.default_values()?;

        values::merge_values(
            &mut merged,
            values::builtin_values(
                &cluster.name_any(),
                addon.install_namespace_or(&self.install_namespace),
            ),
        );
        for provider in &self.providers {
            values::merge_values(&mut merged, provider.values(cluster, addon)?);
        }

        debug!("Computed values for addon {} on cluster {}", self.name, cluster.name_any());
        Ok(merged)
    }
}

pub struct AgentAddonBuilder {
    name: String,
    chart: ChartBundle,
    providers: Vec<Box<dyn ValuesProvider>>,
    registration: Option<RegistrationOption>,
    install_namespace: String,
}

impl AgentAddonBuilder {
    pub fn with_values(mut self, provider: impl ValuesProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn with_registration(mut self, registration: RegistrationOption) -> Self {
        self.registration = Some(registration);
        self
    }

    pub fn with_install_namespace(mut self, namespace: &str) -> Self {
        self.install_namespace = namespace.to_string();
        self
    }

    pub fn build(self) -> Result<AgentAddon> {
        let metadata = self.chart.metadata()?;
        debug!(
            "Building addon {} from chart {} {}",
            self.name, metadata.name, metadata.version
        );
        // Fail early on a chart whose defaults cannot be read
        self.chart.default_values()?;

        if self.install_namespace.is_empty() {
            return Err(AddonError::ChartError(format!(
                "Addon {} has an empty install namespace",
                self.name
            )));
        }

        let registration = self
            .registration
            .unwrap_or_else(|| RegistrationOption::new(&self.name, CLUSTER_ROLE_NAME));

        Ok(AgentAddon {
            name: self.name,
            chart: self.chart,
            providers: self.providers,
            registration,
            install_namespace: self.install_namespace,
        })
    }
}
