// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{CLUSTER_ROLE_NAME, DEFAULT_INSTALL_NAMESPACE, WORK_MANAGER_ADDON_NAME};
use anyhow::{Context, Result};
use std::env;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Agent image injected as `global.imageOverrides.multicloud_manager`
    pub addon_image: String,
    pub addon_name: String,
    /// Namespace on the managed cluster the agent is installed into
    pub install_namespace: String,
    pub cluster_role_name: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let addon_image =
            env::var("ADDON_IMAGE").context("ADDON_IMAGE environment variable not set")?;

        Ok(Config {
            addon_image,
            addon_name: var_or("ADDON_NAME", WORK_MANAGER_ADDON_NAME),
            install_namespace: var_or("ADDON_INSTALL_NAMESPACE", DEFAULT_INSTALL_NAMESPACE),
            cluster_role_name: var_or("CLUSTER_ROLE_NAME", CLUSTER_ROLE_NAME),
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
