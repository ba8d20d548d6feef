// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AddonError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Invalid policy rule: {0}")]
    InvalidRule(String),

    #[error("Invalid chart values: {0}")]
    ValuesError(String),

    #[error("Invalid chart bundle: {0}")]
    ChartError(String),

    #[error("Managed cluster not found: {0}")]
    ClusterNotFound(String),
}

pub type Result<T> = std::result::Result<T, AddonError>;
