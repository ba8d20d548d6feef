// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes reconcilers that react to watch events.

pub mod addon;
pub mod cluster;
pub mod csr;

pub use addon::AddonReconciler;
pub use cluster::ClusterReconciler;
pub use csr::CsrReconciler;
