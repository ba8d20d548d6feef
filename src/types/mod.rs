// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Custom resources of the cluster-management hub.

pub mod addon;
pub mod cluster;

pub use addon::ManagedClusterAddOn;
pub use cluster::ManagedCluster;
