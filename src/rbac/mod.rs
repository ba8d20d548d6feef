// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! RBAC objects managed for the addon: the agent's ClusterRole and its per-cluster RoleBinding.

pub mod binding;
pub mod cluster_role;
pub mod rules;

pub use binding::{desired_role_binding, reconcile_role_binding};
pub use cluster_role::ensure_cluster_role;
pub use rules::{build_role_rules, PolicyRuleBuilder};
