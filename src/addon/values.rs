// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Helm values computed for each managed cluster

use crate::constants::{annotations, values};
use crate::error::{AddonError, Result};
use crate::types::{ManagedCluster, ManagedClusterAddOn};
use kube::ResourceExt;
use serde_json::{json, Map, Value};

/// A source of chart values for an addon on a given cluster.
/// Later sources override earlier ones when the addon's values are assembled.
pub trait ValuesProvider: Send + Sync {
    fn values(&self, cluster: &ManagedCluster, addon: &ManagedClusterAddOn) -> Result<Value>;
}

/// Image, pull settings and platform flag derived from the target cluster
#[derive(Debug, Clone)]
pub struct ClusterValues {
    image: String,
}

impl ClusterValues {
    pub fn new(image: &str) -> Self {
        Self {
            image: image.to_string(),
        }
    }
}

impl ValuesProvider for ClusterValues {
    fn values(&self, cluster: &ManagedCluster, _addon: &ManagedClusterAddOn) -> Result<Value> {
        Ok(cluster_values(cluster, &self.image))
    }
}

/// User overrides read from the addon's values annotation
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationValues;

impl ValuesProvider for AnnotationValues {
    fn values(&self, _cluster: &ManagedCluster, addon: &ManagedClusterAddOn) -> Result<Value> {
        annotation_values(addon)
    }
}

/// Values for the work-manager agent on `cluster`. `isOCP` is only set for OpenShift clusters.
pub fn cluster_values(cluster: &ManagedCluster, image: &str) -> Value {
    let mut image_overrides = Map::new();
    image_overrides.insert(values::IMAGE_KEY.to_string(), Value::from(image));

    let mut tree = Map::new();
    tree.insert(
        "global".to_string(),
        json!({
            "imagePullPolicy": values::IMAGE_PULL_POLICY,
            "imagePullSecret": values::IMAGE_PULL_SECRET,
            "imageOverrides": image_overrides,
            "nodeSelector": {},
        }),
    );
    if cluster.is_openshift() {
        tree.insert("isOCP".to_string(), Value::Bool(true));
    }

    Value::Object(tree)
}

/// Values every chart receives regardless of providers
pub fn builtin_values(cluster_name: &str, install_namespace: &str) -> Value {
    json!({
        "clusterName": cluster_name,
        "addonInstallNamespace": install_namespace,
    })
}

/// Parse the JSON object in the addon's values annotation. Missing or blank annotations yield no values.
pub fn annotation_values(addon: &ManagedClusterAddOn) -> Result<Value> {
    let raw = addon
        .annotations()
        .get(annotations::VALUES)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty());

    let Some(raw) = raw else {
        return Ok(Value::Object(Map::new()));
    };

    let parsed: Value = serde_json::from_str(raw).map_err(|e| {
        AddonError::ValuesError(format!(
            "Failed to parse {} annotation on {}/{}: {}",
            annotations::VALUES,
            addon.namespace().unwrap_or_default(),
            addon.name_any(),
            e
        ))
    })?;

    if !parsed.is_object() {
        return Err(AddonError::ValuesError(format!(
            "{} annotation on {}/{} must be a JSON object",
            annotations::VALUES,
            addon.namespace().unwrap_or_default(),
            addon.name_any()
        )));
    }

    Ok(parsed)
}

/// Deep-merge `overlay` into `base`. Nested objects merge key by key; anything else in the overlay wins.
pub fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
