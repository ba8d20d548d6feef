// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Read-only bundle of the agent's Helm chart files

use crate::error::{AddonError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const CHART_DIR: &str = "manifests/chart";
pub const CHART_FILE: &str = "Chart.yaml";
pub const VALUES_FILE: &str = "values.yaml";

/// Chart files compiled into the binary, relative to the chart directory
const EMBEDDED_FILES: &[(&str, &str)] = &[
    ("Chart.yaml", include_str!("manifests/chart/Chart.yaml")),
    ("values.yaml", include_str!("manifests/chart/values.yaml")),
    ("templates/_helpers.tpl", include_str!("manifests/chart/templates/_helpers.tpl")),
    ("templates/deployment.yaml", include_str!("manifests/chart/templates/deployment.yaml")),
    ("templates/service.yaml", include_str!("manifests/chart/templates/service.yaml")),
];

/// `Chart.yaml` fields the addon cares about
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub app_version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// An immutable set of chart files keyed by their path inside the chart directory
#[derive(Clone, Debug)]
pub struct ChartBundle {
    dir: String,
    files: BTreeMap<String, String>,
}

impl ChartBundle {
    pub fn new(dir: &str) -> Self {
        Self {
            dir: dir.to_string(),
            files: BTreeMap::new(),
        }
    }

    pub fn with_file(mut self, path: &str, contents: &str) -> Self {
        self.files.insert(path.to_string(), contents.to_string());
        self
    }

    /// The work-manager chart shipped with the operator
    pub fn embedded() -> Self {
        EMBEDDED_FILES
            .iter()
            .fold(Self::new(CHART_DIR), |bundle, (path, contents)| {
                bundle.with_file(path, contents)
            })
    }

    pub fn dir(&self) -> &str {
        &self.dir
    }

    pub fn file(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn metadata(&self) -> Result<ChartMetadata> {
        let contents = self.file(CHART_FILE).ok_or_else(|| {
            AddonError::ChartError(format!("{} missing from {}", CHART_FILE, self.dir))
        })?;

        serde_yaml::from_str(contents)
            .map_err(|e| AddonError::ChartError(format!("Failed to parse {}: {}", CHART_FILE, e)))
    }

    /// Default values from `values.yaml`. A chart without one has no defaults.
    pub fn default_values(&self) -> Result<Value> {
        let Some(contents) = self.file(VALUES_FILE).filter(|c| !c.trim().is_empty()) else {
            return Ok(Value::Object(Map::new()));
        };

        let values: Value = serde_yaml::from_str(contents)
            .map_err(|e| AddonError::ChartError(format!("Failed to parse {}: {}", VALUES_FILE, e)))?;

        match values {
            Value::Null => Ok(Value::Object(Map::new())),
            Value::Object(_) => Ok(values),
            other => Err(AddonError::ChartError(format!(
                "{} must contain a mapping, got {}",
                VALUES_FILE, other
            ))),
        }
    }
}
