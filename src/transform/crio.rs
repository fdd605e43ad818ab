use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::manifest::domain_manifest;
use super::report::{ComponentReport, Report};
use super::{Extraction, Output, Transform, TransformError};
use crate::fetch::Fetcher;
use crate::resources::{ObjectMeta, Resource};

const API_VERSION: &str = "machineconfiguration.openshift.io/v1";
const RESOURCE_NAME: &str = "set-log-and-pid";

/// The `crio.conf` sections that can be carried over.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CrioConfig {
    pub crio: CrioSection,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CrioSection {
    pub runtime: RuntimeSection,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RuntimeSection {
    pub pids_limit: Option<i64>,
    pub log_level: Option<String>,
    pub log_size_max: Option<i64>,
}

impl RuntimeSection {
    fn is_empty(&self) -> bool {
        self.pids_limit.is_none() && self.log_level.is_none() && self.log_size_max.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRuntimeConfigSpec {
    pub machine_config_pool_selector: PoolSelector,
    pub container_runtime_config: RuntimeSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSelector {
    pub match_labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pids_limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_size_max: Option<i64>,
}

pub struct CrioTransform<'a> {
    fetcher: &'a dyn Fetcher,
    crio_config_file: String,
}

impl<'a> CrioTransform<'a> {
    pub fn new<S: Into<String>>(fetcher: &'a dyn Fetcher, crio_config_file: S) -> Self {
        Self {
            fetcher,
            crio_config_file: crio_config_file.into(),
        }
    }
}

impl Transform for CrioTransform<'_> {
    fn name(&self) -> &str {
        "Crio"
    }

    fn extract(&self) -> Result<Box<dyn Extraction>, TransformError> {
        info!("CrioTransform::Extract");
        let content = self.fetcher.fetch(&self.crio_config_file)?;
        let content = String::from_utf8_lossy(&content);
        let config: CrioConfig = toml::from_str(&content)
            .map_err(|e| TransformError::Parse(self.crio_config_file.clone(), e.to_string()))?;
        Ok(Box::new(CrioExtraction {
            runtime: config.crio.runtime,
        }))
    }
}

#[derive(Debug)]
pub struct CrioExtraction {
    runtime: RuntimeSection,
}

impl CrioExtraction {
    fn report(&self) -> ComponentReport {
        let mut component = ComponentReport::new("Crio");
        if let Some(pids_limit) = self.runtime.pids_limit {
            component.push(Report::supported(pids_limit.to_string(), "pidsLimit"));
        }
        if let Some(log_level) = &self.runtime.log_level {
            component.push(Report::supported(log_level, "logLevel"));
        }
        if let Some(log_size_max) = self.runtime.log_size_max {
            component.push(Report::supported(log_size_max.to_string(), "logSizeMax"));
        }
        component
    }
}

impl Extraction for CrioExtraction {
    fn validate(&self) -> Result<(), TransformError> {
        if self.runtime.is_empty() {
            return Err(TransformError::Invalid(
                "no supported crio configuration found".to_string(),
            ));
        }
        Ok(())
    }

    fn transform(&self) -> Result<Vec<Output>, TransformError> {
        info!("CrioTransform::Transform");
        let spec = ContainerRuntimeConfigSpec {
            machine_config_pool_selector: PoolSelector {
                match_labels: BTreeMap::from([(
                    "custom-crio".to_string(),
                    "high-pid-limit".to_string(),
                )]),
            },
            container_runtime_config: RuntimeSettings {
                pids_limit: self.runtime.pids_limit,
                log_level: self.runtime.log_level.clone(),
                log_size_max: self.runtime.log_size_max,
            },
        };
        let resource = Resource::new(
            API_VERSION,
            "ContainerRuntimeConfig",
            ObjectMeta::named(RESOURCE_NAME),
            spec,
        );

        Ok(vec![
            Output::Manifests(vec![domain_manifest("crio", &resource)?]),
            Output::Report(self.report()),
        ])
    }
}
