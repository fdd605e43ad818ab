use serde::Serialize;
use tracing::info;

use super::image::CONFIG_API_VERSION;
use super::manifest::domain_manifest;
use super::report::{ComponentReport, Report};
use super::{Extraction, Output, Transform, TransformError, fetch_master_config};
use crate::fetch::Fetcher;
use crate::resources::{ObjectMeta, Resource};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerSpec {
    pub default_node_selector: String,
}

pub struct SchedulerTransform<'a> {
    fetcher: &'a dyn Fetcher,
    master_config_file: String,
}

impl<'a> SchedulerTransform<'a> {
    pub fn new<S: Into<String>>(fetcher: &'a dyn Fetcher, master_config_file: S) -> Self {
        Self {
            fetcher,
            master_config_file: master_config_file.into(),
        }
    }
}

impl Transform for SchedulerTransform<'_> {
    fn name(&self) -> &str {
        "Scheduler"
    }

    fn extract(&self) -> Result<Box<dyn Extraction>, TransformError> {
        info!("SchedulerTransform::Extract");
        let master_config = fetch_master_config(self.fetcher, &self.master_config_file)?;
        Ok(Box::new(SchedulerExtraction {
            default_node_selector: master_config
                .project_config
                .map(|project| project.default_node_selector)
                .unwrap_or_default(),
        }))
    }
}

#[derive(Debug)]
pub struct SchedulerExtraction {
    default_node_selector: String,
}

impl Extraction for SchedulerExtraction {
    fn validate(&self) -> Result<(), TransformError> {
        if self.default_node_selector.is_empty() {
            return Err(TransformError::Invalid(
                "DefaultNodeSelector can't be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn transform(&self) -> Result<Vec<Output>, TransformError> {
        info!("SchedulerTransform::Transform");
        let spec = SchedulerSpec {
            default_node_selector: self.default_node_selector.clone(),
        };
        let scheduler =
            Resource::new(CONFIG_API_VERSION, "Scheduler", ObjectMeta::named("cluster"), spec);

        let mut report = ComponentReport::new("Scheduler");
        report.push(Report::supported(
            &self.default_node_selector,
            "DefaultNodeSelector",
        ));

        Ok(vec![
            Output::Manifests(vec![domain_manifest("scheduler", &scheduler)?]),
            Output::Report(report),
        ])
    }
}
