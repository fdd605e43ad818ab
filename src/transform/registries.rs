use serde::{Deserialize, Serialize};
use tracing::info;

use super::image::{CONFIG_API_VERSION, CREATE_ONLY_ANNOTATION};
use super::manifest::domain_manifest;
use super::report::{ComponentReport, Report};
use super::{Extraction, Output, Transform, TransformError};
use crate::fetch::Fetcher;
use crate::resources::{ObjectMeta, Resource};

/// `registries.conf` (v1 format).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RegistriesConfig {
    pub registries: RegistryLists,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RegistryLists {
    pub search: RegistryList,
    pub insecure: RegistryList,
    pub block: RegistryList,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RegistryList {
    pub registries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySourcesSpec {
    pub registry_sources: RegistrySources,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySources {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocked_registries: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub insecure_registries: Vec<String>,
}

pub struct RegistriesTransform<'a> {
    fetcher: &'a dyn Fetcher,
    registries_config_file: String,
}

impl<'a> RegistriesTransform<'a> {
    pub fn new<S: Into<String>>(fetcher: &'a dyn Fetcher, registries_config_file: S) -> Self {
        Self {
            fetcher,
            registries_config_file: registries_config_file.into(),
        }
    }
}

impl Transform for RegistriesTransform<'_> {
    fn name(&self) -> &str {
        "Registries"
    }

    fn extract(&self) -> Result<Box<dyn Extraction>, TransformError> {
        info!("RegistriesTransform::Extract");
        let content = self.fetcher.fetch(&self.registries_config_file)?;
        let content = String::from_utf8_lossy(&content);
        let config: RegistriesConfig = toml::from_str(&content).map_err(|e| {
            TransformError::Parse(self.registries_config_file.clone(), e.to_string())
        })?;
        Ok(Box::new(RegistriesExtraction {
            registries: config.registries,
        }))
    }
}

#[derive(Debug)]
pub struct RegistriesExtraction {
    registries: RegistryLists,
}

impl RegistriesExtraction {
    fn report(&self) -> ComponentReport {
        let mut component = ComponentReport::new("Registries");
        for registry in &self.registries.block.registries {
            component.push(Report::supported(registry, "Blocked"));
        }
        for registry in &self.registries.insecure.registries {
            component.push(Report::supported(registry, "Insecure"));
        }
        for registry in &self.registries.search.registries {
            component.push(
                Report::unsupported(registry, "Search")
                    .with_comment("Search registries can not be configured in OCP 4"),
            );
        }
        component
    }
}

impl Extraction for RegistriesExtraction {
    fn validate(&self) -> Result<(), TransformError> {
        let lists = &self.registries;
        if lists.search.registries.is_empty()
            && lists.insecure.registries.is_empty()
            && lists.block.registries.is_empty()
        {
            return Err(TransformError::Invalid(
                "no configured registries detected, not generating a cr or report".to_string(),
            ));
        }
        Ok(())
    }

    fn transform(&self) -> Result<Vec<Output>, TransformError> {
        info!("RegistriesTransform::Transform");
        let spec = RegistrySourcesSpec {
            registry_sources: RegistrySources {
                blocked_registries: self.registries.block.registries.clone(),
                insecure_registries: self.registries.insecure.registries.clone(),
            },
        };
        let metadata = ObjectMeta::named("cluster").with_annotation(CREATE_ONLY_ANNOTATION, "true");
        let image = Resource::new(CONFIG_API_VERSION, "Image", metadata, spec);

        Ok(vec![
            Output::Manifests(vec![domain_manifest("registries", &image)?]),
            Output::Report(self.report()),
        ])
    }
}
