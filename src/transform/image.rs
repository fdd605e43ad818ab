use serde::Serialize;
use tracing::info;

use super::manifest::domain_manifest;
use super::report::{ComponentReport, Report};
use super::{Extraction, Output, Transform, TransformError, fetch_master_config};
use crate::fetch::Fetcher;
use crate::master_config::ImagePolicyConfig;
use crate::resources::{ObjectMeta, Resource};

pub(crate) const CONFIG_API_VERSION: &str = "config.openshift.io/v1";
pub(crate) const CREATE_ONLY_ANNOTATION: &str = "release.openshift.io/create-only";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSpec {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_registries_for_import: Vec<AllowedRegistry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub external_registry_hostnames: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowedRegistry {
    pub domain_name: String,
    pub insecure: bool,
}

pub struct ImageTransform<'a> {
    fetcher: &'a dyn Fetcher,
    master_config_file: String,
}

impl<'a> ImageTransform<'a> {
    pub fn new<S: Into<String>>(fetcher: &'a dyn Fetcher, master_config_file: S) -> Self {
        Self {
            fetcher,
            master_config_file: master_config_file.into(),
        }
    }
}

impl Transform for ImageTransform<'_> {
    fn name(&self) -> &str {
        "Image"
    }

    fn extract(&self) -> Result<Box<dyn Extraction>, TransformError> {
        info!("ImageTransform::Extract");
        let master_config = fetch_master_config(self.fetcher, &self.master_config_file)?;
        Ok(Box::new(ImageExtraction {
            policy: master_config.image_policy_config.unwrap_or_default(),
        }))
    }
}

#[derive(Debug)]
pub struct ImageExtraction {
    policy: ImagePolicyConfig,
}

impl ImageExtraction {
    fn report(&self) -> ComponentReport {
        let policy = &self.policy;
        let mut component = ComponentReport::new("Image");

        for registry in &policy.allowed_registries_for_import {
            component.push(Report::supported(
                &registry.domain_name,
                "AllowedRegistriesForImport",
            ));
        }
        if !policy.external_registry_hostname.is_empty() {
            component.push(Report::supported(
                &policy.external_registry_hostname,
                "ExternalRegistryHostnames",
            ));
        }

        let unsupported = [
            ("AdditionalTrustedCA", !policy.additional_trusted_ca.is_empty()),
            ("InternalRegistryHostname", !policy.internal_registry_hostname.is_empty()),
            ("DisableScheduledImport", policy.disable_scheduled_import),
            (
                "MaxImagesBulkImportedPerRepository",
                policy.max_images_bulk_imported_per_repository != 0,
            ),
            (
                "MaxScheduledImageImportsPerMinute",
                policy.max_scheduled_image_imports_per_minute != 0,
            ),
            (
                "ScheduledImageImportMinimumIntervalSeconds",
                policy.scheduled_image_import_minimum_interval_seconds != 0,
            ),
        ];
        for (kind, set) in unsupported {
            if set {
                component.push(
                    Report::unsupported(kind, kind).with_comment("Not supported by OCP4"),
                );
            }
        }

        component
    }
}

impl Extraction for ImageExtraction {
    fn validate(&self) -> Result<(), TransformError> {
        if self.policy.is_empty() {
            return Err(TransformError::Invalid(
                "no image policy configuration detected, not generating a cr or report".to_string(),
            ));
        }
        Ok(())
    }

    fn transform(&self) -> Result<Vec<Output>, TransformError> {
        info!("ImageTransform::Transform");
        let spec = ImageSpec {
            allowed_registries_for_import: self
                .policy
                .allowed_registries_for_import
                .iter()
                .map(|registry| AllowedRegistry {
                    domain_name: registry.domain_name.clone(),
                    insecure: registry.insecure,
                })
                .collect(),
            external_registry_hostnames: Some(&self.policy.external_registry_hostname)
                .filter(|hostname| !hostname.is_empty())
                .cloned()
                .into_iter()
                .collect(),
        };
        let metadata = ObjectMeta::named("cluster").with_annotation(CREATE_ONLY_ANNOTATION, "true");
        let image = Resource::new(CONFIG_API_VERSION, "Image", metadata, spec);

        Ok(vec![
            Output::Manifests(vec![domain_manifest("image", &image)?]),
            Output::Report(self.report()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::tests::MockFetcher;
    use crate::master_config::tests::MASTER_CONFIG;
    use crate::transform::report::Confidence;
    use assert_matches::assert_matches;

    fn extract(master_config: &'static str) -> Box<dyn Extraction> {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .returning(move |_| Ok(master_config.as_bytes().to_vec()));
        ImageTransform::new(&fetcher, "/etc/origin/master/master-config.yaml")
            .extract()
            .unwrap()
    }

    #[test]
    fn builds_image_resource() {
        let extraction = extract(MASTER_CONFIG);
        extraction.validate().unwrap();
        let outputs = extraction.transform().unwrap();

        let manifests = assert_matches!(&outputs[0], Output::Manifests(m) => m);
        assert_eq!(manifests[0].file_name(), "100_CPMA-cluster-config-image.yaml");
        let image: serde_yaml::Value = serde_yaml::from_slice(manifests[0].content()).unwrap();
        assert_eq!(image["apiVersion"], "config.openshift.io/v1");
        assert_eq!(image["kind"], "Image");
        assert_eq!(
            image["metadata"]["annotations"]["release.openshift.io/create-only"],
            "true"
        );
        let allowed = &image["spec"]["allowedRegistriesForImport"];
        assert_eq!(allowed[0]["domainName"], "docker.io");
        assert_eq!(allowed[0]["insecure"], false);
        assert_eq!(allowed[1]["domainName"], "registry.example.com");
        assert_eq!(allowed[1]["insecure"], true);
        assert_eq!(
            image["spec"]["externalRegistryHostnames"][0],
            "registry.apps.example.com"
        );
    }

    #[test]
    fn unsupported_settings_are_reported() {
        let outputs = extract(MASTER_CONFIG).transform().unwrap();
        let report = assert_matches!(&outputs[1], Output::Report(r) => r);

        let rows: Vec<(&str, Confidence)> = report
            .reports
            .iter()
            .map(|r| (r.kind.as_str(), r.confidence))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("AllowedRegistriesForImport", Confidence::FullConfidence),
                ("AllowedRegistriesForImport", Confidence::FullConfidence),
                ("ExternalRegistryHostnames", Confidence::FullConfidence),
                ("InternalRegistryHostname", Confidence::Unsupported),
                ("MaxImagesBulkImportedPerRepository", Confidence::Unsupported),
            ]
        );
    }

    #[test]
    fn missing_policy_fails_validation() {
        let err = extract("kind: MasterConfig\n").validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "no image policy configuration detected, not generating a cr or report"
        );
    }
}
