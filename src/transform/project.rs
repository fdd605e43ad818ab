use serde::Serialize;
use tracing::info;

use super::image::CONFIG_API_VERSION;
use super::manifest::domain_manifest;
use super::report::{ComponentReport, Report};
use super::{Extraction, Output, Transform, TransformError, fetch_master_config};
use crate::fetch::Fetcher;
use crate::master_config::ProjectConfig;
use crate::oauth::NameReference;
use crate::resources::{ObjectMeta, Resource};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSpec {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub project_request_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_request_template: Option<NameReference>,
}

pub struct ProjectTransform<'a> {
    fetcher: &'a dyn Fetcher,
    master_config_file: String,
}

impl<'a> ProjectTransform<'a> {
    pub fn new<S: Into<String>>(fetcher: &'a dyn Fetcher, master_config_file: S) -> Self {
        Self {
            fetcher,
            master_config_file: master_config_file.into(),
        }
    }
}

impl Transform for ProjectTransform<'_> {
    fn name(&self) -> &str {
        "Project"
    }

    fn extract(&self) -> Result<Box<dyn Extraction>, TransformError> {
        info!("ProjectTransform::Extract");
        let master_config = fetch_master_config(self.fetcher, &self.master_config_file)?;
        Ok(Box::new(ProjectExtraction {
            project: master_config.project_config,
        }))
    }
}

#[derive(Debug)]
pub struct ProjectExtraction {
    project: Option<ProjectConfig>,
}

impl ProjectExtraction {
    fn report(project: &ProjectConfig) -> ComponentReport {
        let mut component = ComponentReport::new("Project");

        if !project.project_request_message.is_empty() {
            component.push(Report::supported(
                &project.project_request_message,
                "ProjectRequestMessage",
            ));
        }
        if !project.project_request_template.is_empty() {
            component.push(Report::supported(
                &project.project_request_template,
                "ProjectRequestTemplate",
            ));
        }
        if !project.default_node_selector.is_empty() {
            component.push(
                Report::unsupported(&project.default_node_selector, "DefaultNodeSelector")
                    .with_comment("Migrated by the Scheduler resource"),
            );
        }
        if let Some(allocator) = &project.security_allocator {
            let fields = [
                ("UIDAllocatorRange", allocator.uid_allocator_range.clone()),
                ("MCSAllocatorRange", allocator.mcs_allocator_range.clone()),
                ("MCSLabelsPerProject", allocator.mcs_labels_per_project.to_string()),
            ];
            for (kind, value) in fields {
                component.push(
                    Report::unsupported(value, kind)
                        .with_comment("Security allocator can't be configured in OCP4"),
                );
            }
        }

        component
    }
}

impl Extraction for ProjectExtraction {
    fn validate(&self) -> Result<(), TransformError> {
        if self.project.is_none() {
            return Err(TransformError::Invalid(
                "no project configuration detected".to_string(),
            ));
        }
        Ok(())
    }

    fn transform(&self) -> Result<Vec<Output>, TransformError> {
        info!("ProjectTransform::Transform");
        let Some(project) = &self.project else {
            return Ok(Vec::new());
        };

        let spec = ProjectSpec {
            project_request_message: project.project_request_message.clone(),
            project_request_template: template_name(&project.project_request_template)
                .map(NameReference::to),
        };
        let resource = Resource::new(CONFIG_API_VERSION, "Project", ObjectMeta::named("cluster"), spec);

        Ok(vec![
            Output::Manifests(vec![domain_manifest("project", &resource)?]),
            Output::Report(Self::report(project)),
        ])
    }
}

/// `namespace/name` to `name`.
fn template_name(template: &str) -> Option<&str> {
    let name = template.rsplit('/').next().unwrap_or(template);
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::tests::MockFetcher;
    use crate::master_config::tests::MASTER_CONFIG;
    use crate::transform::report::Confidence;
    use assert_matches::assert_matches;
    use rstest::rstest;

    fn extract(master_config: &'static str) -> Box<dyn Extraction> {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .returning(move |_| Ok(master_config.as_bytes().to_vec()));
        ProjectTransform::new(&fetcher, "/etc/origin/master/master-config.yaml")
            .extract()
            .unwrap()
    }

    #[test]
    fn builds_project_resource() {
        let extraction = extract(MASTER_CONFIG);
        extraction.validate().unwrap();
        let outputs = extraction.transform().unwrap();

        let manifests = assert_matches!(&outputs[0], Output::Manifests(m) => m);
        assert_eq!(manifests[0].file_name(), "100_CPMA-cluster-config-project.yaml");
        let project: serde_yaml::Value = serde_yaml::from_slice(manifests[0].content()).unwrap();
        assert_eq!(project["kind"], "Project");
        assert_eq!(
            project["spec"]["projectRequestMessage"],
            "To request a project, contact your admin"
        );
        assert_eq!(project["spec"]["projectRequestTemplate"]["name"], "project-request");

        let report = assert_matches!(&outputs[1], Output::Report(r) => r);
        let unsupported = report
            .reports
            .iter()
            .filter(|r| r.confidence == Confidence::Unsupported)
            .count();
        // node selector and the three allocator fields
        assert_eq!(unsupported, 4);
        assert_eq!(report.reports.len(), 6);
    }

    #[test]
    fn missing_section_fails_validation() {
        let err = extract("kind: MasterConfig\n").validate().unwrap_err();
        assert_eq!(err.to_string(), "no project configuration detected");
    }

    #[rstest]
    #[case("default/project-request", Some("project-request"))]
    #[case("project-request", Some("project-request"))]
    #[case("default/", None)]
    #[case("", None)]
    fn template_names(#[case] template: &str, #[case] expected: Option<&str>) {
        assert_eq!(template_name(template), expected);
    }
}
