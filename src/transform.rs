//! Transform units and the runner that sequences them.
//!
//! Each unit goes through `Extract -> Validate -> Transform -> Flush`. A failure at any
//! stage skips the rest of that unit only; the runner always moves on to the next one.
use std::fmt;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::fetch::{EnvReader, FetchError, Fetcher};
use crate::master_config::{self, DecodeError, MasterConfig};
use crate::oauth::OAuthError;

pub mod crio;
pub mod image;
pub mod manifest;
pub mod oauth;
pub mod project;
pub mod registries;
pub mod report;
pub mod scheduler;
pub mod sdn;
pub mod sink;

use manifest::{Manifest, ManifestError};
use report::ComponentReport;
use sink::{Sink, SinkError};

/// Any stage failure of a single unit.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("fetching source file: `{0}`")]
    Fetch(#[from] FetchError),
    #[error("{0}")]
    Decode(#[from] DecodeError),
    #[error("unable to parse `{0}`: `{1}`")]
    Parse(String, String),
    #[error("{0}")]
    OAuth(#[from] OAuthError),
    /// A contract violation found by a unit's validation.
    #[error("{0}")]
    Invalid(String),
    /// The source configuration uses something OCP4 cannot express.
    #[error("{0}")]
    Unsupported(String),
    #[error("building manifest: `{0}`")]
    Manifest(#[from] ManifestError),
    #[error("flushing output: `{0}`")]
    Sink(#[from] SinkError),
}

/// A configuration domain that can be migrated on its own.
pub trait Transform {
    fn name(&self) -> &str;
    fn extract(&self) -> Result<Box<dyn Extraction>, TransformError>;
}

/// Data collected by [`Transform::extract`].
pub trait Extraction {
    fn validate(&self) -> Result<(), TransformError>;
    fn transform(&self) -> Result<Vec<Output>, TransformError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Manifests(Vec<Manifest>),
    Report(ComponentReport),
}

impl Output {
    pub fn flush(&self, sink: &mut dyn Sink) -> Result<(), SinkError> {
        match self {
            Output::Manifests(manifests) => manifests
                .iter()
                .try_for_each(|manifest| sink.flush_manifest(manifest)),
            Output::Report(report) => sink.flush_report(report),
        }
    }
}

/// Which kinds of output get flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputOptions {
    pub manifests: bool,
    pub reporting: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            manifests: true,
            reporting: true,
        }
    }
}

impl OutputOptions {
    fn allows(&self, output: &Output) -> bool {
        match output {
            Output::Manifests(_) => self.manifests,
            Output::Report(_) => self.reporting,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Validate,
    Transform,
    Flush,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            Stage::Extract => "extract",
            Stage::Validate => "validate",
            Stage::Transform => "transform",
            Stage::Flush => "flush",
        };
        write!(f, "{stage}")
    }
}

/// Lifecycle of one unit within a run. `Flushed` and `Skipped` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitState {
    Pending,
    Extracted,
    Validated,
    Transformed,
    Flushed,
    Skipped { stage: Stage, reason: String },
}

impl UnitState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UnitState::Flushed | UnitState::Skipped { .. })
    }

    /// Stage a unit in this state runs next.
    fn next_stage(&self) -> Stage {
        match self {
            UnitState::Pending => Stage::Extract,
            UnitState::Extracted => Stage::Validate,
            UnitState::Validated => Stage::Transform,
            _ => Stage::Flush,
        }
    }
}

/// Terminal state of every unit, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    units: Vec<(String, UnitState)>,
}

impl RunSummary {
    pub fn units(&self) -> &[(String, UnitState)] {
        &self.units
    }

    pub fn state_of(&self, name: &str) -> Option<&UnitState> {
        self.units
            .iter()
            .find(|(unit, _)| unit == name)
            .map(|(_, state)| state)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &str> {
        self.units
            .iter()
            .filter(|(_, state)| matches!(state, UnitState::Skipped { .. }))
            .map(|(name, _)| name.as_str())
    }
}

#[derive(Debug, Default)]
pub struct Runner {
    options: OutputOptions,
}

impl Runner {
    pub fn new(options: OutputOptions) -> Self {
        Self { options }
    }

    /// Runs every unit in order. Never fails: unit errors are logged and recorded in the summary.
    pub fn run(&self, units: &[Box<dyn Transform + '_>], sink: &mut dyn Sink) -> RunSummary {
        let mut summary = RunSummary::default();

        for unit in units {
            info!("{}Transform::Run", unit.name());
            let state = self.run_unit(unit.as_ref(), sink);
            if let UnitState::Skipped { stage, reason } = &state {
                warn!("Skipping {}: {stage} failed: {reason}", unit.name());
            }
            summary.units.push((unit.name().to_string(), state));
        }

        summary
    }

    fn run_unit(&self, unit: &dyn Transform, sink: &mut dyn Sink) -> UnitState {
        let mut state = UnitState::Pending;
        match self.drive(unit, sink, &mut state) {
            Ok(()) => UnitState::Flushed,
            Err(err) => UnitState::Skipped {
                stage: state.next_stage(),
                reason: err.to_string(),
            },
        }
    }

    fn drive(
        &self,
        unit: &dyn Transform,
        sink: &mut dyn Sink,
        state: &mut UnitState,
    ) -> Result<(), TransformError> {
        let extraction = unit.extract()?;
        *state = UnitState::Extracted;

        extraction.validate()?;
        *state = UnitState::Validated;

        let outputs = extraction.transform()?;
        *state = UnitState::Transformed;

        // already flushed outputs stay in place if a later one fails
        for output in outputs.iter().filter(|output| self.options.allows(output)) {
            output.flush(sink)?;
        }
        debug!("{} flushed {} outputs", unit.name(), outputs.len());
        Ok(())
    }
}

/// Fetches and decodes the master config shared by several units.
pub(crate) fn fetch_master_config(
    fetcher: &dyn Fetcher,
    path: &str,
) -> Result<MasterConfig, TransformError> {
    let content = fetcher.fetch(path)?;
    Ok(master_config::decode(&content)?)
}

/// Every unit, in the order they are run.
pub fn all_units<'a>(
    config: &'a Config,
    fetcher: &'a dyn Fetcher,
    env: &'a dyn EnvReader,
) -> Vec<Box<dyn Transform + 'a>> {
    vec![
        Box::new(oauth::OAuthTransform::new(
            fetcher,
            env,
            &config.master_config_file,
        )),
        Box::new(sdn::SdnTransform::new(fetcher, &config.master_config_file)),
        Box::new(image::ImageTransform::new(fetcher, &config.master_config_file)),
        Box::new(registries::RegistriesTransform::new(
            fetcher,
            &config.registries_config_file,
        )),
        Box::new(project::ProjectTransform::new(fetcher, &config.master_config_file)),
        Box::new(scheduler::SchedulerTransform::new(
            fetcher,
            &config.master_config_file,
        )),
        Box::new(crio::CrioTransform::new(fetcher, &config.crio_config_file)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::tests::{files_fetcher, no_env};
    use crate::transform::report::Report;
    use crate::transform::sink::DirSink;
    use crate::transform::sink::tests::MockSink;
    use assert_matches::assert_matches;
    use mockall::{Sequence, mock};
    use std::collections::HashMap;
    use tempfile::tempdir;

    mock! {
        pub Extraction {}

        impl Extraction for Extraction {
            fn validate(&self) -> Result<(), TransformError>;
            fn transform(&self) -> Result<Vec<Output>, TransformError>;
        }
    }

    type ExtractFn = Box<dyn Fn() -> Result<Box<dyn Extraction>, TransformError>>;

    struct StubUnit {
        name: &'static str,
        extract: ExtractFn,
    }

    impl Transform for StubUnit {
        fn name(&self) -> &str {
            self.name
        }

        fn extract(&self) -> Result<Box<dyn Extraction>, TransformError> {
            (self.extract)()
        }
    }

    fn unit<F>(name: &'static str, extract: F) -> Box<dyn Transform>
    where
        F: Fn() -> Result<Box<dyn Extraction>, TransformError> + 'static,
    {
        Box::new(StubUnit {
            name,
            extract: Box::new(extract),
        })
    }

    fn outputs(domain: &str) -> Vec<Output> {
        vec![
            Output::Manifests(vec![
                Manifest::new(format!("{domain}-1.yaml"), b"a: 1\n".to_vec()),
                Manifest::new(format!("{domain}-2.yaml"), b"a: 2\n".to_vec()),
            ]),
            Output::Report(ComponentReport {
                component: domain.to_string(),
                reports: vec![Report::supported("x", "y")],
            }),
        ]
    }

    fn succeeding(domain: &'static str) -> Result<Box<dyn Extraction>, TransformError> {
        let mut extraction = MockExtraction::new();
        extraction.expect_validate().returning(|| Ok(()));
        extraction
            .expect_transform()
            .returning(move || Ok(outputs(domain)));
        Ok(Box::new(extraction))
    }

    #[test]
    fn failing_unit_does_not_stop_the_next() {
        let units = vec![
            unit("A", || {
                Err(TransformError::Invalid("broken source".to_string()))
            }),
            unit("B", || succeeding("b")),
        ];
        let mut sink = MockSink::new();
        sink.expect_flush_manifest().times(2).returning(|_| Ok(()));
        sink.expect_flush_report().once().returning(|_| Ok(()));

        let summary = Runner::default().run(&units, &mut sink);

        assert_eq!(
            summary.state_of("A"),
            Some(&UnitState::Skipped {
                stage: Stage::Extract,
                reason: "broken source".to_string()
            })
        );
        assert_eq!(summary.state_of("B"), Some(&UnitState::Flushed));
        assert_eq!(summary.skipped().collect::<Vec<_>>(), vec!["A"]);
        assert!(summary.units().iter().all(|(_, state)| state.is_terminal()));
    }

    #[test]
    fn failing_unit_keeps_earlier_outputs() {
        let units = vec![
            unit("B", || succeeding("b")),
            unit("A", || {
                Err(TransformError::Invalid("broken source".to_string()))
            }),
        ];
        let mut seq = Sequence::new();
        let mut sink = MockSink::new();
        sink.expect_flush_manifest()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        sink.expect_flush_report()
            .withf(|r| r.component == "b")
            .once()
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let summary = Runner::default().run(&units, &mut sink);

        let states: Vec<(&str, &UnitState)> = summary
            .units()
            .iter()
            .map(|(name, state)| (name.as_str(), state))
            .collect();
        assert_eq!(
            states,
            vec![
                ("B", &UnitState::Flushed),
                (
                    "A",
                    &UnitState::Skipped {
                        stage: Stage::Extract,
                        reason: "broken source".to_string()
                    }
                ),
            ]
        );
    }

    #[test]
    fn validation_failure_skips_transform_and_flush() {
        let units = vec![unit("A", || {
            let mut extraction = MockExtraction::new();
            extraction
                .expect_validate()
                .returning(|| Err(TransformError::Invalid("Headers can't be empty".to_string())));
            extraction.expect_transform().never();
            Ok(Box::new(extraction))
        })];
        let mut sink = MockSink::new();
        sink.expect_flush_manifest().never();
        sink.expect_flush_report().never();

        let summary = Runner::default().run(&units, &mut sink);

        assert_matches!(
            summary.state_of("A"),
            Some(UnitState::Skipped { stage: Stage::Validate, reason }) => {
                assert_eq!(reason, "Headers can't be empty");
            }
        );
    }

    #[test]
    fn transform_failure_flushes_nothing() {
        let units = vec![unit("A", || {
            let mut extraction = MockExtraction::new();
            extraction.expect_validate().returning(|| Ok(()));
            extraction.expect_transform().returning(|| {
                Err(TransformError::Unsupported("Network plugin not supported".to_string()))
            });
            Ok(Box::new(extraction))
        })];
        let mut sink = MockSink::new();
        sink.expect_flush_manifest().never();
        sink.expect_flush_report().never();

        let summary = Runner::default().run(&units, &mut sink);

        assert_matches!(
            summary.state_of("A"),
            Some(UnitState::Skipped { stage: Stage::Transform, .. })
        );
    }

    #[test]
    fn output_options_gate_what_is_flushed() {
        let units = vec![unit("A", || succeeding("a"))];

        let mut sink = MockSink::new();
        sink.expect_flush_manifest().never();
        sink.expect_flush_report().once().returning(|_| Ok(()));
        let reports_only = Runner::new(OutputOptions {
            manifests: false,
            reporting: true,
        });
        assert_eq!(
            reports_only.run(&units, &mut sink).state_of("A"),
            Some(&UnitState::Flushed)
        );

        let mut sink = MockSink::new();
        sink.expect_flush_manifest().times(2).returning(|_| Ok(()));
        sink.expect_flush_report().never();
        let manifests_only = Runner::new(OutputOptions {
            manifests: true,
            reporting: false,
        });
        assert_eq!(
            manifests_only.run(&units, &mut sink).state_of("A"),
            Some(&UnitState::Flushed)
        );
    }

    #[test]
    fn flush_failure_keeps_earlier_outputs() {
        let units = vec![unit("A", || succeeding("a"))];
        let mut seq = Sequence::new();
        let mut sink = MockSink::new();
        sink.expect_flush_manifest()
            .withf(|m| m.file_name() == "a-1.yaml")
            .once()
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        sink.expect_flush_manifest()
            .withf(|m| m.file_name() == "a-2.yaml")
            .once()
            .in_sequence(&mut seq)
            .returning(|m| {
                Err(SinkError::Write(
                    m.file_name().to_string(),
                    "disk full".to_string(),
                ))
            });
        sink.expect_flush_report().never();

        let summary = Runner::default().run(&units, &mut sink);

        assert_matches!(
            summary.state_of("A"),
            Some(UnitState::Skipped { stage: Stage::Flush, .. })
        );
    }

    #[test]
    fn invalid_provider_does_not_block_other_units() {
        let master_config = r#"
networkConfig:
  clusterNetworks:
  - cidr: 10.128.0.0/14
    hostSubnetLength: 9
  networkPluginName: redhat/openshift-ovs-subnet
  serviceNetworkCIDR: 172.30.0.0/16
oauthConfig:
  identityProviders:
  - name: github
    challenge: false
    login: true
    mappingMethod: claim
    provider:
      kind: GitHubIdentityProvider
      clientID: ""
      clientSecret: some-secret
"#;
        let fetcher = files_fetcher(HashMap::from([(
            "/etc/origin/master/master-config.yaml",
            master_config.as_bytes().to_vec(),
        )]));
        let path = "/etc/origin/master/master-config.yaml";
        let units: Vec<Box<dyn Transform + '_>> = vec![
            Box::new(oauth::OAuthTransform::new(&fetcher, &no_env, path)),
            Box::new(sdn::SdnTransform::new(&fetcher, path)),
        ];
        let dir = tempdir().unwrap();
        let mut sink = DirSink::new(dir.path());

        let summary = Runner::default().run(&units, &mut sink);
        sink.finish().unwrap();

        assert_eq!(
            summary.state_of("OAuth"),
            Some(&UnitState::Skipped {
                stage: Stage::Validate,
                reason: "Client ID can't be empty".to_string()
            })
        );
        assert_eq!(summary.state_of("SDN"), Some(&UnitState::Flushed));

        let manifests = dir.path().join("manifests");
        assert!(!manifests.join("100_CPMA-cluster-config-oauth.yaml").exists());
        assert!(manifests.join("100_CPMA-cluster-config-sdn.yaml").exists());
        assert!(dir.path().join("report.json").exists());
    }

    #[test]
    fn undecodable_provider_yields_no_oauth_manifests() {
        let master_config = r#"
networkConfig:
  clusterNetworks:
  - cidr: 10.128.0.0/14
    hostSubnetLength: 9
  networkPluginName: redhat/openshift-ovs-subnet
  serviceNetworkCIDR: 172.30.0.0/16
oauthConfig:
  identityProviders:
  - name: htpasswd_auth
    challenge: true
    login: true
    mappingMethod: claim
    provider:
      kind: HTPasswdPasswordIdentityProvider
      file: /etc/origin/master/htpasswd
  - name: github
    challenge: false
    login: true
    mappingMethod: claim
    provider:
      kind: GitHubIdentityProvider
      clientID: 123
      clientSecret: some-secret
"#;
        let fetcher = files_fetcher(HashMap::from([
            (
                "/etc/origin/master/master-config.yaml",
                master_config.as_bytes().to_vec(),
            ),
            ("/etc/origin/master/htpasswd", b"admin:$apr1$hash".to_vec()),
        ]));
        let path = "/etc/origin/master/master-config.yaml";
        let units: Vec<Box<dyn Transform + '_>> = vec![
            Box::new(oauth::OAuthTransform::new(&fetcher, &no_env, path)),
            Box::new(sdn::SdnTransform::new(&fetcher, path)),
        ];
        let dir = tempdir().unwrap();
        let mut sink = DirSink::new(dir.path());

        let summary = Runner::default().run(&units, &mut sink);
        sink.finish().unwrap();

        assert_matches!(
            summary.state_of("OAuth"),
            Some(UnitState::Skipped { stage: Stage::Validate, reason }) => {
                assert!(reason.starts_with("unable to decode `GitHubIdentityProvider` provider `github`"));
            }
        );
        assert_eq!(summary.state_of("SDN"), Some(&UnitState::Flushed));

        let written: Vec<String> = std::fs::read_dir(dir.path().join("manifests"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(written, vec!["100_CPMA-cluster-config-sdn.yaml"]);
    }

    #[test]
    fn all_units_run_in_order() {
        let config = Config::default();
        let fetcher = files_fetcher(HashMap::new());
        let units = all_units(&config, &fetcher, &no_env);
        let names: Vec<&str> = units.iter().map(|unit| unit.name()).collect();
        assert_eq!(
            names,
            vec!["OAuth", "SDN", "Image", "Registries", "Project", "Scheduler", "Crio"]
        );

        let mut sink = MockSink::new();
        sink.expect_flush_manifest().never();
        sink.expect_flush_report().never();
        let summary = Runner::default().run(&units, &mut sink);
        assert!(summary.units().iter().all(|(_, state)| {
            matches!(state, UnitState::Skipped { stage: Stage::Extract, .. })
        }));
    }
}
