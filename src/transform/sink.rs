use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::manifest::Manifest;
use super::report::{ComponentReport, ReportError, to_html, to_json};

const MANIFESTS_DIR: &str = "manifests";
const JSON_REPORT: &str = "report.json";
const HTML_REPORT: &str = "report.html";

#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("unable to write `{0}`: `{1}`")]
    Write(String, String),
    #[error("rendering report: `{0}`")]
    Report(#[from] ReportError),
}

/// Destination of the outputs a transform unit flushes.
pub trait Sink {
    fn flush_manifest(&mut self, manifest: &Manifest) -> Result<(), SinkError>;
    fn flush_report(&mut self, report: &ComponentReport) -> Result<(), SinkError>;
}

/// Writes manifests under `<output_dir>/manifests` as they are flushed and keeps
/// reports until [`DirSink::finish`] renders them.
#[derive(Debug)]
pub struct DirSink {
    output_dir: PathBuf,
    reports: Vec<ComponentReport>,
}

impl DirSink {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
            reports: Vec::new(),
        }
    }

    pub fn reports(&self) -> &[ComponentReport] {
        &self.reports
    }

    /// Writes `report.json` and `report.html`. Nothing is written when no unit reported.
    pub fn finish(&self) -> Result<(), SinkError> {
        if self.reports.is_empty() {
            debug!("no component reports to write");
            return Ok(());
        }

        write(&self.output_dir.join(JSON_REPORT), &to_json(&self.reports)?)?;
        write(
            &self.output_dir.join(HTML_REPORT),
            to_html(&self.reports).as_bytes(),
        )?;
        info!("Reports written to {}", self.output_dir.display());
        Ok(())
    }
}

impl Sink for DirSink {
    fn flush_manifest(&mut self, manifest: &Manifest) -> Result<(), SinkError> {
        let path = self
            .output_dir
            .join(MANIFESTS_DIR)
            .join(manifest.file_name());
        write(&path, manifest.content())?;
        info!("CR manifest created: {}", path.display());
        Ok(())
    }

    fn flush_report(&mut self, report: &ComponentReport) -> Result<(), SinkError> {
        self.reports.push(report.clone());
        Ok(())
    }
}

fn write(path: &Path, content: &[u8]) -> Result<(), SinkError> {
    let to_err = |e: std::io::Error| SinkError::Write(path.display().to_string(), e.to_string());
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(to_err)?;
    }
    fs::write(path, content).map_err(to_err)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::transform::report::Report;
    use assert_matches::assert_matches;
    use mockall::mock;
    use tempfile::tempdir;

    mock! {
        pub Sink {}

        impl Sink for Sink {
            fn flush_manifest(&mut self, manifest: &Manifest) -> Result<(), SinkError>;
            fn flush_report(&mut self, report: &ComponentReport) -> Result<(), SinkError>;
        }
    }

    #[test]
    fn manifests_land_in_manifests_dir() {
        let dir = tempdir().unwrap();
        let mut sink = DirSink::new(dir.path());
        let manifest = Manifest::new("100_CPMA-cluster-config-sdn.yaml", b"kind: Network\n".to_vec());

        sink.flush_manifest(&manifest).unwrap();

        assert_eq!(
            fs::read(dir.path().join("manifests/100_CPMA-cluster-config-sdn.yaml")).unwrap(),
            b"kind: Network\n".to_vec()
        );
    }

    #[test]
    fn flushing_twice_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut sink = DirSink::new(dir.path());
        let manifest = Manifest::new("m.yaml", b"a: b\n".to_vec());
        let path = dir.path().join("manifests/m.yaml");

        sink.flush_manifest(&manifest).unwrap();
        let first = fs::read(&path).unwrap();
        sink.flush_manifest(&manifest).unwrap();

        assert_eq!(first, fs::read(&path).unwrap());
    }

    #[test]
    fn finish_writes_both_reports() {
        let dir = tempdir().unwrap();
        let mut sink = DirSink::new(dir.path());
        let mut report = ComponentReport::new("Scheduler");
        report.push(Report::supported("DefaultNodeSelector", "ProjectConfig"));

        sink.flush_report(&report).unwrap();
        sink.finish().unwrap();

        let json: serde_json::Value =
            serde_json::from_slice(&fs::read(dir.path().join("report.json")).unwrap()).unwrap();
        assert_eq!(json["components"][0]["component"], "Scheduler");
        let html = fs::read_to_string(dir.path().join("report.html")).unwrap();
        assert!(html.contains("DefaultNodeSelector"));
    }

    #[test]
    fn finish_without_reports_writes_nothing() {
        let dir = tempdir().unwrap();
        DirSink::new(dir.path()).finish().unwrap();
        assert!(!dir.path().join("report.json").exists());
    }

    #[test]
    fn unwritable_destination_fails() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"").unwrap();
        let mut sink = DirSink::new(&blocker);

        assert_matches!(
            sink.flush_manifest(&Manifest::new("m.yaml", vec![])),
            Err(SinkError::Write(..))
        );
    }
}
