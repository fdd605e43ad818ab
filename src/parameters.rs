use std::path::PathBuf;

use clap::Args;

use crate::config::Config;

/// Command line values layered over the file and environment configuration.
#[derive(Args, Debug, Default, Clone, PartialEq)]
pub struct ConfigOverrides {
    /// Directory manifests and reports are written to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Hostname of the OCP3 master being migrated
    #[arg(long)]
    hostname: Option<String>,

    /// Local directory the OCP3 files are read from
    #[arg(long)]
    source_root: Option<PathBuf>,

    /// Path of the master configuration on the OCP3 host
    #[arg(long = "master-config")]
    master_config_file: Option<String>,

    /// Path of registries.conf on the OCP3 host
    #[arg(long = "registries-config")]
    registries_config_file: Option<String>,

    /// Path of crio.conf on the OCP3 host
    #[arg(long = "crio-config")]
    crio_config_file: Option<String>,

    /// Do not write manifests
    #[arg(long)]
    no_manifests: bool,

    /// Do not write the report
    #[arg(long)]
    no_reporting: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

impl ConfigOverrides {
    /// Flags only ever switch manifests and reporting off, and debug on.
    pub fn apply(self, config: Config) -> Config {
        Config {
            output_dir: self.output_dir.unwrap_or(config.output_dir),
            hostname: self.hostname.unwrap_or(config.hostname),
            source_root: self.source_root.unwrap_or(config.source_root),
            master_config_file: self.master_config_file.unwrap_or(config.master_config_file),
            registries_config_file: self
                .registries_config_file
                .unwrap_or(config.registries_config_file),
            crio_config_file: self.crio_config_file.unwrap_or(config.crio_config_file),
            manifests: config.manifests && !self.no_manifests,
            reporting: config.reporting && !self.no_reporting,
            debug: config.debug || self.debug,
        }
    }
}
