//! Runtime configuration: defaults, then an optional YAML file, then `CPMA_*`
//! environment variables, then CLI flags.
use std::env;
use std::env::VarError;
use std::fs;
use std::path::{Path, PathBuf};

use clap::error::{Error as ClapError, ErrorKind};
use serde::Deserialize;
use tracing::debug;

use crate::transform::OutputOptions;

/// Loaded when `--config` is not given and the file exists.
pub const DEFAULT_CONFIG_FILE: &str = "cpma.yaml";

const CACHE_DIR: &str = ".cache";

const OUTPUT_DIR_ENV: &str = "CPMA_OUTPUT_DIR";
const HOSTNAME_ENV: &str = "CPMA_HOSTNAME";
const SOURCE_ROOT_ENV: &str = "CPMA_SOURCE_ROOT";
const MASTER_CONFIG_FILE_ENV: &str = "CPMA_MASTER_CONFIG_FILE";
const REGISTRIES_CONFIG_FILE_ENV: &str = "CPMA_REGISTRIES_CONFIG_FILE";
const CRIO_CONFIG_FILE_ENV: &str = "CPMA_CRIO_CONFIG_FILE";
const MANIFESTS_ENV: &str = "CPMA_MANIFESTS";
const REPORTING_ENV: &str = "CPMA_REPORTING";
const DEBUG_ENV: &str = "CPMA_DEBUG";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("unable to read config file `{0}`: `{1}`")]
    Read(String, String),
    #[error("unable to parse config file `{0}`: `{1}`")]
    Parse(String, String),
    #[error("invalid value `{1}` for `{0}`")]
    InvalidValue(String, String),
}

impl From<ConfigError> for ClapError {
    fn from(err: ConfigError) -> ClapError {
        ClapError::raw(ErrorKind::InvalidValue, err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Manifests go to `<output_dir>/manifests`, reports to `<output_dir>`.
    pub output_dir: PathBuf,
    /// Name of the OCP3 master the files were taken from. Used to scope the cache.
    pub hostname: String,
    /// Local directory the OCP3 file system is mirrored under.
    pub source_root: PathBuf,
    pub master_config_file: String,
    pub registries_config_file: String,
    pub crio_config_file: String,
    pub manifests: bool,
    pub reporting: bool,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data"),
            hostname: String::new(),
            source_root: PathBuf::from("/"),
            master_config_file: "/etc/origin/master/master-config.yaml".to_string(),
            registries_config_file: "/etc/containers/registries.conf".to_string(),
            crio_config_file: "/etc/crio/crio.conf".to_string(),
            manifests: true,
            reporting: true,
            debug: false,
        }
    }
}

impl Config {
    /// Loads `path`, or [`DEFAULT_CONFIG_FILE`] when present, or the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Path::new(DEFAULT_CONFIG_FILE),
            None => {
                debug!("no config file, using defaults");
                return Ok(Self::default());
            }
        };

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.display().to_string(), e.to_string()))?;
        Self::from_yaml(&content)
            .map_err(|e| ConfigError::Parse(path.display().to_string(), e.to_string()))
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Applies the `CPMA_*` variables of the process environment.
    pub fn try_with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_env_overrides(env::var)
    }

    /// Applies `CPMA_*` overrides read through `env_var`. Unset variables keep the current value.
    pub fn with_env_overrides<F>(self, env_var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Result<String, VarError>,
    {
        let string = |name: &'static str, current: String| env_var(name).unwrap_or(current);
        let path = |name: &'static str, current: PathBuf| {
            env_var(name).map(PathBuf::from).unwrap_or(current)
        };
        let flag = |name: &'static str, current: bool| match env_var(name) {
            Ok(value) => parse_bool(name, &value),
            Err(_) => Ok(current),
        };

        Ok(Self {
            output_dir: path(OUTPUT_DIR_ENV, self.output_dir),
            hostname: string(HOSTNAME_ENV, self.hostname),
            source_root: path(SOURCE_ROOT_ENV, self.source_root),
            master_config_file: string(MASTER_CONFIG_FILE_ENV, self.master_config_file),
            registries_config_file: string(REGISTRIES_CONFIG_FILE_ENV, self.registries_config_file),
            crio_config_file: string(CRIO_CONFIG_FILE_ENV, self.crio_config_file),
            manifests: flag(MANIFESTS_ENV, self.manifests)?,
            reporting: flag(REPORTING_ENV, self.reporting)?,
            debug: flag(DEBUG_ENV, self.debug)?,
        })
    }

    /// Fetched source files are kept under `<output_dir>/.cache/<hostname>`.
    pub fn cache_dir(&self) -> PathBuf {
        let cache = self.output_dir.join(CACHE_DIR);
        if self.hostname.is_empty() {
            cache
        } else {
            cache.join(&self.hostname)
        }
    }

    pub fn output_options(&self) -> OutputOptions {
        OutputOptions {
            manifests: self.manifests,
            reporting: self.reporting,
        }
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue(
            name.to_string(),
            value.to_string(),
        )),
    }
}
