use std::net::IpAddr;

use serde::Serialize;
use tracing::info;

use super::manifest::domain_manifest;
use super::report::{ComponentReport, Confidence, Report};
use super::{Extraction, Output, Transform, TransformError, fetch_master_config};
use crate::fetch::Fetcher;
use crate::master_config::NetworkConfig;
use crate::resources::{ObjectMeta, Resource};

const API_VERSION: &str = "operator.openshift.io/v1";
const HOST_PREFIX: u32 = 23;
const SDN_TYPE: &str = "OpenShiftSDN";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSpec {
    pub cluster_network: Vec<ClusterNetwork>,
    pub service_network: Vec<String>,
    pub default_network: DefaultNetwork,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterNetwork {
    pub cidr: String,
    pub host_prefix: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefaultNetwork {
    #[serde(rename = "type")]
    pub network_type: String,
    #[serde(rename = "openshiftSDNConfig")]
    pub openshift_sdn_config: SdnConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SdnConfig {
    pub mode: String,
}

pub struct SdnTransform<'a> {
    fetcher: &'a dyn Fetcher,
    master_config_file: String,
}

impl<'a> SdnTransform<'a> {
    pub fn new<S: Into<String>>(fetcher: &'a dyn Fetcher, master_config_file: S) -> Self {
        Self {
            fetcher,
            master_config_file: master_config_file.into(),
        }
    }
}

impl Transform for SdnTransform<'_> {
    fn name(&self) -> &str {
        "SDN"
    }

    fn extract(&self) -> Result<Box<dyn Extraction>, TransformError> {
        info!("SDNTransform::Extract");
        let master_config = fetch_master_config(self.fetcher, &self.master_config_file)?;
        Ok(Box::new(SdnExtraction {
            network: master_config.network_config.unwrap_or_default(),
        }))
    }
}

#[derive(Debug)]
pub struct SdnExtraction {
    network: NetworkConfig,
}

impl SdnExtraction {
    /// `clusterNetworks` entries, or the legacy single `clusterNetworkCIDR`.
    fn cluster_cidrs(&self) -> Vec<&str> {
        if self.network.cluster_networks.is_empty() && !self.network.cluster_network_cidr.is_empty()
        {
            return vec![self.network.cluster_network_cidr.as_str()];
        }
        self.network
            .cluster_networks
            .iter()
            .map(|entry| entry.cidr.as_str())
            .collect()
    }

    fn report(&self) -> ComponentReport {
        let mut component = ComponentReport::new("SDN");
        component.push(
            Report::supported(&self.network.service_network_cidr, "serviceNetwork")
                .with_comment("Networks must be configured during installation"),
        );
        for cidr in self.cluster_cidrs() {
            component.push(
                Report::supported(cidr, "clusterNetwork")
                    .with_comment("Networks must be configured during installation"),
            );
        }
        component.push(
            Report::supported("hostSubnetLength", "clusterNetwork")
                .with_confidence(Confidence::Partial)
                .with_comment(
                    "Networks must be configured during installation, hostPrefix is defaulted to 23",
                ),
        );
        component.push(Report::supported(&self.network.network_plugin_name, "plugin"));
        component
    }
}

impl Extraction for SdnExtraction {
    fn validate(&self) -> Result<(), TransformError> {
        let invalid = |message: &str| Err(TransformError::Invalid(message.to_string()));

        if self.network.service_network_cidr.is_empty() {
            return invalid("Service network CIDR can't be empty");
        }
        if !is_cidr(&self.network.service_network_cidr) {
            return invalid("Not valid service network CIDR");
        }

        let cluster_cidrs = self.cluster_cidrs();
        if cluster_cidrs.is_empty() {
            return invalid("Cluster network must have at least 1 entry");
        }
        for cidr in cluster_cidrs {
            if cidr.is_empty() {
                return invalid("Cluster network CIDR can't be empty");
            }
            if !is_cidr(cidr) {
                return invalid("Not valid cluster network CIDR");
            }
        }

        if self.network.network_plugin_name.is_empty() {
            return invalid("Plugin name can't be empty");
        }
        Ok(())
    }

    fn transform(&self) -> Result<Vec<Output>, TransformError> {
        info!("SDNTransform::Transform");
        let mode = sdn_mode(&self.network.network_plugin_name)?;

        let spec = NetworkSpec {
            cluster_network: self
                .cluster_cidrs()
                .into_iter()
                .map(|cidr| ClusterNetwork {
                    cidr: cidr.to_string(),
                    host_prefix: HOST_PREFIX,
                })
                .collect(),
            service_network: vec![self.network.service_network_cidr.clone()],
            default_network: DefaultNetwork {
                network_type: SDN_TYPE.to_string(),
                openshift_sdn_config: SdnConfig {
                    mode: mode.to_string(),
                },
            },
        };
        let network = Resource::new(API_VERSION, "Network", ObjectMeta::named("cluster"), spec);

        Ok(vec![
            Output::Manifests(vec![domain_manifest("sdn", &network)?]),
            Output::Report(self.report()),
        ])
    }
}

fn sdn_mode(plugin_name: &str) -> Result<&'static str, TransformError> {
    match plugin_name {
        "redhat/openshift-ovs-multitenant" => Ok("Multitenant"),
        "redhat/openshift-ovs-networkpolicy" => Ok("NetworkPolicy"),
        "redhat/openshift-ovs-subnet" => Ok("Subnet"),
        _ => Err(TransformError::Unsupported(
            "Network plugin not supported".to_string(),
        )),
    }
}

/// `<ip>/<prefix>` with the prefix in range for the address family.
fn is_cidr(cidr: &str) -> bool {
    let Some((addr, prefix)) = cidr.split_once('/') else {
        return false;
    };
    let (Ok(addr), Ok(prefix)) = (addr.parse::<IpAddr>(), prefix.parse::<u8>()) else {
        return false;
    };
    match addr {
        IpAddr::V4(_) => prefix <= 32,
        IpAddr::V6(_) => prefix <= 128,
    }
}
