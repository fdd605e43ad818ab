//! Typed view over the OCP3 `master-config.yaml`.
//!
//! Only the sections the transform units read are modelled; everything else in the
//! document is ignored on decode.
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("unable to decode master config: `{0}`")]
    InvalidYaml(String),
}

/// Decodes raw master-config bytes.
pub fn decode(content: &[u8]) -> Result<MasterConfig, DecodeError> {
    serde_yaml::from_slice(content).map_err(|e| DecodeError::InvalidYaml(e.to_string()))
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MasterConfig {
    pub oauth_config: Option<OAuthConfig>,
    pub network_config: Option<NetworkConfig>,
    pub image_policy_config: Option<ImagePolicyConfig>,
    pub project_config: Option<ProjectConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OAuthConfig {
    pub identity_providers: Vec<IdentityProviderEntry>,
    pub token_config: Option<TokenConfig>,
    pub templates: Option<OAuthTemplates>,
}

/// One `oauthConfig.identityProviders` entry. The `provider` stanza is kept opaque
/// until its kind is known.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentityProviderEntry {
    pub name: String,
    pub challenge: bool,
    pub login: bool,
    pub mapping_method: String,
    pub provider: serde_json::Value,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenConfig {
    pub access_token_max_age_seconds: i32,
    pub authorize_token_max_age_seconds: i32,
}

/// Paths to custom login, error and provider selection pages.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OAuthTemplates {
    pub login: String,
    pub error: String,
    pub provider_selection: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkConfig {
    pub cluster_networks: Vec<ClusterNetworkEntry>,
    #[serde(rename = "clusterNetworkCIDR")]
    pub cluster_network_cidr: String,
    pub host_subnet_length: u32,
    pub network_plugin_name: String,
    #[serde(rename = "serviceNetworkCIDR")]
    pub service_network_cidr: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterNetworkEntry {
    pub cidr: String,
    pub host_subnet_length: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImagePolicyConfig {
    pub allowed_registries_for_import: Vec<RegistryLocation>,
    #[serde(rename = "additionalTrustedCA")]
    pub additional_trusted_ca: String,
    pub external_registry_hostname: String,
    pub internal_registry_hostname: String,
    pub disable_scheduled_import: bool,
    pub max_images_bulk_imported_per_repository: i64,
    pub max_scheduled_image_imports_per_minute: i64,
    pub scheduled_image_import_minimum_interval_seconds: i64,
}

impl ImagePolicyConfig {
    pub fn is_empty(&self) -> bool {
        self == &ImagePolicyConfig::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistryLocation {
    pub domain_name: String,
    pub insecure: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
    pub default_node_selector: String,
    pub project_request_message: String,
    pub project_request_template: String,
    pub security_allocator: Option<SecurityAllocator>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecurityAllocator {
    pub uid_allocator_range: String,
    pub mcs_allocator_range: String,
    pub mcs_labels_per_project: i32,
}
