use serde::{Deserialize, Serialize};

use super::{
    IdentityProvider, NameReference, ProviderResources, ProviderSpec, StringSource,
    ValidationError, ca_config_map, client_secret, validate_client_data,
};

const CA_CONFIG_MAP: &str = "github-configmap";

/// OCP3 `GitHubIdentityProvider` stanza.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GitHubPayload {
    #[serde(rename = "clientID")]
    pub client_id: String,
    pub client_secret: StringSource,
    pub organizations: Vec<String>,
    pub teams: Vec<String>,
    pub hostname: String,
    pub ca: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubSpec {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub hostname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca: Option<NameReference>,
    #[serde(rename = "clientID")]
    pub client_id: String,
    pub client_secret: NameReference,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub organizations: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub teams: Vec<String>,
}

pub(super) fn build(provider: &IdentityProvider, payload: GitHubPayload) -> ProviderResources {
    let secret = client_secret(provider, &payload.client_secret);
    let config_map = ca_config_map(&payload.ca, CA_CONFIG_MAP, provider);

    let spec = GitHubSpec {
        hostname: payload.hostname,
        ca: config_map.as_ref().map(|cm| NameReference::to(cm.name())),
        client_id: payload.client_id,
        client_secret: NameReference::to(secret.name()),
        organizations: payload.organizations,
        teams: payload.teams,
    };

    ProviderResources::new(provider, ProviderSpec::GitHub { github: spec })
        .with_secret(secret)
        .with_config_map(config_map)
}

pub(super) fn validate(payload: &GitHubPayload) -> Result<(), ValidationError> {
    validate_client_data(&payload.client_id, &payload.client_secret)
}
