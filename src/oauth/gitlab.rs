use serde::{Deserialize, Serialize};

use super::{
    IdentityProvider, NameReference, ProviderResources, ProviderSpec, StringSource,
    ValidationError, ca_config_map, client_secret, validate_client_data,
};

const CA_CONFIG_MAP: &str = "gitlab-configmap";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GitLabPayload {
    pub url: String,
    #[serde(rename = "clientID")]
    pub client_id: String,
    pub client_secret: StringSource,
    pub ca: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GitLabSpec {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca: Option<NameReference>,
    #[serde(rename = "clientID")]
    pub client_id: String,
    pub client_secret: NameReference,
}

pub(super) fn build(provider: &IdentityProvider, payload: GitLabPayload) -> ProviderResources {
    let secret = client_secret(provider, &payload.client_secret);
    let config_map = ca_config_map(&payload.ca, CA_CONFIG_MAP, provider);

    let spec = GitLabSpec {
        url: payload.url,
        ca: config_map.as_ref().map(|cm| NameReference::to(cm.name())),
        client_id: payload.client_id,
        client_secret: NameReference::to(secret.name()),
    };

    ProviderResources::new(provider, ProviderSpec::GitLab { gitlab: spec })
        .with_secret(secret)
        .with_config_map(config_map)
}

pub(super) fn validate(payload: &GitLabPayload) -> Result<(), ValidationError> {
    if payload.url.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }
    validate_client_data(&payload.client_id, &payload.client_secret)
}
