use serde::{Deserialize, Serialize};

use super::{IdentityProvider, NameReference, ProviderResources, ProviderSpec, ValidationError};
use crate::resources::ConfigMap;

const CA_CONFIG_MAP: &str = "requestheader-configmap";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestHeaderPayload {
    #[serde(rename = "challengeURL")]
    pub challenge_url: String,
    #[serde(rename = "loginURL")]
    pub login_url: String,
    #[serde(rename = "clientCA")]
    pub client_ca: String,
    pub client_common_names: Vec<String>,
    pub headers: Vec<String>,
    pub email_headers: Vec<String>,
    pub name_headers: Vec<String>,
    pub preferred_username_headers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestHeaderSpec {
    #[serde(rename = "challengeURL", skip_serializing_if = "String::is_empty")]
    pub challenge_url: String,
    #[serde(rename = "loginURL", skip_serializing_if = "String::is_empty")]
    pub login_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca: Option<NameReference>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub client_common_names: Vec<String>,
    pub headers: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub email_headers: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub name_headers: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub preferred_username_headers: Vec<String>,
}

pub(super) fn build(provider: &IdentityProvider, payload: RequestHeaderPayload) -> ProviderResources {
    let config_map = (!payload.client_ca.is_empty())
        .then(|| ConfigMap::ca_bundle(CA_CONFIG_MAP, provider.side_files.ca.clone()));

    let spec = RequestHeaderSpec {
        challenge_url: payload.challenge_url,
        login_url: payload.login_url,
        ca: config_map.as_ref().map(|cm| NameReference::to(cm.name())),
        client_common_names: payload.client_common_names,
        headers: payload.headers,
        email_headers: payload.email_headers,
        name_headers: payload.name_headers,
        preferred_username_headers: payload.preferred_username_headers,
    };

    ProviderResources::new(
        provider,
        ProviderSpec::RequestHeader {
            request_header: spec,
        },
    )
    .with_config_map(config_map)
}

pub(super) fn validate(payload: &RequestHeaderPayload) -> Result<(), ValidationError> {
    if payload.headers.is_empty() {
        return Err(ValidationError::EmptyHeaders);
    }
    Ok(())
}
