use serde::{Deserialize, Serialize};

use crate::resources::PayloadKind;

use super::{
    IdentityProvider, NameReference, ProviderResources, ProviderSpec, ValidationError,
    ca_config_map, client_cert_secrets,
};

const CA_CONFIG_MAP: &str = "basicauth-configmap";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BasicAuthPayload {
    pub url: String,
    pub ca: String,
    pub cert_file: String,
    pub key_file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicAuthSpec {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca: Option<NameReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_client_cert: Option<NameReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_client_key: Option<NameReference>,
}

pub(super) fn build(provider: &IdentityProvider, payload: BasicAuthPayload) -> ProviderResources {
    let config_map = ca_config_map(&payload.ca, CA_CONFIG_MAP, provider);
    let mut spec = BasicAuthSpec {
        url: payload.url,
        ca: config_map.as_ref().map(|cm| NameReference::to(cm.name())),
        tls_client_cert: None,
        tls_client_key: None,
    };

    let client_secrets = (!payload.cert_file.is_empty())
        .then(|| client_cert_secrets(provider, PayloadKind::BasicAuth));
    if let Some((cert, key)) = &client_secrets {
        spec.tls_client_cert = Some(NameReference::to(cert.name()));
        spec.tls_client_key = Some(NameReference::to(key.name()));
    }

    let mut resources =
        ProviderResources::new(provider, ProviderSpec::BasicAuth { basic_auth: spec });
    if let Some((cert, key)) = client_secrets {
        resources = resources.with_secret(cert).with_secret(key);
    }
    resources.with_config_map(config_map)
}

pub(super) fn validate(payload: &BasicAuthPayload) -> Result<(), ValidationError> {
    if payload.url.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }
    if !payload.cert_file.is_empty() && payload.key_file.is_empty() {
        return Err(ValidationError::MissingKeyFile);
    }
    Ok(())
}
