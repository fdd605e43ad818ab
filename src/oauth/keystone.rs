use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::resources::PayloadKind;

use super::{
    IdentityProvider, NameReference, ProviderResources, ProviderSpec, ValidationError,
    ca_config_map, client_cert_secrets,
};

const CA_CONFIG_MAP: &str = "keystone-configmap";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeystonePayload {
    pub domain_name: String,
    pub url: String,
    pub ca: String,
    pub cert_file: String,
    pub key_file: String,
    pub use_keystone_identity: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeystoneSpec {
    pub domain_name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca: Option<NameReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_client_cert: Option<NameReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_client_key: Option<NameReference>,
}

pub(super) fn build(provider: &IdentityProvider, payload: KeystonePayload) -> ProviderResources {
    if payload.use_keystone_identity {
        warn!("Keystone useKeystoneIdentity value is not supported in OCP4");
    }

    let config_map = ca_config_map(&payload.ca, CA_CONFIG_MAP, provider);
    let client_secrets = (!payload.cert_file.is_empty())
        .then(|| client_cert_secrets(provider, PayloadKind::Keystone));

    let spec = KeystoneSpec {
        domain_name: payload.domain_name,
        url: payload.url,
        ca: config_map.as_ref().map(|cm| NameReference::to(cm.name())),
        tls_client_cert: client_secrets
            .as_ref()
            .map(|(cert, _)| NameReference::to(cert.name())),
        tls_client_key: client_secrets
            .as_ref()
            .map(|(_, key)| NameReference::to(key.name())),
    };

    let resources = ProviderResources::new(provider, ProviderSpec::Keystone { keystone: spec });
    let resources = match client_secrets {
        Some((cert, key)) => resources.with_secret(cert).with_secret(key),
        None => resources,
    };
    resources.with_config_map(config_map)
}

pub(super) fn validate(payload: &KeystonePayload) -> Result<(), ValidationError> {
    if payload.domain_name.is_empty() {
        return Err(ValidationError::EmptyDomainName);
    }
    if payload.url.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }
    if !payload.cert_file.is_empty() && payload.key_file.is_empty() {
        return Err(ValidationError::MissingKeyFile);
    }
    Ok(())
}
