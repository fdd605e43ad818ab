use serde::{Deserialize, Serialize};

use super::{
    IdentityProvider, NameReference, ProviderResources, ProviderSpec, StringSource,
    ValidationError, ca_config_map,
};

const CA_CONFIG_MAP: &str = "ldap-configmap";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LdapPayload {
    pub url: String,
    #[serde(rename = "bindDN")]
    pub bind_dn: String,
    pub bind_password: StringSource,
    pub insecure: bool,
    pub ca: String,
    pub attributes: LdapAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LdapAttributes {
    pub id: Vec<String>,
    pub email: Vec<String>,
    pub name: Vec<String>,
    pub preferred_username: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LdapSpec {
    pub attributes: LdapAttributes,
    #[serde(rename = "bindDN", skip_serializing_if = "String::is_empty")]
    pub bind_dn: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub bind_password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca: Option<NameReference>,
    pub insecure: bool,
    pub url: String,
}

/// The bind password is inlined into the resource rather than moved into a Secret.
pub(super) fn build(provider: &IdentityProvider, payload: LdapPayload) -> ProviderResources {
    let config_map = ca_config_map(&payload.ca, CA_CONFIG_MAP, provider);
    let bind_password = provider
        .side_files
        .bind_password
        .clone()
        .unwrap_or(payload.bind_password.value);

    let spec = LdapSpec {
        attributes: payload.attributes,
        bind_dn: payload.bind_dn,
        bind_password,
        ca: config_map.as_ref().map(|cm| NameReference::to(cm.name())),
        insecure: payload.insecure,
        url: payload.url,
    };

    ProviderResources::new(provider, ProviderSpec::Ldap { ldap: spec }).with_config_map(config_map)
}

pub(super) fn validate(payload: &LdapPayload) -> Result<(), ValidationError> {
    let attributes = &payload.attributes;
    if attributes.id.is_empty() {
        return Err(ValidationError::EmptyIdAttribute);
    }
    if attributes.email.is_empty() {
        return Err(ValidationError::EmptyEmailAttribute);
    }
    if attributes.name.is_empty() {
        return Err(ValidationError::EmptyNameAttribute);
    }
    if attributes.preferred_username.is_empty() {
        return Err(ValidationError::EmptyPreferredUsernameAttribute);
    }
    if payload.url.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }
    if !payload.bind_password.key_file.is_empty() {
        return Err(ValidationError::EncryptedBindPassword);
    }
    Ok(())
}
