use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    IdentityProvider, NameReference, ProviderResources, ProviderSpec, StringSource,
    ValidationError, ca_config_map, client_secret, validate_client_data,
};

const CA_CONFIG_MAP: &str = "openid-configmap";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenIdPayload {
    pub ca: String,
    #[serde(rename = "clientID")]
    pub client_id: String,
    pub client_secret: StringSource,
    pub extra_scopes: Vec<String>,
    pub extra_authorize_parameters: BTreeMap<String, String>,
    pub urls: OpenIdUrls,
    pub claims: OpenIdPayloadClaims,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenIdUrls {
    pub authorize: String,
    pub token: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user_info: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenIdPayloadClaims {
    pub id: Vec<String>,
    pub preferred_username: Vec<String>,
    pub name: Vec<String>,
    pub email: Vec<String>,
}

impl OpenIdPayloadClaims {
    fn is_empty(&self) -> bool {
        self.id.is_empty()
            && self.preferred_username.is_empty()
            && self.name.is_empty()
            && self.email.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenIdClaims {
    pub preferred_username: Vec<String>,
    pub name: Vec<String>,
    pub email: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenIdSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca: Option<NameReference>,
    #[serde(rename = "clientID")]
    pub client_id: String,
    pub client_secret: NameReference,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_scopes: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_authorize_parameters: BTreeMap<String, String>,
    pub claims: OpenIdClaims,
    pub urls: OpenIdUrls,
}

pub(super) fn build(provider: &IdentityProvider, payload: OpenIdPayload) -> ProviderResources {
    let secret = client_secret(provider, &payload.client_secret);
    let config_map = ca_config_map(&payload.ca, CA_CONFIG_MAP, provider);

    let spec = OpenIdSpec {
        ca: config_map.as_ref().map(|cm| NameReference::to(cm.name())),
        client_id: payload.client_id,
        client_secret: NameReference::to(secret.name()),
        extra_scopes: payload.extra_scopes,
        extra_authorize_parameters: payload.extra_authorize_parameters,
        claims: OpenIdClaims {
            preferred_username: payload.claims.preferred_username,
            name: payload.claims.name,
            email: payload.claims.email,
        },
        urls: payload.urls,
    };

    ProviderResources::new(provider, ProviderSpec::OpenId { open_id: spec })
        .with_secret(secret)
        .with_config_map(config_map)
}

pub(super) fn validate(payload: &OpenIdPayload) -> Result<(), ValidationError> {
    validate_client_data(&payload.client_id, &payload.client_secret)?;
    if payload.claims.is_empty() {
        return Err(ValidationError::EmptyClaims);
    }
    if payload.urls.authorize.is_empty() {
        return Err(ValidationError::EmptyAuthorizeUrl);
    }
    if payload.urls.token.is_empty() {
        return Err(ValidationError::EmptyTokenUrl);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::tests::provider;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn valid() -> serde_json::Value {
        json!({
            "clientID": "testid",
            "clientSecret": {"value": "testsecret"},
            "claims": {
                "id": ["sub"],
                "preferredUsername": ["preferred_username", "email"],
                "name": ["nickname", "given_name", "name"],
                "email": ["custom_email_claim", "email"],
            },
            "urls": {
                "authorize": "https://myidp.example.com/oauth2/authorize",
                "token": "https://myidp.example.com/oauth2/token",
            },
        })
    }

    fn payload(value: serde_json::Value) -> OpenIdPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn builds_openid_provider() {
        let p = provider("OpenIDIdentityProvider", "my_openid_connect", json!({}));

        let resources = build(&p, payload(valid()));

        assert_matches!(&resources.fragment.spec, ProviderSpec::OpenId { open_id } => {
            assert_eq!(open_id.client_id, "testid");
            assert_eq!(open_id.client_secret.name, "my_openid_connect-secret");
            assert_eq!(open_id.claims.name, vec!["nickname", "given_name", "name"]);
            assert_eq!(open_id.urls.token, "https://myidp.example.com/oauth2/token");
            assert!(open_id.ca.is_none());
        });
        assert_eq!(resources.secrets[0].content(), b"testsecret");
        assert!(resources.config_maps.is_empty());
    }

    #[test]
    fn validation_rules() {
        assert!(validate(&payload(valid())).is_ok());

        let mut only_id_claim = valid();
        only_id_claim["claims"] = json!({"id": ["sub"]});
        assert!(validate(&payload(only_id_claim)).is_ok());

        let mut no_claims = valid();
        no_claims["claims"] = json!({});
        assert_eq!(validate(&payload(no_claims)), Err(ValidationError::EmptyClaims));

        let mut no_authorize = valid();
        no_authorize["urls"]["authorize"] = json!("");
        assert_eq!(
            validate(&payload(no_authorize)),
            Err(ValidationError::EmptyAuthorizeUrl)
        );

        let mut no_token = valid();
        no_token["urls"]["token"] = json!("");
        assert_eq!(validate(&payload(no_token)), Err(ValidationError::EmptyTokenUrl));

        let mut encrypted = valid();
        encrypted["clientSecret"] = json!({"file": "s", "keyFile": "k"});
        assert_eq!(
            validate(&payload(encrypted)),
            Err(ValidationError::EncryptedClientSecret)
        );
    }
}
