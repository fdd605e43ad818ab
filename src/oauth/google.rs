use serde::{Deserialize, Serialize};

use super::{
    IdentityProvider, NameReference, ProviderResources, ProviderSpec, StringSource,
    ValidationError, client_secret, validate_client_data,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GooglePayload {
    #[serde(rename = "clientID")]
    pub client_id: String,
    pub client_secret: StringSource,
    pub hosted_domain: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleSpec {
    #[serde(rename = "clientID")]
    pub client_id: String,
    pub client_secret: NameReference,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub hosted_domain: String,
}

pub(super) fn build(provider: &IdentityProvider, payload: GooglePayload) -> ProviderResources {
    let secret = client_secret(provider, &payload.client_secret);

    let spec = GoogleSpec {
        client_id: payload.client_id,
        client_secret: NameReference::to(secret.name()),
        hosted_domain: payload.hosted_domain,
    };

    ProviderResources::new(provider, ProviderSpec::Google { google: spec }).with_secret(secret)
}

pub(super) fn validate(payload: &GooglePayload) -> Result<(), ValidationError> {
    validate_client_data(&payload.client_id, &payload.client_secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::tests::provider;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn builds_google_provider() {
        let p = provider("GoogleIdentityProvider", "google123456789123456789", json!({}));
        let google: GooglePayload = serde_json::from_value(json!({
            "clientID": "82342890327-tf5lqn4eikdf4cb4edfm85jiqotvurpq.apps.googleusercontent.com",
            "clientSecret": {"value": "FAKE-SECRET"},
            "hostedDomain": "test.example.com",
        }))
        .unwrap();

        let resources = build(&p, google);

        assert_matches!(&resources.fragment.spec, ProviderSpec::Google { google } => {
            assert_eq!(google.hosted_domain, "test.example.com");
            assert_eq!(google.client_secret.name, "google123456789123456789-secret");
        });
        assert_eq!(resources.secrets.len(), 1);
        assert!(resources.config_maps.is_empty());
    }

    #[test]
    fn client_id_is_required() {
        let google: GooglePayload =
            serde_json::from_value(json!({"clientSecret": {"value": "x"}})).unwrap();
        assert_eq!(validate(&google), Err(ValidationError::EmptyClientId));
    }
}
