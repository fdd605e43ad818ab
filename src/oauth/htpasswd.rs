use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{IdentityProvider, NameReference, ProviderResources, ProviderSpec};
use crate::resources::{PayloadKind, Secret};

const HTPASSWD_SECRET: &str = "htpasswd-secret";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HTPasswdPayload {
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HTPasswdSpec {
    pub file_data: NameReference,
}

/// The htpasswd file content always lands in the kind-wide `htpasswd-secret`.
pub(super) fn build(provider: &IdentityProvider, payload: HTPasswdPayload) -> ProviderResources {
    debug!("moving htpasswd file {} into {HTPASSWD_SECRET}", payload.file);
    let secret = Secret::new(
        HTPASSWD_SECRET,
        PayloadKind::Htpasswd,
        provider.side_files.htpasswd.clone(),
    );

    let spec = HTPasswdSpec {
        file_data: NameReference::to(secret.name()),
    };

    ProviderResources::new(provider, ProviderSpec::HTPasswd { htpasswd: spec }).with_secret(secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::tests::provider;
    use serde_json::json;

    #[test]
    fn one_secret_no_configmap() {
        let mut p = provider("HTPasswdPasswordIdentityProvider", "htpasswd_auth", json!({}));
        p.side_files.htpasswd = b"user:hash".to_vec();

        let resources = build(&p, HTPasswdPayload::default());

        assert_eq!(resources.secrets.len(), 1);
        assert_eq!(resources.secrets[0].payload_kind(), PayloadKind::Htpasswd);
        assert_eq!(resources.secrets[0].content(), b"user:hash");
        assert!(resources.config_maps.is_empty());
        assert_eq!(resources.fragment.mapping_method, "claim");
    }
}
