use serde::Serialize;

use crate::oauth::OAuthCrd;
use crate::resources::{ConfigMap, Secret};

const MANIFEST_PREFIX: &str = "100_CPMA-cluster-config-";

#[derive(thiserror::Error, Debug)]
pub enum ManifestError {
    #[error("unable to serialize `{0}` manifest: `{1}`")]
    Serialize(String, String),
}

/// A serialized custom resource ready to be written under `manifests/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    file_name: String,
    content: Vec<u8>,
}

impl Manifest {
    pub fn new<S: Into<String>>(file_name: S, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

pub fn oauth_file_name() -> String {
    domain_file_name("oauth")
}

pub fn secret_file_name(secret_name: &str) -> String {
    format!("{MANIFEST_PREFIX}secret-{secret_name}.yaml")
}

pub fn config_map_file_name(config_map_name: &str) -> String {
    format!("{MANIFEST_PREFIX}configmap-{config_map_name}.yaml")
}

pub fn domain_file_name(domain: &str) -> String {
    format!("{MANIFEST_PREFIX}{domain}.yaml")
}

/// Serializes a single domain resource into `100_CPMA-cluster-config-<domain>.yaml`.
pub fn domain_manifest<T: Serialize>(domain: &str, resource: &T) -> Result<Manifest, ManifestError> {
    let content = to_yaml(domain, resource)?;
    Ok(Manifest::new(domain_file_name(domain), content))
}

/// OAuth resource first, then secrets and configmaps in the order they were generated.
pub fn to_manifests(
    crd: &OAuthCrd,
    secrets: &[Secret],
    config_maps: &[ConfigMap],
) -> Result<Vec<Manifest>, ManifestError> {
    let mut manifests = vec![Manifest::new(oauth_file_name(), to_yaml("oauth", crd)?)];

    for secret in secrets {
        manifests.push(Manifest::new(
            secret_file_name(secret.name()),
            to_yaml(secret.name(), &secret.to_document())?,
        ));
    }
    for config_map in config_maps {
        manifests.push(Manifest::new(
            config_map_file_name(config_map.name()),
            to_yaml(config_map.name(), &config_map.to_document())?,
        ));
    }

    Ok(manifests)
}

fn to_yaml<T: Serialize>(what: &str, resource: &T) -> Result<Vec<u8>, ManifestError> {
    serde_yaml::to_string(resource)
        .map(String::into_bytes)
        .map_err(|e| ManifestError::Serialize(what.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::PayloadKind;
    use rstest::rstest;

    #[rstest]
    #[case(oauth_file_name(), "100_CPMA-cluster-config-oauth.yaml")]
    #[case(secret_file_name("htpasswd-secret"), "100_CPMA-cluster-config-secret-htpasswd-secret.yaml")]
    #[case(config_map_file_name("github-configmap"), "100_CPMA-cluster-config-configmap-github-configmap.yaml")]
    #[case(domain_file_name("sdn"), "100_CPMA-cluster-config-sdn.yaml")]
    fn file_names(#[case] actual: String, #[case] expected: &str) {
        assert_eq!(actual, expected);
    }

    #[test]
    fn oauth_manifests_in_order() {
        let secrets = vec![
            Secret::new("htpasswd-secret", PayloadKind::Htpasswd, b"admin:$apr1$...".to_vec()),
            Secret::new("gh-secret", PayloadKind::Literal, b"s".to_vec()),
        ];
        let config_maps = vec![ConfigMap::ca_bundle("github-configmap", b"ca".to_vec())];

        let manifests = to_manifests(&OAuthCrd::default(), &secrets, &config_maps).unwrap();
        let names: Vec<&str> = manifests.iter().map(Manifest::file_name).collect();

        assert_eq!(
            names,
            vec![
                "100_CPMA-cluster-config-oauth.yaml",
                "100_CPMA-cluster-config-secret-htpasswd-secret.yaml",
                "100_CPMA-cluster-config-secret-gh-secret.yaml",
                "100_CPMA-cluster-config-configmap-github-configmap.yaml",
            ]
        );
    }

    #[test]
    fn secret_manifest_content() {
        let secrets = vec![Secret::new("htpasswd-secret", PayloadKind::Htpasswd, b"admin:x".to_vec())];
        let manifests = to_manifests(&OAuthCrd::default(), &secrets, &[]).unwrap();

        let yaml: serde_yaml::Value = serde_yaml::from_slice(manifests[1].content()).unwrap();
        assert_eq!(yaml["apiVersion"], "v1");
        assert_eq!(yaml["kind"], "Secret");
        assert_eq!(yaml["type"], "Opaque");
        assert_eq!(yaml["metadata"]["name"], "htpasswd-secret");
        assert_eq!(yaml["metadata"]["namespace"], "openshift-config");
        assert_eq!(yaml["data"]["htpasswd"], "YWRtaW46eA==");
    }

    #[test]
    fn serialization_is_stable() {
        let secrets = vec![Secret::new("s", PayloadKind::Literal, b"x".to_vec())];
        let first = to_manifests(&OAuthCrd::default(), &secrets, &[]).unwrap();
        let second = to_manifests(&OAuthCrd::default(), &secrets, &[]).unwrap();
        assert_eq!(first, second);
    }
}
