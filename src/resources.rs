use std::collections::BTreeMap;
use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Namespace every generated OAuth side artifact lives in.
pub const OAUTH_NAMESPACE: &str = "openshift-config";

const CORE_API_VERSION: &str = "v1";

/// Metadata shared by every generated resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

impl ObjectMeta {
    pub fn named<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_namespace<S: Into<String>>(self, namespace: S) -> Self {
        Self {
            namespace: Some(namespace.into()),
            ..self
        }
    }

    pub fn with_annotation<K: Into<String>, V: Into<String>>(self, key: K, value: V) -> Self {
        let mut annotations = self.annotations.unwrap_or_default();
        annotations.insert(key.into(), value.into());
        Self {
            annotations: Some(annotations),
            ..self
        }
    }
}

/// Top level resource with a `spec`, as emitted by the non OAuth units.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource<S> {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: S,
}

impl<S> Resource<S> {
    pub fn new<A: Into<String>, K: Into<String>>(
        api_version: A,
        kind: K,
        metadata: ObjectMeta,
        spec: S,
    ) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            metadata,
            spec,
        }
    }
}

/// Determines the data key a side artifact stores its content under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Htpasswd,
    Keystone,
    BasicAuth,
    Literal,
    CaBundle,
}

impl PayloadKind {
    pub fn data_key(&self) -> &'static str {
        match self {
            PayloadKind::Htpasswd => "htpasswd",
            PayloadKind::Keystone => "keystone",
            PayloadKind::BasicAuth => "basicAuth",
            PayloadKind::Literal => "clientSecret",
            PayloadKind::CaBundle => "ca.crt",
        }
    }
}

/// A generated Secret. Content is kept raw and base64 encoded on serialization.
#[derive(Clone, PartialEq)]
pub struct Secret {
    name: String,
    namespace: String,
    payload_kind: PayloadKind,
    content: Vec<u8>,
}

impl Secret {
    pub fn new<S: Into<String>>(name: S, payload_kind: PayloadKind, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            namespace: OAUTH_NAMESPACE.to_string(),
            payload_kind,
            content,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn payload_kind(&self) -> PayloadKind {
        self.payload_kind
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Kubernetes representation of the secret, ready to be serialized.
    pub fn to_document(&self) -> SecretDocument {
        SecretDocument {
            api_version: CORE_API_VERSION.to_string(),
            kind: "Secret".to_string(),
            secret_type: "Opaque".to_string(),
            metadata: ObjectMeta::named(self.name.as_str()).with_namespace(self.namespace.as_str()),
            data: BTreeMap::from([(
                self.payload_kind.data_key().to_string(),
                STANDARD.encode(&self.content),
            )]),
        }
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("payload_kind", &self.payload_kind)
            .field("content", &"redacted")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecretDocument {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    #[serde(rename = "type")]
    pub secret_type: String,
    pub metadata: ObjectMeta,
    pub data: BTreeMap<String, String>,
}

/// A generated ConfigMap holding a CA bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigMap {
    name: String,
    namespace: String,
    payload_kind: PayloadKind,
    content: Vec<u8>,
}

impl ConfigMap {
    pub fn ca_bundle<S: Into<String>>(name: S, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            namespace: OAUTH_NAMESPACE.to_string(),
            payload_kind: PayloadKind::CaBundle,
            content,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn payload_kind(&self) -> PayloadKind {
        self.payload_kind
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn to_document(&self) -> ConfigMapDocument {
        ConfigMapDocument {
            api_version: CORE_API_VERSION.to_string(),
            kind: "ConfigMap".to_string(),
            metadata: ObjectMeta::named(self.name.as_str()).with_namespace(self.namespace.as_str()),
            data: BTreeMap::from([(
                self.payload_kind.data_key().to_string(),
                String::from_utf8_lossy(&self.content).into_owned(),
            )]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigMapDocument {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub data: BTreeMap<String, String>,
}
