//! Identity-provider translation.
//!
//! Turns the OCP3 `oauthConfig.identityProviders` entries into the OCP4 `OAuth`
//! custom resource plus the Secrets and ConfigMaps its providers reference.
use std::collections::HashSet;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::master_config::TokenConfig;
use crate::resources::{ConfigMap, OAUTH_NAMESPACE, ObjectMeta, PayloadKind, Secret};

pub mod basic_auth;
pub mod error;
pub mod github;
pub mod gitlab;
pub mod google;
pub mod htpasswd;
pub mod keystone;
pub mod ldap;
pub mod openid;
pub mod request_header;
pub mod templates;

pub use error::{OAuthError, ValidationError};
pub use templates::{Templates, TemplatesSpec};

pub const OAUTH_API_VERSION: &str = "config.openshift.io/v1";

const VALID_MAPPING_METHODS: [&str; 4] = ["claim", "lookup", "generate", "add"];

/// An identity provider as extracted from the master config, with every file it
/// references already fetched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityProvider {
    pub kind: String,
    pub mapping_method: String,
    pub name: String,
    /// JSON encoded `provider` stanza, decoded once the kind is known.
    pub raw_payload: Vec<u8>,
    pub side_files: SideFiles,
    pub use_as_challenger: bool,
    pub use_as_login: bool,
}

/// Contents of the local files and string sources a provider points at.
#[derive(Clone, Default, PartialEq)]
pub struct SideFiles {
    pub htpasswd: Vec<u8>,
    pub ca: Vec<u8>,
    pub cert: Vec<u8>,
    pub key: Vec<u8>,
    pub client_secret: Option<String>,
    pub bind_password: Option<String>,
}

impl fmt::Debug for SideFiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SideFiles")
            .field("htpasswd", &format!("{} bytes", self.htpasswd.len()))
            .field("ca", &format!("{} bytes", self.ca.len()))
            .field("cert", &format!("{} bytes", self.cert.len()))
            .field("key", &"redacted")
            .field("client_secret", &"redacted")
            .field("bind_password", &"redacted")
            .finish()
    }
}

/// The closed set of provider kinds OCP3 ships, plus anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderKind {
    BasicAuth,
    GitHub,
    GitLab,
    Google,
    HTPasswd,
    Keystone,
    Ldap,
    OpenId,
    RequestHeader,
    Unknown(String),
}

impl From<&str> for ProviderKind {
    fn from(kind: &str) -> Self {
        match kind {
            "BasicAuthPasswordIdentityProvider" => ProviderKind::BasicAuth,
            "GitHubIdentityProvider" => ProviderKind::GitHub,
            "GitLabIdentityProvider" => ProviderKind::GitLab,
            "GoogleIdentityProvider" => ProviderKind::Google,
            "HTPasswdPasswordIdentityProvider" => ProviderKind::HTPasswd,
            "KeystonePasswordIdentityProvider" => ProviderKind::Keystone,
            "LDAPPasswordIdentityProvider" => ProviderKind::Ldap,
            "OpenIDIdentityProvider" => ProviderKind::OpenId,
            "RequestHeaderIdentityProvider" => ProviderKind::RequestHeader,
            other => ProviderKind::Unknown(other.to_string()),
        }
    }
}

impl ProviderKind {
    pub fn is_known(&self) -> bool {
        !matches!(self, ProviderKind::Unknown(_))
    }
}

/// OCP3 `StringSource`: either a plain string or a `{value, env, file, keyFile}` stanza.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "StringSourceRepr")]
pub struct StringSource {
    pub value: String,
    pub env: String,
    pub file: String,
    pub key_file: String,
}

impl StringSource {
    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && self.env.is_empty() && self.file.is_empty()
    }
}

impl fmt::Debug for StringSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringSource")
            .field("value", &"redacted")
            .field("env", &self.env)
            .field("file", &self.file)
            .field("key_file", &self.key_file)
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringSourceRepr {
    Plain(String),
    Spec {
        #[serde(default)]
        value: String,
        #[serde(default)]
        env: String,
        #[serde(default)]
        file: String,
        #[serde(default, rename = "keyFile")]
        key_file: String,
    },
}

impl From<StringSourceRepr> for StringSource {
    fn from(repr: StringSourceRepr) -> Self {
        match repr {
            StringSourceRepr::Plain(value) => StringSource {
                value,
                ..Default::default()
            },
            StringSourceRepr::Spec {
                value,
                env,
                file,
                key_file,
            } => StringSource {
                value,
                env,
                file,
                key_file,
            },
        }
    }
}

/// Points a CR field at a generated Secret or ConfigMap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameReference {
    pub name: String,
}

impl NameReference {
    pub fn to<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }
}

/// One entry of `spec.identityProviders` in the OCP4 OAuth resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProviderFragment {
    pub name: String,
    pub challenge: bool,
    pub login: bool,
    pub mapping_method: String,
    #[serde(flatten)]
    pub spec: ProviderSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ProviderSpec {
    BasicAuth {
        #[serde(rename = "basicAuth")]
        basic_auth: basic_auth::BasicAuthSpec,
    },
    GitHub {
        github: github::GitHubSpec,
    },
    GitLab {
        gitlab: gitlab::GitLabSpec,
    },
    Google {
        google: google::GoogleSpec,
    },
    HTPasswd {
        htpasswd: htpasswd::HTPasswdSpec,
    },
    Keystone {
        keystone: keystone::KeystoneSpec,
    },
    #[serde(rename = "LDAP")]
    Ldap { ldap: ldap::LdapSpec },
    #[serde(rename = "OpenID")]
    OpenId {
        #[serde(rename = "openID")]
        open_id: openid::OpenIdSpec,
    },
    RequestHeader {
        #[serde(rename = "requestHeader")]
        request_header: request_header::RequestHeaderSpec,
    },
}

/// Output of a single provider builder.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResources {
    pub fragment: IdentityProviderFragment,
    pub secrets: Vec<Secret>,
    pub config_maps: Vec<ConfigMap>,
}

impl ProviderResources {
    fn new(provider: &IdentityProvider, spec: ProviderSpec) -> Self {
        Self {
            fragment: IdentityProviderFragment {
                name: provider.name.clone(),
                challenge: provider.use_as_challenger,
                login: provider.use_as_login,
                mapping_method: provider.mapping_method.clone(),
                spec,
            },
            secrets: Vec::new(),
            config_maps: Vec::new(),
        }
    }

    fn with_secret(mut self, secret: Secret) -> Self {
        self.secrets.push(secret);
        self
    }

    fn with_config_map(mut self, config_map: Option<ConfigMap>) -> Self {
        self.config_maps.extend(config_map);
        self
    }
}

/// The aggregated `OAuth` custom resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthCrd {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: OAuthSpec,
}

impl Default for OAuthCrd {
    fn default() -> Self {
        Self {
            api_version: OAUTH_API_VERSION.to_string(),
            kind: "OAuth".to_string(),
            metadata: ObjectMeta::named("cluster").with_namespace(OAUTH_NAMESPACE),
            spec: OAuthSpec::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthSpec {
    pub identity_providers: Vec<IdentityProviderFragment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_config: Option<TokenConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates: Option<TemplatesSpec>,
}

/// Everything a successful translation produces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OAuthResources {
    pub crd: OAuthCrd,
    pub secrets: Vec<Secret>,
    pub config_maps: Vec<ConfigMap>,
}

/// Decoded provider payload, one variant per supported kind.
enum ProviderPayload {
    BasicAuth(basic_auth::BasicAuthPayload),
    GitHub(github::GitHubPayload),
    GitLab(gitlab::GitLabPayload),
    Google(google::GooglePayload),
    HTPasswd(htpasswd::HTPasswdPayload),
    Keystone(keystone::KeystonePayload),
    Ldap(ldap::LdapPayload),
    OpenId(openid::OpenIdPayload),
    RequestHeader(request_header::RequestHeaderPayload),
}

impl ProviderPayload {
    /// Decodes the payload once the kind is known. Unknown kinds yield `None`.
    fn decode(provider: &IdentityProvider) -> Result<Option<Self>, OAuthError> {
        let payload = match ProviderKind::from(provider.kind.as_str()) {
            ProviderKind::BasicAuth => ProviderPayload::BasicAuth(decode_raw(provider)?),
            ProviderKind::GitHub => ProviderPayload::GitHub(decode_raw(provider)?),
            ProviderKind::GitLab => ProviderPayload::GitLab(decode_raw(provider)?),
            ProviderKind::Google => ProviderPayload::Google(decode_raw(provider)?),
            ProviderKind::HTPasswd => ProviderPayload::HTPasswd(decode_raw(provider)?),
            ProviderKind::Keystone => ProviderPayload::Keystone(decode_raw(provider)?),
            ProviderKind::Ldap => ProviderPayload::Ldap(decode_raw(provider)?),
            ProviderKind::OpenId => ProviderPayload::OpenId(decode_raw(provider)?),
            ProviderKind::RequestHeader => ProviderPayload::RequestHeader(decode_raw(provider)?),
            ProviderKind::Unknown(_) => return Ok(None),
        };
        Ok(Some(payload))
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            ProviderPayload::BasicAuth(p) => basic_auth::validate(p),
            ProviderPayload::GitHub(p) => github::validate(p),
            ProviderPayload::GitLab(p) => gitlab::validate(p),
            ProviderPayload::Google(p) => google::validate(p),
            ProviderPayload::HTPasswd(_) => Ok(()),
            ProviderPayload::Keystone(p) => keystone::validate(p),
            ProviderPayload::Ldap(p) => ldap::validate(p),
            ProviderPayload::OpenId(p) => openid::validate(p),
            ProviderPayload::RequestHeader(p) => request_header::validate(p),
        }
    }

    fn build(self, provider: &IdentityProvider) -> ProviderResources {
        match self {
            ProviderPayload::BasicAuth(p) => basic_auth::build(provider, p),
            ProviderPayload::GitHub(p) => github::build(provider, p),
            ProviderPayload::GitLab(p) => gitlab::build(provider, p),
            ProviderPayload::Google(p) => google::build(provider, p),
            ProviderPayload::HTPasswd(p) => htpasswd::build(provider, p),
            ProviderPayload::Keystone(p) => keystone::build(provider, p),
            ProviderPayload::Ldap(p) => ldap::build(provider, p),
            ProviderPayload::OpenId(p) => openid::build(provider, p),
            ProviderPayload::RequestHeader(p) => request_header::build(provider, p),
        }
    }
}

fn decode_raw<T: DeserializeOwned>(provider: &IdentityProvider) -> Result<T, OAuthError> {
    let decode_error = |source| OAuthError::Decode {
        name: provider.name.clone(),
        kind: provider.kind.clone(),
        source,
    };
    let payload: Value = serde_json::from_slice(&provider.raw_payload).map_err(decode_error)?;
    serde_json::from_value(drop_nulls(payload)).map_err(decode_error)
}

/// Removes null valued keys so that keys left empty in the YAML (`ca:`) decode to
/// their defaults.
pub(crate) fn drop_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(key, value)| (key, drop_nulls(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(drop_nulls).collect()),
        other => other,
    }
}

/// Translates the identity providers, token config and templates into the OAuth
/// resource and its side artifacts.
///
/// Providers of an unknown kind are logged and dropped. A payload that cannot be
/// decoded fails the whole call.
pub fn translate(
    providers: &[IdentityProvider],
    token_config: Option<TokenConfig>,
    templates: &Templates,
) -> Result<OAuthResources, OAuthError> {
    let mut resources = OAuthResources::default();

    for provider in providers {
        let Some(payload) = ProviderPayload::decode(provider)? else {
            warn!("Can't handle {} OAuth kind", provider.kind);
            continue;
        };
        debug!("translating {} provider {}", provider.kind, provider.name);

        let built = payload.build(provider);
        resources.crd.spec.identity_providers.push(built.fragment);
        resources.secrets.extend(built.secrets);
        resources.config_maps.extend(built.config_maps);
    }

    resources.crd.spec.token_config = token_config;

    let (templates_spec, template_secrets) = templates::translate(templates);
    resources.crd.spec.templates = templates_spec;
    resources.secrets.extend(template_secrets);

    warn_on_duplicates(
        "secret",
        resources.secrets.iter().map(|secret| secret.name()),
    );
    warn_on_duplicates(
        "configmap",
        resources.config_maps.iter().map(|config_map| config_map.name()),
    );

    Ok(resources)
}

fn warn_on_duplicates<'a, I>(artifact: &str, names: I)
where
    I: Iterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            warn!("Duplicate {artifact} name {name}, a later manifest will overwrite an earlier one");
        }
    }
}

/// Checks every provider before any translation is attempted. Stops at the first
/// failing provider.
pub fn validate(providers: &[IdentityProvider]) -> Result<(), OAuthError> {
    for provider in providers {
        let Some(payload) = ProviderPayload::decode(provider)? else {
            continue;
        };
        validate_common(provider)?;
        payload.validate()?;
    }
    Ok(())
}

fn validate_common(provider: &IdentityProvider) -> Result<(), ValidationError> {
    if provider.name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    validate_mapping_method(&provider.mapping_method)
}

pub(crate) fn validate_mapping_method(method: &str) -> Result<(), ValidationError> {
    if VALID_MAPPING_METHODS.contains(&method) {
        Ok(())
    } else {
        Err(ValidationError::InvalidMappingMethod)
    }
}

/// Shared by the OAuth2 style providers.
pub(crate) fn validate_client_data(
    client_id: &str,
    client_secret: &StringSource,
) -> Result<(), ValidationError> {
    if !client_secret.key_file.is_empty() {
        return Err(ValidationError::EncryptedClientSecret);
    }
    if client_id.is_empty() {
        return Err(ValidationError::EmptyClientId);
    }
    if client_secret.is_empty() {
        return Err(ValidationError::EmptyClientSecret);
    }
    Ok(())
}

/// `<providerName>-secret` holding the resolved client secret.
pub(crate) fn client_secret(provider: &IdentityProvider, source: &StringSource) -> Secret {
    let content = provider
        .side_files
        .client_secret
        .clone()
        .unwrap_or_else(|| source.value.clone());
    Secret::new(
        format!("{}-secret", provider.name),
        PayloadKind::Literal,
        content.into_bytes(),
    )
}

/// CA bundle ConfigMap, only when the provider references a CA file.
pub(crate) fn ca_config_map(
    ca_path: &str,
    name: &str,
    provider: &IdentityProvider,
) -> Option<ConfigMap> {
    (!ca_path.is_empty()).then(|| ConfigMap::ca_bundle(name, provider.side_files.ca.clone()))
}

/// `<providerName>-client-cert-secret` and `<providerName>-client-key-secret`, both
/// stored under the data key of `kind`.
pub(crate) fn client_cert_secrets(
    provider: &IdentityProvider,
    kind: PayloadKind,
) -> (Secret, Secret) {
    (
        Secret::new(
            format!("{}-client-cert-secret", provider.name),
            kind,
            provider.side_files.cert.clone(),
        ),
        Secret::new(
            format!("{}-client-key-secret", provider.name),
            kind,
            provider.side_files.key.clone(),
        ),
    )
}
