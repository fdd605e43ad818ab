use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::manifest::to_manifests;
use super::report::{ComponentReport, Confidence, Report};
use super::{Extraction, Output, Transform, TransformError, fetch_master_config};
use crate::fetch::{EnvReader, FetchError, Fetcher};
use crate::master_config::{IdentityProviderEntry, OAuthTemplates, TokenConfig};
use crate::oauth::{
    self, IdentityProvider, ProviderKind, SideFiles, StringSource, Templates, drop_nulls,
    translate,
};

/// File references of a provider stanza, peeked before the kind specific decode.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ProviderFiles {
    file: String,
    ca: String,
    #[serde(rename = "clientCA")]
    client_ca: String,
    cert_file: String,
    key_file: String,
    client_secret: Option<StringSource>,
    bind_password: Option<StringSource>,
}

pub struct OAuthTransform<'a> {
    fetcher: &'a dyn Fetcher,
    env: &'a dyn EnvReader,
    master_config_file: String,
}

impl<'a> OAuthTransform<'a> {
    pub fn new<S: Into<String>>(
        fetcher: &'a dyn Fetcher,
        env: &'a dyn EnvReader,
        master_config_file: S,
    ) -> Self {
        Self {
            fetcher,
            env,
            master_config_file: master_config_file.into(),
        }
    }

    fn extract_provider(
        &self,
        entry: &IdentityProviderEntry,
    ) -> Result<IdentityProvider, TransformError> {
        let payload = drop_nulls(entry.provider.clone());
        let kind = payload
            .get("kind")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let raw_payload = serde_json::to_vec(&payload)
            .map_err(|e| TransformError::Parse(entry.name.clone(), e.to_string()))?;

        // unknown kinds are dropped by the translator, their files are never needed
        let side_files = if ProviderKind::from(kind.as_str()).is_known() {
            self.extract_side_files(payload)?
        } else {
            SideFiles::default()
        };

        debug!("extracted {kind} provider {}", entry.name);
        Ok(IdentityProvider {
            kind,
            mapping_method: entry.mapping_method.clone(),
            name: entry.name.clone(),
            raw_payload,
            side_files,
            use_as_challenger: entry.challenge,
            use_as_login: entry.login,
        })
    }

    fn extract_side_files(&self, payload: Value) -> Result<SideFiles, FetchError> {
        // a stanza that does not fit is left to the translator to reject
        let files: ProviderFiles = serde_json::from_value(payload).unwrap_or_default();
        let ca = if files.ca.is_empty() {
            &files.client_ca
        } else {
            &files.ca
        };

        Ok(SideFiles {
            htpasswd: self.fetch_if_set(&files.file)?,
            ca: self.fetch_if_set(ca)?,
            cert: self.fetch_if_set(&files.cert_file)?,
            key: self.fetch_if_set(&files.key_file)?,
            client_secret: self.resolve(files.client_secret.as_ref())?,
            bind_password: self.resolve(files.bind_password.as_ref())?,
        })
    }

    fn extract_templates(&self, templates: &OAuthTemplates) -> Result<Templates, FetchError> {
        let fetch = |path: &str| -> Result<Option<Vec<u8>>, FetchError> {
            if path.is_empty() {
                Ok(None)
            } else {
                self.fetcher.fetch(path).map(Some)
            }
        };
        Ok(Templates {
            login: fetch(&templates.login)?,
            error: fetch(&templates.error)?,
            provider_selection: fetch(&templates.provider_selection)?,
        })
    }

    fn fetch_if_set(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        if path.is_empty() {
            return Ok(Vec::new());
        }
        self.fetcher.fetch(path)
    }

    /// Resolves a string source by value, then file, then environment variable.
    /// Encrypted sources are left unresolved.
    fn resolve(&self, source: Option<&StringSource>) -> Result<Option<String>, FetchError> {
        let Some(source) = source else {
            return Ok(None);
        };
        if !source.key_file.is_empty() {
            return Ok(None);
        }
        if !source.value.is_empty() {
            return Ok(Some(source.value.clone()));
        }
        if !source.file.is_empty() {
            let content = self.fetcher.fetch(&source.file)?;
            let content = String::from_utf8_lossy(&content);
            return Ok(Some(
                content.strip_suffix('\n').unwrap_or(&content).to_string(),
            ));
        }
        if !source.env.is_empty() {
            return Ok(Some(self.env.var(&source.env).unwrap_or_default()));
        }
        Ok(None)
    }
}

impl Transform for OAuthTransform<'_> {
    fn name(&self) -> &str {
        "OAuth"
    }

    fn extract(&self) -> Result<Box<dyn Extraction>, TransformError> {
        info!("OAuthTransform::Extract");
        let master_config = fetch_master_config(self.fetcher, &self.master_config_file)?;
        let Some(oauth_config) = master_config.oauth_config else {
            return Ok(Box::new(OAuthExtraction::default()));
        };

        let providers = oauth_config
            .identity_providers
            .iter()
            .map(|entry| self.extract_provider(entry))
            .collect::<Result<Vec<_>, _>>()?;
        let templates = match &oauth_config.templates {
            Some(templates) => self.extract_templates(templates)?,
            None => Templates::default(),
        };

        Ok(Box::new(OAuthExtraction {
            providers,
            token_config: oauth_config.token_config,
            templates,
        }))
    }
}

#[derive(Debug, Default)]
pub struct OAuthExtraction {
    providers: Vec<IdentityProvider>,
    token_config: Option<TokenConfig>,
    templates: Templates,
}

impl OAuthExtraction {
    fn report(&self) -> ComponentReport {
        let mut component = ComponentReport::new("OAuth");

        for provider in &self.providers {
            let report = match ProviderKind::from(provider.kind.as_str()) {
                ProviderKind::Unknown(_) => Report::unsupported(&provider.name, &provider.kind)
                    .with_comment("Identity provider kind is not supported in OCP4"),
                ProviderKind::Ldap => Report::supported(&provider.name, &provider.kind)
                    .with_confidence(Confidence::Partial)
                    .with_comment("Bind password is inlined in the OAuth resource"),
                _ => Report::supported(&provider.name, &provider.kind),
            };
            component.push(report);
        }

        if self.token_config.is_some() {
            component.push(Report::supported("AccessTokenMaxAgeSeconds", "TokenConfig"));
            component.push(Report::supported("AuthorizeTokenMaxAgeSeconds", "TokenConfig"));
        }

        let templates = [
            ("Login", &self.templates.login),
            ("Error", &self.templates.error),
            ("ProviderSelection", &self.templates.provider_selection),
        ];
        for (name, template) in templates {
            if template.is_some() {
                component.push(Report::supported(name, "Templates"));
            }
        }

        component
    }
}

impl Extraction for OAuthExtraction {
    fn validate(&self) -> Result<(), TransformError> {
        Ok(oauth::validate(&self.providers)?)
    }

    fn transform(&self) -> Result<Vec<Output>, TransformError> {
        info!("OAuthTransform::Transform");
        let resources = translate(&self.providers, self.token_config, &self.templates)?;
        let manifests = to_manifests(&resources.crd, &resources.secrets, &resources.config_maps)?;

        Ok(vec![
            Output::Manifests(manifests),
            Output::Report(self.report()),
        ])
    }
}
