use serde::Serialize;

use super::NameReference;
use crate::resources::{PayloadKind, Secret};

const LOGIN_SECRET: &str = "templates-login-secret";
const ERROR_SECRET: &str = "templates-error-secret";
const PROVIDER_SELECTION_SECRET: &str = "templates-providerselect-secret";

/// Contents of the custom OAuth pages, when configured.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Templates {
    pub login: Option<Vec<u8>>,
    pub error: Option<Vec<u8>>,
    pub provider_selection: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatesSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<NameReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<NameReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_selection: Option<NameReference>,
}

pub(super) fn translate(templates: &Templates) -> (Option<TemplatesSpec>, Vec<Secret>) {
    let mut spec = TemplatesSpec::default();
    let mut secrets = Vec::new();

    let mut template_secret = |content: &Option<Vec<u8>>, name: &str| {
        content.as_ref().map(|content| {
            secrets.push(Secret::new(name, PayloadKind::Literal, content.clone()));
            NameReference::to(name)
        })
    };
    spec.login = template_secret(&templates.login, LOGIN_SECRET);
    spec.error = template_secret(&templates.error, ERROR_SECRET);
    spec.provider_selection =
        template_secret(&templates.provider_selection, PROVIDER_SELECTION_SECRET);

    if secrets.is_empty() {
        (None, secrets)
    } else {
        (Some(spec), secrets)
    }
}
