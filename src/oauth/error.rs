use thiserror::Error;

/// Errors that stop the translation of a whole batch of identity providers.
#[derive(Error, Debug)]
pub enum OAuthError {
    /// The payload of a recognized provider kind could not be decoded.
    #[error("unable to decode `{kind}` provider `{name}`: `{source}`")]
    Decode {
        name: String,
        kind: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Field level contract violations found before any artifact is built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name can't be empty")]
    EmptyName,
    #[error("Not valid mapping method")]
    InvalidMappingMethod,
    #[error("Client ID can't be empty")]
    EmptyClientId,
    #[error("Client Secret can't be empty")]
    EmptyClientSecret,
    #[error("Usage of encrypted files as secret value is not supported")]
    EncryptedClientSecret,
    #[error("URL can't be empty")]
    EmptyUrl,
    #[error("Key file can't be empty if cert file is specified")]
    MissingKeyFile,
    #[error("Domain name can't be empty")]
    EmptyDomainName,
    #[error("ID can't be empty")]
    EmptyIdAttribute,
    #[error("Email can't be empty")]
    EmptyEmailAttribute,
    #[error("Name can't be empty")]
    EmptyNameAttribute,
    #[error("Preferred username can't be empty")]
    EmptyPreferredUsernameAttribute,
    #[error("Usage of encrypted files as bind password value is not supported")]
    EncryptedBindPassword,
    #[error("All claims are empty. At least one is required")]
    EmptyClaims,
    #[error("Authorization endpoint can't be empty")]
    EmptyAuthorizeUrl,
    #[error("Token endpoint can't be empty")]
    EmptyTokenUrl,
    #[error("Headers can't be empty")]
    EmptyHeaders,
}
