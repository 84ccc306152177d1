use crate::error::{CognitiveError, CognitiveResult};
use secrecy::{ExposeSecret, SecretString};

/// Credential types supported by the Cognitive AI SDK.
#[derive(Clone)]
pub enum ServiceCredential {
    /// API key authentication. Sent as a bearer token.
    ApiKey(SecretString),

    /// A pre-acquired bearer token, typically injected by a deployment
    /// platform. Read from `COGNITIVE_AI_TOKEN` at resolve time.
    BearerToken,
}

impl ServiceCredential {
    /// Create a credential from the `COGNITIVE_AI_API_KEY` environment variable.
    /// Falls back to a platform-provided bearer token if the variable is not set.
    pub fn from_env() -> CognitiveResult<Self> {
        match std::env::var("COGNITIVE_AI_API_KEY") {
            Ok(key) if !key.is_empty() => Ok(Self::ApiKey(SecretString::from(key))),
            _ => Ok(Self::BearerToken),
        }
    }

    /// Create an API key credential.
    pub fn api_key(key: impl Into<String>) -> Self {
        Self::ApiKey(SecretString::from(key.into()))
    }

    /// Create a platform bearer-token credential.
    pub fn bearer_token() -> Self {
        Self::BearerToken
    }

    /// Resolve the credential to an authorization header value.
    pub fn resolve(&self) -> CognitiveResult<String> {
        match self {
            Self::ApiKey(key) => Ok(format!("Bearer {}", key.expose_secret())),
            Self::BearerToken => {
                let token = std::env::var("COGNITIVE_AI_TOKEN").map_err(|_| {
                    CognitiveError::Auth(
                        "no bearer token available. \
                         Set COGNITIVE_AI_API_KEY or COGNITIVE_AI_TOKEN."
                            .into(),
                    )
                })?;
                Ok(format!("Bearer {token}"))
            }
        }
    }
}

impl std::fmt::Debug for ServiceCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey(_) => write!(f, "ServiceCredential::ApiKey(****)"),
            Self::BearerToken => write!(f, "ServiceCredential::BearerToken"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn api_key_resolves_to_bearer_header() {
        let cred = ServiceCredential::api_key("secret-key");
        assert_eq!(cred.resolve().unwrap(), "Bearer secret-key");
    }

    #[test]
    fn debug_redacts_api_key() {
        let cred = ServiceCredential::api_key("secret-key");
        let debug = format!("{cred:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("****"));
    }

    #[test]
    #[serial]
    fn from_env_prefers_api_key() {
        std::env::set_var("COGNITIVE_AI_API_KEY", "env-key");

        let cred = ServiceCredential::from_env().unwrap();
        assert_eq!(cred.resolve().unwrap(), "Bearer env-key");

        std::env::remove_var("COGNITIVE_AI_API_KEY");
    }

    #[test]
    #[serial]
    fn bearer_token_requires_env() {
        std::env::remove_var("COGNITIVE_AI_TOKEN");

        let cred = ServiceCredential::bearer_token();
        let err = cred.resolve().unwrap_err();
        assert!(matches!(err, CognitiveError::Auth(_)));
    }

    #[test]
    #[serial]
    fn bearer_token_resolves_from_env() {
        std::env::set_var("COGNITIVE_AI_TOKEN", "platform-token");

        let cred = ServiceCredential::bearer_token();
        assert_eq!(cred.resolve().unwrap(), "Bearer platform-token");

        std::env::remove_var("COGNITIVE_AI_TOKEN");
    }
}
