use anyhow::{anyhow, Result};
use keyring::Entry;

use crate::providers::ProviderType;

/// Where provider credentials come from
pub trait KeySource {
    fn key_for(&self, provider: ProviderType) -> Option<String>;
}

/// Reads API keys from the environment, then from the OS keyring
#[derive(Debug, Clone)]
pub struct ApiKeyManager {
    service_name: String,
}

impl ApiKeyManager {
    pub fn new() -> Self {
        Self {
            service_name: "webwright".to_string(),
        }
    }

    /// Environment variable that overrides the keyring for `provider`
    pub fn env_var(provider: ProviderType) -> Option<&'static str> {
        match provider {
            ProviderType::OpenAi => Some("OPENAI_API_KEY"),
            ProviderType::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderType::Ollama => None,
        }
    }

    /// Keyring entry for a provider
    pub fn get_key(&self, provider: ProviderType) -> Result<String> {
        let entry = Entry::new(&self.service_name, provider.as_str())?;
        entry
            .get_password()
            .map_err(|_| anyhow!("No API key found for provider: {}", provider))
    }
}

impl Default for ApiKeyManager {
    fn default() -> Self {
        Self::new()
    }
}

impl KeySource for ApiKeyManager {
    fn key_for(&self, provider: ProviderType) -> Option<String> {
        let env_var = Self::env_var(provider)?;
        resolve_key(std::env::var(env_var).ok(), || self.get_key(provider).ok())
    }
}

/// Non-blank environment value first, keyring second
fn resolve_key(from_env: Option<String>, from_keyring: impl FnOnce() -> Option<String>) -> Option<String> {
    from_env
        .filter(|key| !key.trim().is_empty())
        .or_else(from_keyring)
        .filter(|key| !key.trim().is_empty())
}
