use crate::api_keys::KeySource;
use crate::error_handling::display_warning;
use crate::logging::LogCategory;
use crate::log_warning;
use crate::providers::ProviderType;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// `openai`, `anthropic` or `ollama`; unset picks the first provider with credentials
    #[serde(default)]
    pub preferred_api: Option<String>,

    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    #[serde(default = "default_openai_url")]
    pub openai_url: String,

    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,

    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,

    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Milliseconds allowed for one language-model call
    #[serde(default = "default_ai_timeout")]
    pub ai_timeout: u64,

    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default = "default_show_boot_splash")]
    pub show_boot_splash: bool,
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-5-sonnet-latest".to_string()
}

fn default_ollama_model() -> String {
    "llama3".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ai_timeout() -> u64 {
    120000
}

fn default_command_timeout_secs() -> u64 {
    300
}

fn default_show_boot_splash() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preferred_api: None,
            openai_model: default_openai_model(),
            openai_url: default_openai_url(),
            anthropic_model: default_anthropic_model(),
            ollama_model: default_ollama_model(),
            ollama_url: default_ollama_url(),
            ai_timeout: default_ai_timeout(),
            command_timeout_secs: default_command_timeout_secs(),
            username: None,
            show_boot_splash: default_show_boot_splash(),
        }
    }
}

/// Provider chosen at startup, with whatever credentials were found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSelection {
    pub api: ProviderType,
    pub model: String,
    pub openai_key: Option<String>,
    pub anthropic_key: Option<String>,
}

impl Config {
    /// Load `~/.webwright/config.json`, writing defaults when it is missing
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// `~/.webwright/config.json`
    pub fn default_path() -> Option<PathBuf> {
        webwright_dir().map(|dir| dir.join("config.json"))
    }

    /// Re-read an existing file without warnings or writes
    pub fn reload_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// `(setting, old, new)` for every field that differs from `previous`
    pub fn changes_from(&self, previous: &Config) -> Vec<(String, String, String)> {
        let (Ok(Value::Object(new)), Ok(Value::Object(old))) =
            (serde_json::to_value(self), serde_json::to_value(previous))
        else {
            return Vec::new();
        };

        new.iter()
            .filter(|(key, value)| old.get(key.as_str()) != Some(*value))
            .map(|(key, value)| {
                let before = old.get(key.as_str()).map(display_value).unwrap_or_default();
                (key.clone(), before, display_value(value))
            })
            .collect()
    }

    /// Load from `path`. Unreadable or invalid files fall back to defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::create_default_config(Some(path));
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn_invalid(&format!("Failed to read configuration: {}", e));
                return Self::default();
            }
        };

        match serde_json::from_str::<Config>(&content) {
            Ok(config) => match config.validate() {
                Ok(()) => config,
                Err(e) => {
                    warn_invalid(&format!("Invalid configuration detected: {}", e));
                    Self::default()
                }
            },
            Err(e) => {
                warn_invalid(&format!("Failed to parse configuration: {}", e));
                Self::default()
            }
        }
    }

    fn create_default_config(path: Option<&Path>) -> Self {
        let config = Self::default();

        if let Some(path) = path {
            if let Err(e) = config.save_to(path) {
                log_warning!(
                    LogCategory::Configuration,
                    format!("Could not write default configuration: {}", e)
                );
            }
        }

        config
    }

    pub fn validate(&self) -> Result<()> {
        if self.ai_timeout == 0 {
            return Err(anyhow!("ai_timeout must be greater than 0"));
        }
        if self.ai_timeout > 600000 {
            return Err(anyhow!("ai_timeout cannot exceed 10 minutes (600000ms)"));
        }

        if self.command_timeout_secs == 0 {
            return Err(anyhow!("command_timeout_secs must be greater than 0"));
        }
        if self.command_timeout_secs > 3600 {
            return Err(anyhow!("command_timeout_secs cannot exceed 1 hour (3600s)"));
        }

        for (name, url) in [("openai_url", &self.openai_url), ("ollama_url", &self.ollama_url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(anyhow!("{} must be a valid HTTP/HTTPS URL", name));
            }
        }

        for (name, model) in [
            ("openai_model", &self.openai_model),
            ("anthropic_model", &self.anthropic_model),
            ("ollama_model", &self.ollama_model),
        ] {
            if model.trim().is_empty() {
                return Err(anyhow!("{} cannot be empty", name));
            }
        }

        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_millis(self.ai_timeout)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn model_for(&self, api: ProviderType) -> &str {
        match api {
            ProviderType::OpenAi => &self.openai_model,
            ProviderType::Anthropic => &self.anthropic_model,
            ProviderType::Ollama => &self.ollama_model,
        }
    }

    /// Configured name, else the login name, else "user"
    pub fn get_username(&self) -> String {
        self.username
            .clone()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| std::env::var("USER").ok())
            .or_else(|| std::env::var("USERNAME").ok())
            .unwrap_or_else(|| "user".to_string())
    }

    /// Pick the provider for this session.
    ///
    /// The error is the exact line to print before exiting with status 1.
    pub fn determine_api_to_use(&self, keys: &dyn KeySource) -> std::result::Result<ProviderSelection, String> {
        let openai_key = keys.key_for(ProviderType::OpenAi);
        let anthropic_key = keys.key_for(ProviderType::Anthropic);

        let api = match self.preferred_api.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name
                .parse::<ProviderType>()
                .map_err(|_| "No AI provider selected. Exiting program.".to_string())?,
            _ => {
                if openai_key.is_some() {
                    ProviderType::OpenAi
                } else if anthropic_key.is_some() {
                    ProviderType::Anthropic
                } else {
                    ProviderType::Ollama
                }
            }
        };

        match api {
            ProviderType::OpenAi if openai_key.is_none() => {
                return Err("Error: OpenAI selected but OPENAI_API_KEY is not configured.".to_string())
            }
            ProviderType::Anthropic if anthropic_key.is_none() => {
                return Err(
                    "Error: Anthropic selected but ANTHROPIC_API_KEY is not configured.".to_string(),
                )
            }
            _ => {}
        }

        Ok(ProviderSelection {
            api,
            model: self.model_for(api).to_string(),
            openai_key,
            anthropic_key,
        })
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "unset".to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// `~/.webwright`, home of the config, log and history files
pub fn webwright_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".webwright"))
}

fn warn_invalid(message: &str) {
    display_warning(&format!("{}. Using safe defaults.", message));
    log_warning!(LogCategory::Configuration, message);
}
