use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::client::DEFAULT_ENDPOINT;
use crate::locale::Language;

pub const ENDPOINT_ENV: &str = "RAGCHAT_ENDPOINT";
pub const LANG_ENV: &str = "RAGCHAT_LANG";
pub const DEFAULT_ASSISTANT_NAME: &str = "Gemini";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub endpoint: Option<String>,
    pub language: Option<String>,
    pub assistant_name: Option<String>,
}

/// Values after applying CLI flags, environment and the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub endpoint: String,
    pub language: Language,
    pub assistant_name: String,
}

/// Overrides that take precedence over everything else (CLI flags).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub language: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Store the given values in this file, leaving unset ones untouched.
    /// Blank values clear the stored entry.
    pub fn apply(&mut self, overrides: &Overrides, assistant_name: Option<String>) {
        fn merge(slot: &mut Option<String>, value: Option<&String>) {
            if let Some(value) = value {
                let value = value.trim();
                *slot = (!value.is_empty()).then(|| value.to_string());
            }
        }

        merge(&mut self.endpoint, overrides.endpoint.as_ref());
        merge(&mut self.language, overrides.language.as_ref());
        merge(&mut self.assistant_name, assistant_name.as_ref());
    }

    /// Resolve the effective settings: overrides, then environment, then this
    /// file, then built-in defaults.
    pub fn resolve(&self, overrides: &Overrides) -> Settings {
        let endpoint = overrides
            .endpoint
            .clone()
            .or_else(|| env_value(ENDPOINT_ENV))
            .or_else(|| self.endpoint.clone())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let language = overrides
            .language
            .clone()
            .or_else(|| env_value(LANG_ENV))
            .or_else(|| self.language.clone())
            .map(|raw| {
                Language::from_str(&raw).unwrap_or_else(|| {
                    tracing::warn!(language = %raw, "unknown language, using default");
                    Language::default()
                })
            })
            .unwrap_or_default();

        let assistant_name = self
            .assistant_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ASSISTANT_NAME.to_string());

        Settings {
            endpoint,
            language,
            assistant_name,
        }
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("ragchat").join("config.json"))
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
