//! Configuration loading for conceptmark.
//! Reads conceptmark.toml from the current directory or the path in CONCEPTMARK_CONFIG.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ConceptmarkError, Result};

pub const CONFIG_ENV_VAR: &str = "CONCEPTMARK_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "conceptmark.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub groups: GroupsConfig,
    #[serde(default)]
    pub links: LinksConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

/// Semantic groups offered by the annotation service.
///
/// When `service` is unset the built-in catalog is used. Otherwise it maps each
/// group id (e.g. `DISO`) to its normalized label, in display order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupsConfig {
    #[serde(default)]
    pub service: Option<IndexMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinksConfig {
    #[serde(default = "default_redirect_prefix")]
    pub redirect_prefix: String,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self { redirect_prefix: default_redirect_prefix() }
    }
}

fn default_redirect_prefix() -> String { "api/concept/redirect/".to_string() }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Wrap rendered markup in a `<div>` container.
    #[serde(default = "default_wrap")]
    pub wrap_in_container: bool,
    #[serde(default = "default_container_class")]
    pub container_class: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            wrap_in_container: default_wrap(),
            container_class: default_container_class(),
        }
    }
}

fn default_wrap()            -> bool   { true }
fn default_container_class() -> String { "annotated-text".to_string() }

impl Config {
    /// Load configuration from conceptmark.toml.
    /// Checks CONCEPTMARK_CONFIG env var first, then current directory.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV_VAR)
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&path)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConceptmarkError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Like [`Config::load`], but falls back to defaults when no file exists.
    pub fn load_or_default() -> Result<Self> {
        match Self::load() {
            Err(ConceptmarkError::Config(msg)) if msg.starts_with("config file not found") => {
                debug!("{msg}; using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| ConceptmarkError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let Some(service) = &self.groups.service {
            if service.is_empty() {
                return Err(ConceptmarkError::Config(
                    "[groups.service] must list at least one group".to_string(),
                ));
            }
            if let Some(bad) = service.keys().find(|id| id.is_empty() || id.contains(':')) {
                return Err(ConceptmarkError::Config(format!("invalid group id {bad:?}")));
            }
        }
        Ok(())
    }
}
