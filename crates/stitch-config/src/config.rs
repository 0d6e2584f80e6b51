//! User configuration for stitch (`~/.config/stitch/config.toml`).
//!
//! A missing file is not an error: every section falls back to defaults,
//! which run the heuristic layer only (refinement disabled).

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::clustering::ClusteringConfig;
use crate::refine::RefineConfig;

/// Environment variable that overrides `refine.api_key`.
pub const API_KEY_ENV: &str = "STITCH_API_KEY";

const APP_NAME: &str = "stitch";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StitchConfig {
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub clustering: ClusteringConfig,
    #[serde(default)]
    pub refine: RefineConfig,
}

/// Identities of the acting user across tools (email, login, handle).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default, rename = "self")]
    pub self_ids: Vec<String>,
}

impl StitchConfig {
    /// Load config from `explicit` when given, otherwise from the default path.
    ///
    /// An explicit path must exist; the default path may be absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file not found: {}", path.display());
                }
                Self::load_from_path(path)?
            }
            None => match Self::config_path() {
                Ok(path) if path.exists() => Self::load_from_path(&path)?,
                Ok(path) => {
                    debug!(path = %path.display(), "no config file, using defaults");
                    Self::default()
                }
                Err(_) => Self::default(),
            },
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.refine.api_key = key.trim().to_string();
            }
        }
    }

    /// Path to the config file: `~/.config/stitch/config.toml`.
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", APP_NAME)
            .context("Failed to determine config directory")?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Copy of the config that is safe to print.
    pub fn redacted_for_display(&self) -> Self {
        let mut redacted = self.clone();
        redacted.refine = self.refine.redacted_for_display();
        redacted
    }

    /// Generate default config TOML with comments as a template.
    pub fn default_template() -> String {
        r#"# stitch configuration
# Location: ~/.config/stitch/config.toml

[identity]
# Every identity the acting user has across tools; excluded from collaborators.
self = []

[clustering]
split_gap_days = 14            # cut components at gaps longer than this
collaborator_window_days = 30
min_shared_collaborators = 2   # values below 2 let one stakeholder merge everything
lexical_window_days = 30
min_shared_keywords = 2
min_keyword_len = 3
recent_cluster_days = 30
max_cluster_summaries = 40
sample_titles = 5
double_check_resolved = false

[refine]
enabled = false
# base_url = "https://api.openai.com/v1"
# api_key = "sk-..."            # or export STITCH_API_KEY
# models = "gpt-4o-mini,gpt-4.1-mini"
timeout_ms = 2500
temperature = 0.1
"#
        .to_string()
    }

    /// Save the default template to the config path, creating directories as needed.
    /// Returns the path where the file was written.
    pub fn save_default_template() -> Result<PathBuf> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(&path, Self::default_template())
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
