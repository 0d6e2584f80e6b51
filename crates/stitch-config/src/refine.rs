use serde::{Deserialize, Serialize};
use std::fmt;

const DEFAULT_TIMEOUT_MS: u64 = 2500;
const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Reasoning-service endpoint used by the refinement step.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineConfig {
    /// Send ambiguous candidates to the reasoning service.
    pub enabled: bool,
    /// OpenAI-compatible API base URL.
    ///
    /// Examples:
    /// - OpenAI:       https://api.openai.com/v1
    /// - Groq:         https://api.groq.com/openai/v1
    /// - Local Ollama: http://localhost:11434/v1
    /// - LiteLLM:      http://localhost:4000/v1
    pub base_url: String,
    /// API key for authentication. `STITCH_API_KEY` takes precedence.
    pub api_key: String,
    /// Comma-separated model list, used in rotation.
    ///
    /// A model answering 429/quota is put in cooldown and skipped by later
    /// requests until it expires.
    pub models: String,
    /// Deadline for one attempt, in milliseconds.
    pub timeout_ms: u64,
    pub temperature: f32,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: String::new(),
            api_key: String::new(),
            models: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl RefineConfig {
    pub fn is_default(&self) -> bool {
        !self.enabled
            && self.base_url.is_empty()
            && self.api_key.is_empty()
            && self.models.is_empty()
            && self.timeout_ms == DEFAULT_TIMEOUT_MS
    }

    pub fn model_list(&self) -> Vec<String> {
        self.models
            .split(',')
            .map(str::trim)
            .filter(|model| !model.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }

    pub fn redacted_api_key(&self) -> String {
        mask_api_key(&self.api_key)
    }

    pub fn redacted_for_display(&self) -> Self {
        let mut redacted = self.clone();
        redacted.api_key = redacted.redacted_api_key();
        redacted
    }
}

impl fmt::Debug for RefineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefineConfig")
            .field("enabled", &self.enabled)
            .field("base_url", &self.base_url)
            .field("api_key", &self.redacted_api_key())
            .field("models", &self.models)
            .field("timeout_ms", &self.timeout_ms)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl fmt::Display for RefineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "enabled={}, base_url=\"{}\", api_key=\"{}\", models=\"{}\", timeout_ms={}",
            self.enabled,
            self.base_url,
            self.redacted_api_key(),
            self.models,
            self.timeout_ms
        )
    }
}

fn mask_api_key(api_key: &str) -> String {
    if api_key.is_empty() {
        return String::new();
    }

    let char_count = api_key.chars().count();
    let prefix: String = api_key.chars().take(3).collect();
    let suffix: String = api_key.chars().skip(char_count.saturating_sub(4)).collect();

    if char_count <= 4 {
        format!("***{suffix}")
    } else {
        format!("{prefix}...{suffix}")
    }
}
