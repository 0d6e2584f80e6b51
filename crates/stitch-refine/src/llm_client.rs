use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde_json::{Value, json};
use stitch_config::RefineConfig;
use tracing::{debug, warn};

use crate::prompt::RefineRequest;

/// Cooldown for a rate-limited model when the service gives no `Retry-After`.
const FALLBACK_COOLDOWN: Duration = Duration::from_secs(600);

/// Error codes OpenAI-compatible services use for rate and quota rejections.
const RATE_LIMIT_CODES: &[&str] = &[
    "rate_limit_exceeded",
    "rate_limit_error",
    "insufficient_quota",
];

/// The external reasoning service, one request/response exchange per call.
#[async_trait]
pub trait RefinementLlmClient: Send + Sync {
    /// Send the request and return the raw response text, unvalidated.
    async fn complete(&self, request: &RefineRequest) -> Result<String>;
}

/// OpenAI-compatible `/chat/completions` client.
///
/// Each call makes exactly one HTTP request. A rate or quota rejection benches
/// the model and fails the call; later calls go to the next model that is not
/// benched.
pub struct ApiClient {
    base_url: String,
    api_key: String,
    temperature: f32,
    client: reqwest::Client,
    pool: Mutex<ModelPool>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        models: Vec<String>,
        temperature: f32,
    ) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            temperature,
            client: reqwest::Client::new(),
            pool: Mutex::new(ModelPool::new(models)?),
        })
    }

    pub fn from_config(config: &RefineConfig) -> Result<Self> {
        Self::new(
            config.base_url.as_str(),
            config.api_key.as_str(),
            config.model_list(),
            config.temperature,
        )
    }

    fn with_pool<T>(&self, f: impl FnOnce(&mut ModelPool) -> T) -> Result<T> {
        let mut pool = self
            .pool
            .lock()
            .map_err(|_| anyhow!("refinement model pool poisoned"))?;
        Ok(f(&mut pool))
    }

    async fn post_chat(&self, model: &str, request: &RefineRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(%model, %url, "sending refinement request");
        let payload = json!({
            "model": model,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.user}
            ],
            "temperature": self.temperature,
            "response_format": {"type": "json_object"}
        });
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("refinement request to {model} failed"))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .with_context(|| format!("reading refinement response from {model}"))?;

        if status.is_success() {
            return completion_text(&body);
        }
        if let Some(cooldown) = rate_limit_cooldown(status, &headers, &body) {
            self.with_pool(|pool| pool.bench(model, Instant::now() + cooldown))?;
            warn!(%model, %status, cooldown_secs = cooldown.as_secs(), "refinement model benched");
            bail!("refinement model {model} rejected the request: {status}");
        }
        bail!("refinement model {model} answered {status}: {body}")
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RefinementLlmClient for ApiClient {
    async fn complete(&self, request: &RefineRequest) -> Result<String> {
        let model = self
            .with_pool(|pool| pool.pick(Instant::now()))?
            .context("every refinement model is benched after a rate limit")?;
        self.post_chat(&model, request).await
    }
}

/// Configured models in rotation, minus those benched by a rate limit.
#[derive(Debug, Clone)]
pub struct ModelPool {
    models: Vec<String>,
    benched_until: HashMap<String, Instant>,
    cursor: usize,
}

impl ModelPool {
    pub fn new(models: Vec<String>) -> Result<Self> {
        if models.is_empty() {
            bail!("at least one model is required for refinement");
        }
        Ok(Self {
            models,
            benched_until: HashMap::new(),
            cursor: 0,
        })
    }

    /// Model for the next request, starting after the last one handed out.
    /// `None` when every model is benched at `now`.
    pub fn pick(&mut self, now: Instant) -> Option<String> {
        self.benched_until.retain(|_, until| *until > now);
        let count = self.models.len();
        let offset = (0..count).find(|offset| {
            let model = &self.models[(self.cursor + offset) % count];
            !self.benched_until.contains_key(model)
        })?;
        let index = (self.cursor + offset) % count;
        self.cursor = (index + 1) % count;
        Some(self.models[index].clone())
    }

    pub fn bench(&mut self, model: &str, until: Instant) {
        self.benched_until.insert(model.to_string(), until);
    }
}

/// How long to bench the model, when the response is a rate or quota rejection.
fn rate_limit_cooldown(status: StatusCode, headers: &HeaderMap, body: &str) -> Option<Duration> {
    let error_code = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        ["/error/code", "/error/type"]
            .iter()
            .find_map(|pointer| value.pointer(pointer)?.as_str().map(str::to_string))
    });
    let limited = status == StatusCode::TOO_MANY_REQUESTS
        || error_code.is_some_and(|code| RATE_LIMIT_CODES.contains(&code.as_str()));
    if !limited {
        return None;
    }
    Some(retry_after(headers).unwrap_or(FALLBACK_COOLDOWN))
}

/// `Retry-After` as delta seconds or an HTTP date; past dates mean no wait.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let raw = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(seconds) = raw.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let at = DateTime::parse_from_rfc2822(raw).ok()?.with_timezone(&Utc);
    Some((at - Utc::now()).to_std().unwrap_or_default())
}

fn completion_text(body: &str) -> Result<String> {
    let value: Value = serde_json::from_str(body).context("completion response is not JSON")?;
    value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .context("completion response has no choices[0].message.content")
}
