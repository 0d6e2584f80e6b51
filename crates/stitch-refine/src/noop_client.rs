use anyhow::{Result, bail};
use async_trait::async_trait;

use crate::{RefineRequest, RefinementLlmClient};

/// Client for runs without a reasoning service. Every call fails as a transport error.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopClient;

#[async_trait]
impl RefinementLlmClient for NoopClient {
    async fn complete(&self, _request: &RefineRequest) -> Result<String> {
        bail!("no reasoning service configured")
    }
}
