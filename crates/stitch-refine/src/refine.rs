use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use stitch_core::{Assignment, Candidate, ClusterSummary, StitchError};
use tracing::{debug, info, warn};

use crate::RefinementLlmClient;
use crate::prompt::RefineRequest;
use crate::validate::validate_response;

/// Why refinement gave up and left the heuristic placement in force.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    /// Both attempts returned responses that failed validation.
    InvalidResponse(String),
    /// The request could not be built or sent, or the service returned an error.
    Transport(String),
    Timeout,
    /// Stored clusters could not be read, so there was nothing to refine against.
    ClusterStore(String),
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidResponse(detail) => write!(f, "invalid response: {detail}"),
            Self::Transport(detail) => write!(f, "transport error: {detail}"),
            Self::Timeout => write!(f, "timed out"),
            Self::ClusterStore(detail) => write!(f, "cluster store unavailable: {detail}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefineOutcome {
    /// Validated assignments keyed by activity id. Empty on fallback or skip.
    pub assignments: BTreeMap<String, Assignment>,
    pub used_fallback: bool,
    pub attempts: u8,
    pub fallback_reason: Option<FallbackReason>,
}

impl RefineOutcome {
    /// Heuristic placement stays in force; `attempts` calls were made.
    pub fn fallback(attempts: u8, reason: FallbackReason) -> Self {
        Self {
            assignments: BTreeMap::new(),
            used_fallback: true,
            attempts,
            fallback_reason: Some(reason),
        }
    }
}

enum Attempt {
    First,
    Second,
    Fallback(FallbackReason),
}

/// Ask the reasoning service to place `candidates`, at most twice.
///
/// A response failing validation earns one retry with the identical request;
/// a transport error or timeout on either attempt falls back immediately.
/// No candidates means no call at all and no fallback.
pub async fn refine<C>(
    client: &C,
    candidates: &[Candidate],
    summaries: &[ClusterSummary],
    timeout: Duration,
) -> RefineOutcome
where
    C: RefinementLlmClient + ?Sized,
{
    if candidates.is_empty() {
        debug!("no refinement candidates, skipping call");
        return RefineOutcome::default();
    }

    let request = match RefineRequest::build(candidates, summaries) {
        Ok(request) => request,
        Err(error) => {
            warn!(error = %format!("{error:#}"), "could not build refinement request");
            return RefineOutcome::fallback(0, FallbackReason::Transport(format!("{error:#}")));
        }
    };

    let mut state = Attempt::First;
    let mut attempts: u8 = 0;
    loop {
        match state {
            Attempt::First | Attempt::Second => {}
            Attempt::Fallback(reason) => {
                info!(attempts, reason = %reason, "refinement fell back to heuristic placement");
                return RefineOutcome::fallback(attempts, reason);
            }
        }
        attempts += 1;

        let response = tokio::time::timeout(timeout, client.complete(&request)).await;
        state = match response {
            Err(_elapsed) => {
                let error = StitchError::RefinementTimeout {
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                };
                warn!(attempt = attempts, %error, "refinement attempt timed out");
                Attempt::Fallback(FallbackReason::Timeout)
            }
            Ok(Err(error)) => {
                let error = StitchError::RefinementTransport(format!("{error:#}"));
                warn!(attempt = attempts, %error, "refinement attempt failed");
                Attempt::Fallback(FallbackReason::Transport(error.to_string()))
            }
            Ok(Ok(raw)) => match validate_response(&raw, candidates, summaries) {
                Ok(assignments) => {
                    info!(
                        attempt = attempts,
                        assignments = assignments.len(),
                        "refinement response accepted"
                    );
                    return RefineOutcome {
                        assignments,
                        used_fallback: false,
                        attempts,
                        fallback_reason: None,
                    };
                }
                Err(error) => {
                    warn!(attempt = attempts, %error, "refinement response rejected");
                    match state {
                        Attempt::First => Attempt::Second,
                        _ => Attempt::Fallback(FallbackReason::InvalidResponse(error.to_string())),
                    }
                }
            },
        };
    }
}
