use anyhow::{Result, bail};
use tracing::warn;

use crate::clustering::ClusteringConfig;
use crate::config::StitchConfig;
use crate::refine::RefineConfig;

/// Longest accepted day window (about ten years).
pub const MAX_WINDOW_DAYS: i64 = 3650;

/// Validate a loaded configuration.
/// Returns Ok(()) if valid, or Err with a descriptive message.
pub fn validate_config(config: &StitchConfig) -> Result<()> {
    validate_clustering(&config.clustering)?;
    validate_refine(&config.refine)?;
    warn_missing_identity(config);
    Ok(())
}

/// Check the heuristic thresholds on their own.
///
/// Also run by the graph layer before every build.
pub fn validate_clustering(config: &ClusteringConfig) -> Result<()> {
    let windows = [
        ("clustering.split_gap_days", config.split_gap_days),
        (
            "clustering.collaborator_window_days",
            config.collaborator_window_days,
        ),
        ("clustering.lexical_window_days", config.lexical_window_days),
        ("clustering.recent_cluster_days", config.recent_cluster_days),
    ];
    for (key, days) in windows {
        if days <= 0 {
            bail!("{key} must be > 0 (got {days})");
        }
        if days > MAX_WINDOW_DAYS {
            bail!("{key} must be <= {MAX_WINDOW_DAYS} (got {days})");
        }
    }

    if config.min_shared_collaborators < 2 {
        bail!(
            "clustering.min_shared_collaborators must be >= 2 (got {}). \
             A single shared person (a manager, a broadly cc'd stakeholder) \
             would chain unrelated efforts together.",
            config.min_shared_collaborators
        );
    }
    if config.min_shared_keywords < 2 {
        bail!(
            "clustering.min_shared_keywords must be >= 2 (got {})",
            config.min_shared_keywords
        );
    }
    if config.min_keyword_len == 0 {
        bail!("clustering.min_keyword_len must be > 0");
    }
    if config.sample_titles == 0 {
        bail!("clustering.sample_titles must be > 0");
    }
    Ok(())
}

fn validate_refine(config: &RefineConfig) -> Result<()> {
    if config.timeout_ms == 0 {
        bail!("refine.timeout_ms must be > 0 (got 0)");
    }
    if !(0.0..=2.0).contains(&config.temperature) {
        bail!(
            "refine.temperature must be within 0.0..=2.0 (got {})",
            config.temperature
        );
    }
    if !config.enabled {
        return Ok(());
    }
    if config.base_url.trim().is_empty() {
        bail!("refine.base_url is required when refine.enabled = true");
    }
    if !(config.base_url.starts_with("http://") || config.base_url.starts_with("https://")) {
        bail!(
            "refine.base_url must start with http:// or https:// (got '{}')",
            config.base_url
        );
    }
    if config.model_list().is_empty() {
        bail!("refine.models must name at least one model when refine.enabled = true");
    }
    Ok(())
}

fn warn_missing_identity(config: &StitchConfig) {
    if config.identity.self_ids.is_empty() {
        warn!("identity.self is empty: the acting user will count as a collaborator");
    }
}
