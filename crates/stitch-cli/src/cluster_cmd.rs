use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use stitch_config::{StitchConfig, validate_config};
use stitch_core::{ActivityRecord, ActivitySignal, OutputFormat};
use stitch_engine::{ClusteringInput, run_clustering};
use stitch_graph::connected_components;
use stitch_refine::{ApiClient, JsonlClusterStore, NoopClient, RefinementLlmClient};
use stitch_signal::SignalExtractor;
use tracing::debug;

use crate::cli::InputArgs;
use crate::report;

pub(crate) async fn handle_cluster(
    input: InputArgs,
    clusters: Option<PathBuf>,
    now: Option<String>,
    offline: bool,
    config_path: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let mut config = StitchConfig::load(config_path)?;
    if offline {
        config.refine.enabled = false;
    }
    validate_config(&config)?;

    let activities = read_activities(&input.activities)?;
    let now = parse_now(now.as_deref())?;
    let store = JsonlClusterStore::new(clusters.unwrap_or_default());
    debug!(store = %store.path().display(), "using cluster store");

    let client: Box<dyn RefinementLlmClient> = if config.refine.enabled {
        Box::new(ApiClient::from_config(&config.refine)?)
    } else {
        Box::new(NoopClient)
    };

    let clustering_input = ClusteringInput {
        activities,
        self_identities: identities(&config, &input.identities),
        now,
    };
    let report = run_clustering(clustering_input, &store, client.as_ref(), &config).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", report::render_clustering(&report)),
    }
    Ok(())
}

#[derive(Serialize)]
struct SignalDump {
    signals: Vec<ActivitySignal>,
    components: Vec<Vec<String>>,
}

pub(crate) fn handle_signals(
    input: InputArgs,
    config_path: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let config = StitchConfig::load(config_path)?;
    validate_config(&config)?;
    let activities = read_activities(&input.activities)?;
    let extractor = SignalExtractor::new(identities(&config, &input.identities), &config.clustering);
    let signals = extractor.extract_all(&activities);
    let components = connected_components(signals.clone(), &config.clustering)?;
    let dump = SignalDump {
        signals,
        components,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&dump)?),
        OutputFormat::Text => {
            print!("{}", report::render_signals(&dump.signals, &dump.components))
        }
    }
    Ok(())
}

fn read_activities(path: &Path) -> Result<Vec<ActivityRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read activities: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse activities: {}", path.display()))
}

fn parse_now(raw: Option<&str>) -> Result<DateTime<Utc>> {
    match raw {
        Some(raw) => Ok(DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("Invalid --now timestamp: {raw}"))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}

/// Config identities first, then command-line ones, without repeats.
fn identities(config: &StitchConfig, extra: &[String]) -> Vec<String> {
    let mut all: Vec<String> = Vec::new();
    for id in config.identity.self_ids.iter().chain(extra) {
        if !all.contains(id) {
            all.push(id.clone());
        }
    }
    all
}
