use std::collections::{HashMap, HashSet};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::selector::{ClusterStore, StoredCluster};

const CLUSTER_FILE_NAME: &str = "clusters.jsonl";
const APP_NAME: &str = "stitch";

/// Cluster snapshots exported by the persistence layer, one JSON object per line.
///
/// A later line for the same id replaces the earlier one, so the persistence
/// layer may append updated snapshots without rewriting the file.
#[derive(Debug, Clone)]
pub struct JsonlClusterStore {
    file_path: PathBuf,
}

impl JsonlClusterStore {
    pub fn new(file_path: PathBuf) -> Self {
        let file_path = if file_path.as_os_str().is_empty() {
            default_cluster_file()
        } else {
            file_path
        };
        Self { file_path }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn load_all(&self) -> Result<Vec<StoredCluster>> {
        if !self.file_path.exists() {
            return Ok(Vec::new());
        }

        let file = OpenOptions::new()
            .read(true)
            .open(&self.file_path)
            .with_context(|| format!("failed to read cluster file: {}", self.file_path.display()))?;
        let reader = BufReader::new(file);

        let mut order: Vec<String> = Vec::new();
        let mut latest: HashMap<String, StoredCluster> = HashMap::new();
        for (idx, line_result) in reader.lines().enumerate() {
            let line = line_result.with_context(|| {
                format!(
                    "failed to read cluster line {} from {}",
                    idx + 1,
                    self.file_path.display()
                )
            })?;

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<StoredCluster>(&line) {
                Ok(cluster) => {
                    if !latest.contains_key(&cluster.id) {
                        order.push(cluster.id.clone());
                    }
                    latest.insert(cluster.id.clone(), cluster);
                }
                Err(error) => {
                    warn!(
                        path = %self.file_path.display(),
                        line_number = idx + 1,
                        %error,
                        "skipping corrupt cluster jsonl line"
                    );
                }
            }
        }

        Ok(order
            .into_iter()
            .filter_map(|id| latest.remove(&id))
            .collect())
    }
}

impl Default for JsonlClusterStore {
    fn default() -> Self {
        Self::new(PathBuf::new())
    }
}

impl ClusterStore for JsonlClusterStore {
    fn recent_clusters(&self, since: DateTime<Utc>) -> Result<Vec<StoredCluster>> {
        Ok(self
            .load_all()?
            .into_iter()
            .filter(|cluster| cluster.last_activity_at >= since)
            .collect())
    }

    fn clusters_by_ids(&self, ids: &[String]) -> Result<Vec<StoredCluster>> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        Ok(self
            .load_all()?
            .into_iter()
            .filter(|cluster| wanted.contains(cluster.id.as_str()))
            .collect())
    }
}

fn default_cluster_file() -> PathBuf {
    if let Some(project_dirs) = directories::ProjectDirs::from("", "", APP_NAME) {
        return project_dirs
            .state_dir()
            .unwrap_or_else(|| project_dirs.data_local_dir())
            .join(CLUSTER_FILE_NAME);
    }
    PathBuf::from(".").join(CLUSTER_FILE_NAME)
}
