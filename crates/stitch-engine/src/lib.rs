//! End-to-end clustering run: extract, build, select, refine, apply.

pub mod apply;
pub mod pipeline;

pub use apply::apply;
pub use pipeline::{ClusteringInput, ClusteringReport, cluster_heuristic_only, run_clustering};
