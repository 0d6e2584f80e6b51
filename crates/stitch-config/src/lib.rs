//! Configuration loading and validation (`~/.config/stitch/config.toml`).

pub mod clustering;
pub mod config;
pub mod refine;
pub mod validate;

pub use clustering::ClusteringConfig;
pub use config::{API_KEY_ENV, IdentityConfig, StitchConfig};
pub use refine::RefineConfig;
pub use validate::{MAX_WINDOW_DAYS, validate_clustering, validate_config};
