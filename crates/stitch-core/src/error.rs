#[derive(thiserror::Error, Debug)]
pub enum StitchError {
    #[error("Duplicate activity id '{0}' in input")]
    DuplicateActivity(String),

    #[error("Activity at position {0} has an empty id")]
    EmptyActivityId(usize),

    #[error("Refinement request timed out after {timeout_ms} ms")]
    RefinementTimeout { timeout_ms: u64 },

    #[error("Refinement transport failed: {0}")]
    RefinementTransport(String),

    #[error("Cluster store read failed: {0}")]
    ClusterStore(String),
}
