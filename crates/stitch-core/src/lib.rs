//! Shared data model for the stitch clustering engine.

pub mod error;
pub mod partition;
pub mod types;

pub use error::StitchError;
pub use partition::{FinalPartition, Placement};
pub use types::{
    ActivityRecord, ActivitySignal, Assignment, AssignmentAction, Candidate, ClusterSummary,
    Confidence, DateRange, OutputFormat,
};
