//! Refinement layer: candidate selection, the request/response contract with the
//! reasoning service, response validation and the retry/fallback state machine.

mod llm_client;
mod noop_client;
pub mod prompt;
pub mod refine;
pub mod selector;
mod store;
pub mod validate;

pub use llm_client::{ApiClient, ModelPool, RefinementLlmClient};
pub use noop_client::NoopClient;
pub use prompt::RefineRequest;
pub use refine::{FallbackReason, RefineOutcome, refine};
pub use selector::{ClusterStore, InMemoryClusterStore, Selection, StoredCluster, select_candidates};
pub use store::JsonlClusterStore;
pub use validate::{ValidationError, validate_response};
