//! Multi-store orchestration for trace uploads and deletions.
//!
//! Neither pipeline spans the stores with a transaction. Each step either
//! succeeds or ends the request. An object whose metadata insert failed is
//! not removed; [`reconcile`] reports such objects.

pub mod delete;
pub mod reconcile;
pub mod submit;

pub use delete::DeletionPipeline;
pub use submit::{SubmissionPipeline, TraceSubmission};
