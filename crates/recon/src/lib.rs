//! `billsync-recon`: keyed two-source reconciliation engine.
//!
//! Pure engine crate: receives already-parsed records, returns a classified
//! report. No file, network or CLI dependencies.

pub mod classify;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod matcher;
pub mod model;
pub mod sync;

pub use engine::{compare, compare_with, CompareOptions, DuplicatePolicy};
pub use error::ReconError;
pub use evidence::compute_summary;
pub use model::{
    ComparedField, ComparisonReport, Conflict, ConflictReason, DuplicateKey, Origin, Partition,
    Record, ReconSummary,
};
pub use sync::{PushOutcome, SyncCounts, SyncStatus};
