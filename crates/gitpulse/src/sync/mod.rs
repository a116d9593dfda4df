//! The incremental sync engine.
//!
//! Composition, per repository: get-or-create → (watermark → fetch →
//! normalize → dedupe → insert) for each record kind, with reviews expanded
//! from the fetched pull request set. Failures are contained per kind and
//! per repository.

pub mod dedupe;
pub mod engine;
pub mod progress;
pub mod types;
pub mod watermark;

pub use engine::{sync_all, sync_repo, SyncError};
pub use progress::{emit, ProgressCallback, SyncProgress};
pub use types::{KindReport, SyncMode, SyncOptions, SyncReport};
