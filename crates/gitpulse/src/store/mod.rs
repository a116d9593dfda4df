//! Store query layer over the gitpulse entities.
//!
//! Thin, intention-named operations the sync engine composes: get-or-create
//! for repositories, and insert / latest-timestamp / existing-keys /
//! range-delete for activity records. No update paths exist - activity rows
//! are immutable once written.

pub mod activity;
pub mod errors;
pub mod repos;

pub use errors::{Result, StoreError};
