//! Gitpulse - incremental GitHub activity synchronizer.
//!
//! This library pulls activity records (commits, pull requests, issues,
//! review comments) for a configured set of repositories from the GitHub
//! REST API and persists them into a relational store, or writes them out
//! as static JSON snapshots.
//!
//! The sync engine is incremental: for each repository and record kind it
//! resolves a watermark (the most recent stored timestamp), fetches only
//! newer items with correct pagination and rate-limit backoff, drops
//! records it has already stored (natural-key deduplication), and inserts
//! the rest. Failures are contained per item, per kind, and per repository
//! so one bad repository never aborts a batch.
//!
//! # Features
//!
//! - `migrate` (default) - Enables schema migrations. When enabled,
//!   [`connect_and_migrate`] brings the database up to date on connection.
//!
//! # Example
//!
//! ```ignore
//! use gitpulse::{connect_and_migrate, github::GitHubClient, sync, tracked};
//!
//! let db = connect_and_migrate("sqlite://gitpulse.db?mode=rwc").await?;
//! let api = GitHubClient::new(&token, None)?;
//! let repos = tracked::load("config.properties")?;
//!
//! let reports = sync::sync_all(&api, &db, &repos, &sync::SyncOptions::default(), None).await;
//! ```

pub mod db;
pub mod entity;
pub mod github;
pub mod normalize;
pub mod snapshot;
pub mod store;
pub mod sync;
pub mod tracked;

#[cfg(feature = "migrate")]
pub mod migration;

pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use entity::prelude::*;
pub use entity::record_kind::RecordKind;
pub use github::{ActivityApi, GitHubClient, RepoRef};
pub use normalize::NewActivity;
pub use store::StoreError;
pub use sync::{SyncMode, SyncOptions, SyncReport};
