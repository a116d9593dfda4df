//! GitHub API access: client, endpoint types, and the paginated fetcher.

pub mod client;
pub mod error;
pub mod pagination;
pub mod types;

pub use client::{GitHubClient, DEFAULT_API_URL};
pub use error::ApiError;
pub use pagination::{fetch_paginated, ActivityApi, PageFetch, PER_PAGE};
pub use types::{Endpoint, RepoRef};
