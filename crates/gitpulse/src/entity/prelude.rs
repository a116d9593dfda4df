//! Re-exports of all entity types for convenient importing.

pub use super::commit::Entity as Commit;
pub use super::issue::Entity as Issue;
pub use super::pull_request::Entity as PullRequest;
pub use super::repository::Entity as Repository;
pub use super::review::Entity as Review;
