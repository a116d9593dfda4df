//! The four kinds of activity record tracked per repository.

use std::fmt;

/// Activity record kind.
///
/// Each kind maps to one API endpoint and one database table. The order of
/// [`RecordKind::ALL`] is the order the sync engine processes kinds in:
/// reviews come last because they are expanded from the pull request set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Commit,
    PullRequest,
    Issue,
    Review,
}

impl RecordKind {
    /// All kinds in sync order.
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Commit,
        RecordKind::PullRequest,
        RecordKind::Issue,
        RecordKind::Review,
    ];

    /// Table / collection name for this kind.
    pub fn table_name(self) -> &'static str {
        match self {
            RecordKind::Commit => "commits",
            RecordKind::PullRequest => "pull_requests",
            RecordKind::Issue => "issues",
            RecordKind::Review => "reviews",
        }
    }

    /// Name of the timestamp field carried by records of this kind.
    pub fn timestamp_field(self) -> &'static str {
        match self {
            RecordKind::Commit => "committed_at",
            _ => "created_at",
        }
    }

    /// Name of the textual payload field carried by records of this kind.
    pub fn body_field(self) -> &'static str {
        match self {
            RecordKind::Commit => "message",
            RecordKind::PullRequest | RecordKind::Issue => "title",
            RecordKind::Review => "comment",
        }
    }

    /// Whether the API endpoint for this kind accepts a `since` filter.
    ///
    /// The per-PR reviews endpoint does not; review incrementality comes
    /// from deduplication alone.
    pub fn supports_since(self) -> bool {
        !matches!(self, RecordKind::Review)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}
