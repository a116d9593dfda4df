//! Normalization of raw API items into activity records.
//!
//! The API returns loosely-shaped JSON; this module turns each item into a
//! [`NewActivity`] with a guaranteed-valid UTC timestamp. Timestamp
//! normalization is total: missing or malformed input falls back to the
//! current time instead of failing. Missing structural fields (an item
//! without an author, say) are per-item errors that the caller logs and
//! skips.

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::entity::record_kind::RecordKind;

/// Placeholder body stored for reviews submitted without a comment.
pub const EMPTY_REVIEW_COMMENT: &str = "No comment provided";

/// Error constructing a single activity record from a raw item.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The raw item lacked a field the record shape requires.
    #[error("missing field `{path}` on {kind} item")]
    MissingField {
        kind: RecordKind,
        path: &'static str,
    },
}

/// A normalized activity record, ready for dedup and insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub kind: RecordKind,
    /// Author name (commits) or user login (everything else).
    pub author: String,
    /// Kind-specific textual payload: message, title, or comment.
    pub body: String,
    /// Record timestamp, normalized to UTC.
    pub occurred_at: DateTime<FixedOffset>,
}

/// Natural key of an activity record: (body, author, timestamp).
///
/// The timestamp half is rendered at whole-second RFC-3339 precision so a
/// value compares equal to itself after a database round-trip.
pub type NaturalKey = (String, String, String);

impl NewActivity {
    /// Compute this record's natural key.
    pub fn natural_key(&self) -> NaturalKey {
        (
            self.body.clone(),
            self.author.clone(),
            key_timestamp(&self.occurred_at),
        )
    }

    /// Construct a record of the given kind from a raw API item.
    pub fn from_item(kind: RecordKind, item: &Value) -> Result<Self, NormalizeError> {
        match kind {
            RecordKind::Commit => Self::commit_from_item(item),
            RecordKind::PullRequest => Self::pull_request_from_item(item),
            RecordKind::Issue => Self::issue_from_item(item),
            RecordKind::Review => Self::review_from_item(item),
        }
    }

    /// Commit: `commit.message` + `commit.author.name` + `commit.author.date`.
    pub fn commit_from_item(item: &Value) -> Result<Self, NormalizeError> {
        let message = required_str(item, &["commit", "message"], RecordKind::Commit)?;
        let author = required_str(item, &["commit", "author", "name"], RecordKind::Commit)?;
        let date = lookup_str(item, &["commit", "author", "date"]);

        Ok(Self {
            kind: RecordKind::Commit,
            author: author.to_string(),
            body: message.to_string(),
            occurred_at: normalize_timestamp(date),
        })
    }

    /// Pull request: `title` + `user.login` + `created_at`.
    pub fn pull_request_from_item(item: &Value) -> Result<Self, NormalizeError> {
        let title = required_str(item, &["title"], RecordKind::PullRequest)?;
        let author = required_str(item, &["user", "login"], RecordKind::PullRequest)?;

        Ok(Self {
            kind: RecordKind::PullRequest,
            author: author.to_string(),
            body: title.to_string(),
            occurred_at: normalize_timestamp(lookup_str(item, &["created_at"])),
        })
    }

    /// Issue: same shape as a pull request.
    pub fn issue_from_item(item: &Value) -> Result<Self, NormalizeError> {
        let title = required_str(item, &["title"], RecordKind::Issue)?;
        let author = required_str(item, &["user", "login"], RecordKind::Issue)?;

        Ok(Self {
            kind: RecordKind::Issue,
            author: author.to_string(),
            body: title.to_string(),
            occurred_at: normalize_timestamp(lookup_str(item, &["created_at"])),
        })
    }

    /// Review: `body` (placeholder when absent) + `user.login` + `submitted_at`.
    pub fn review_from_item(item: &Value) -> Result<Self, NormalizeError> {
        let author = required_str(item, &["user", "login"], RecordKind::Review)?;
        let comment = lookup_str(item, &["body"])
            .filter(|b| !b.is_empty())
            .unwrap_or(EMPTY_REVIEW_COMMENT);

        Ok(Self {
            kind: RecordKind::Review,
            author: author.to_string(),
            body: comment.to_string(),
            occurred_at: normalize_timestamp(lookup_str(item, &["submitted_at"])),
        })
    }
}

/// The issues endpoint returns pull requests too; they carry a
/// `pull_request` key plain issues lack.
pub fn is_pull_request_item(item: &Value) -> bool {
    item.get("pull_request").is_some()
}

/// Normalize a batch of raw items into candidates.
///
/// Applies the issue/pull-request split and the optional `until` upper
/// bound. Malformed items are logged and skipped; they never abort the
/// batch.
pub fn normalize_batch(
    kind: RecordKind,
    raw: &[Value],
    until: Option<DateTime<Utc>>,
) -> Vec<NewActivity> {
    let mut out = Vec::with_capacity(raw.len());

    for item in raw {
        if kind == RecordKind::Issue && is_pull_request_item(item) {
            continue;
        }

        match NewActivity::from_item(kind, item) {
            Ok(record) => {
                if let Some(until) = until {
                    if record.occurred_at.with_timezone(&Utc) > until {
                        continue;
                    }
                }
                out.push(record);
            }
            Err(e) => {
                tracing::warn!(kind = %kind, error = %e, "Skipping malformed item");
            }
        }
    }

    out
}

/// Normalize a source timestamp to UTC.
///
/// Accepts RFC-3339 with either a `Z` or numeric offset. Missing, empty, or
/// unparseable input yields the current UTC time - lossy but total, so a
/// malformed timestamp never aborts a record.
pub fn normalize_timestamp(raw: Option<&str>) -> DateTime<FixedOffset> {
    match raw {
        Some(s) if !s.is_empty() => match DateTime::parse_from_rfc3339(s) {
            Ok(dt) => dt.with_timezone(&Utc).fixed_offset(),
            Err(_) => {
                tracing::debug!(raw = %s, "unparseable timestamp, using current time");
                Utc::now().fixed_offset()
            }
        },
        _ => Utc::now().fixed_offset(),
    }
}

/// Render a timestamp for natural-key comparison (whole seconds, UTC).
pub fn key_timestamp(ts: &DateTime<FixedOffset>) -> String {
    ts.with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn lookup_str<'a>(item: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut current = item;
    for segment in path {
        current = current.get(segment)?;
    }
    current.as_str()
}

fn required_str<'a>(
    item: &'a Value,
    path: &'static [&'static str],
    kind: RecordKind,
) -> Result<&'a str, NormalizeError> {
    lookup_str(item, path).ok_or(NormalizeError::MissingField {
        kind,
        path: path.last().copied().expect("path is never empty"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn normalize_timestamp_converts_zulu_to_offset() {
        let dt = normalize_timestamp(Some("2024-01-01T00:00:00Z"));
        assert_eq!(dt.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn normalize_timestamp_converts_nonzero_offset_to_utc() {
        let dt = normalize_timestamp(Some("2024-01-01T05:30:00+05:30"));
        assert_eq!(dt.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn normalize_timestamp_missing_falls_back_to_now() {
        let before = Utc::now();
        let dt = normalize_timestamp(None);
        let after = Utc::now();
        let dt = dt.with_timezone(&Utc);
        assert!(dt >= before && dt <= after);
    }

    #[test]
    fn normalize_timestamp_empty_falls_back_to_now() {
        let before = Utc::now();
        let dt = normalize_timestamp(Some("")).with_timezone(&Utc);
        assert!(dt >= before);
    }

    #[test]
    fn normalize_timestamp_garbage_falls_back_to_now() {
        let before = Utc::now();
        let dt = normalize_timestamp(Some("not-a-date")).with_timezone(&Utc);
        assert!(dt >= before);
    }

    #[test]
    fn key_timestamp_truncates_subseconds() {
        let ts = Utc
            .with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
            .unwrap()
            .fixed_offset();
        let with_nanos = ts + chrono::Duration::nanoseconds(123_456_789);
        assert_eq!(key_timestamp(&ts), key_timestamp(&with_nanos));
        assert_eq!(key_timestamp(&ts), "2024-03-01T12:00:00Z");
    }

    #[test]
    fn commit_from_item_extracts_fields() {
        let item = json!({
            "commit": {
                "message": "fix the thing",
                "author": { "name": "alice", "date": "2024-02-01T10:00:00Z" }
            }
        });

        let record = NewActivity::commit_from_item(&item).expect("well-formed commit");
        assert_eq!(record.kind, RecordKind::Commit);
        assert_eq!(record.body, "fix the thing");
        assert_eq!(record.author, "alice");
        assert_eq!(record.occurred_at.to_rfc3339(), "2024-02-01T10:00:00+00:00");
    }

    #[test]
    fn commit_from_item_missing_author_is_an_error() {
        let item = json!({ "commit": { "message": "orphan" } });
        let err = NewActivity::commit_from_item(&item).expect_err("missing author");
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn pull_request_from_item_extracts_fields() {
        let item = json!({
            "title": "Add feature",
            "user": { "login": "bob" },
            "created_at": "2024-02-02T08:00:00Z"
        });

        let record = NewActivity::pull_request_from_item(&item).expect("well-formed pr");
        assert_eq!(record.body, "Add feature");
        assert_eq!(record.author, "bob");
    }

    #[test]
    fn review_without_body_gets_placeholder() {
        let item = json!({
            "user": { "login": "carol" },
            "body": null,
            "submitted_at": "2024-02-03T09:00:00Z"
        });

        let record = NewActivity::review_from_item(&item).expect("well-formed review");
        assert_eq!(record.body, EMPTY_REVIEW_COMMENT);
    }

    #[test]
    fn review_with_empty_body_gets_placeholder() {
        let item = json!({
            "user": { "login": "carol" },
            "body": "",
            "submitted_at": "2024-02-03T09:00:00Z"
        });

        let record = NewActivity::review_from_item(&item).expect("well-formed review");
        assert_eq!(record.body, EMPTY_REVIEW_COMMENT);
    }

    #[test]
    fn issue_items_carrying_pull_request_key_are_detected() {
        let pr = json!({ "title": "t", "user": { "login": "u" }, "pull_request": {} });
        let issue = json!({ "title": "t", "user": { "login": "u" } });
        assert!(is_pull_request_item(&pr));
        assert!(!is_pull_request_item(&issue));
    }

    #[test]
    fn normalize_batch_filters_pull_requests_out_of_issues() {
        let raw = vec![
            json!({ "title": "real issue", "user": { "login": "a" }, "created_at": "2024-01-01T00:00:00Z" }),
            json!({ "title": "actually a pr", "user": { "login": "b" }, "created_at": "2024-01-01T00:00:00Z", "pull_request": {} }),
        ];

        let records = normalize_batch(RecordKind::Issue, &raw, None);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].body, "real issue");
    }

    #[test]
    fn normalize_batch_skips_malformed_without_aborting() {
        let raw = vec![
            json!({ "title": "good", "user": { "login": "a" }, "created_at": "2024-01-01T00:00:00Z" }),
            json!({ "title": "no author" }),
            json!({ "title": "also good", "user": { "login": "b" }, "created_at": "2024-01-02T00:00:00Z" }),
        ];

        let records = normalize_batch(RecordKind::PullRequest, &raw, None);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn normalize_batch_applies_until_bound() {
        let until = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let raw = vec![
            json!({ "title": "inside", "user": { "login": "a" }, "created_at": "2024-01-10T00:00:00Z" }),
            json!({ "title": "outside", "user": { "login": "b" }, "created_at": "2024-02-01T00:00:00Z" }),
        ];

        let records = normalize_batch(RecordKind::PullRequest, &raw, Some(until));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].body, "inside");
    }

    #[test]
    fn natural_key_uses_body_author_timestamp() {
        let record = NewActivity {
            kind: RecordKind::Issue,
            author: "dave".to_string(),
            body: "broken build".to_string(),
            occurred_at: normalize_timestamp(Some("2024-02-04T00:00:00Z")),
        };

        let (body, author, ts) = record.natural_key();
        assert_eq!(body, "broken build");
        assert_eq!(author, "dave");
        assert_eq!(ts, "2024-02-04T00:00:00Z");
    }
}
