//! The tracked-repositories file.
//!
//! Line-oriented `key=value` format: the key is an `owner/name` reference,
//! the value (optional) is a snapshot output file name. The database-backed
//! sync ignores values. Blank lines and `#` comments are tolerated. A
//! missing file is fatal - there is nothing sensible to sync without one.

use std::fs;
use std::path::Path;

use thiserror::Error;

/// Error loading the tracked-repositories file.
#[derive(Debug, Error)]
pub enum TrackedError {
    /// The file does not exist.
    #[error("tracked repositories file not found: {path}")]
    NotFound { path: String },

    /// The file exists but could not be read.
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// One tracked repository entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedRepo {
    /// Raw `owner/name` reference as written in the file. Validated at
    /// sync time, not load time, so one malformed entry cannot prevent
    /// the rest from syncing.
    pub name: String,
    /// Snapshot output file name, if the entry carried a value.
    pub snapshot_target: Option<String>,
}

impl TrackedRepo {
    /// Output file name for the snapshot variant.
    ///
    /// Uses the configured target (with `.json` auto-appended) or derives
    /// one from the repository name.
    pub fn snapshot_file_name(&self) -> String {
        let base = match &self.snapshot_target {
            Some(target) => target.clone(),
            None => self.name.replace('/', "_"),
        };
        if base.ends_with(".json") {
            base
        } else {
            format!("{}.json", base)
        }
    }
}

/// Load tracked repositories from a file.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<TrackedRepo>, TrackedError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(TrackedError::NotFound {
            path: path.display().to_string(),
        });
    }

    let content = fs::read_to_string(path).map_err(|source| TrackedError::Io {
        path: path.display().to_string(),
        source,
    })?;

    Ok(parse(&content))
}

/// Parse tracked entries from file content.
pub fn parse(content: &str) -> Vec<TrackedRepo> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }

            let (name, value) = match line.split_once('=') {
                Some((name, value)) => (name.trim(), Some(value.trim())),
                None => (line, None),
            };

            Some(TrackedRepo {
                name: name.to_string(),
                snapshot_target: value.filter(|v| !v.is_empty()).map(String::from),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_key_value_lines() {
        let repos = parse("octo/widgets=widgets\nocto/gadgets=gadgets.json\n");
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].name, "octo/widgets");
        assert_eq!(repos[0].snapshot_target.as_deref(), Some("widgets"));
        assert_eq!(repos[1].snapshot_target.as_deref(), Some("gadgets.json"));
    }

    #[test]
    fn parse_bare_keys_and_empty_values() {
        let repos = parse("octo/widgets\nocto/gadgets=\n");
        assert_eq!(repos.len(), 2);
        assert!(repos[0].snapshot_target.is_none());
        assert!(repos[1].snapshot_target.is_none());
    }

    #[test]
    fn parse_skips_blanks_and_comments() {
        let repos = parse("\n# tracked repos\nocto/widgets=w\n\n");
        assert_eq!(repos.len(), 1);
    }

    #[test]
    fn snapshot_file_name_appends_json_suffix() {
        let repo = TrackedRepo {
            name: "octo/widgets".to_string(),
            snapshot_target: Some("widgets".to_string()),
        };
        assert_eq!(repo.snapshot_file_name(), "widgets.json");

        let already = TrackedRepo {
            name: "octo/widgets".to_string(),
            snapshot_target: Some("widgets.json".to_string()),
        };
        assert_eq!(already.snapshot_file_name(), "widgets.json");
    }

    #[test]
    fn snapshot_file_name_derived_from_reference_when_unset() {
        let repo = TrackedRepo {
            name: "octo/widgets".to_string(),
            snapshot_target: None,
        };
        assert_eq!(repo.snapshot_file_name(), "octo_widgets.json");
    }

    #[test]
    fn load_missing_file_is_fatal() {
        let err = load("/nonexistent/config.properties").expect_err("missing file");
        assert!(matches!(err, TrackedError::NotFound { .. }));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.properties");
        std::fs::write(&path, "octo/widgets=widgets\n").expect("write");

        let repos = load(&path).expect("load");
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].name, "octo/widgets");
    }
}
