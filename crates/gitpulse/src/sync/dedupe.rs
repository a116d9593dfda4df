//! Natural-key deduplication against the persisted set.

use std::collections::HashSet;

use crate::normalize::{NaturalKey, NewActivity};

/// Keep only candidates whose natural key is not already stored.
///
/// `existing` is the key set for the candidates' (repository, kind)
/// partition, fetched once per partition. Dropped candidates are silent -
/// re-syncing an already-stored window is the expected idempotent case,
/// not an anomaly worth logging per record.
pub fn dedupe(candidates: Vec<NewActivity>, existing: &HashSet<NaturalKey>) -> Vec<NewActivity> {
    candidates
        .into_iter()
        .filter(|c| !existing.contains(&c.natural_key()))
        .collect()
}
