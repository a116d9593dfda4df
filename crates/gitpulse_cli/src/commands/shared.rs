//! Helpers shared by the sync and snapshot commands.

use chrono::{DateTime, NaiveDate, Utc};
use gitpulse::sync::{SyncMode, SyncOptions, SyncReport};

use crate::config::Config;
use crate::FetchArgs;

/// Parse a `YYYY-MM-DD` date into UTC midnight.
pub(crate) fn parse_date(raw: &str) -> Result<DateTime<Utc>, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|d| d.and_hms_opt(0, 0, 0).expect("midnight is valid").and_utc())
        .map_err(|e| format!("invalid date `{}` (expected YYYY-MM-DD): {}", raw, e))
}

/// Build sync options from CLI flags and config defaults.
///
/// A date bound switches to full-range mode (clear and refetch the
/// window); `--no-dedupe` downgrades to plain incremental.
pub(crate) fn build_options(
    fetch: &FetchArgs,
    no_dedupe: bool,
    config: &Config,
) -> Result<SyncOptions, String> {
    let since = fetch.since.as_deref().map(parse_date).transpose()?;
    let until = fetch.until.as_deref().map(parse_date).transpose()?;

    let mode = if since.is_some() || until.is_some() {
        SyncMode::FullRange
    } else if no_dedupe {
        SyncMode::Incremental
    } else {
        SyncMode::IncrementalDedupe
    };

    Ok(SyncOptions {
        mode,
        since,
        until,
        cap: fetch.cap.or(config.sync.cap),
        max_review_prs: fetch.max_review_prs.or(config.sync.max_review_prs),
    })
}

/// Resolve the GitHub token or fail before any repository is touched.
pub(crate) fn require_token(config: &Config) -> Result<String, String> {
    config.github_token().ok_or_else(|| {
        "GitHub token is missing. Set GITPULSE_GITHUB_TOKEN (or GITHUB_TOKEN) \
         or add it to the config file."
            .to_string()
    })
}

/// Print the end-of-run summary.
pub(crate) fn print_sync_summary(reports: &[SyncReport], is_tty: bool) {
    let succeeded = reports.iter().filter(|r| r.succeeded()).count();
    let failed = reports.len() - succeeded;
    let inserted: usize = reports.iter().map(|r| r.total_inserted()).sum();

    if is_tty {
        println!();
        println!(
            "Synced {} repositories ({} failed), {} new records",
            succeeded, failed, inserted
        );
    } else {
        tracing::info!(succeeded, failed, inserted, "Sync complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fetch_args(since: Option<&str>, until: Option<&str>) -> FetchArgs {
        FetchArgs {
            repos: PathBuf::from("config.properties"),
            since: since.map(String::from),
            until: until.map(String::from),
            cap: None,
            max_review_prs: None,
        }
    }

    #[test]
    fn parse_date_accepts_iso_dates() {
        let dt = parse_date("2024-03-01").expect("valid date");
        assert_eq!(dt.to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert!(parse_date("not-a-date").is_err());
        assert!(parse_date("2024-13-01").is_err());
    }

    #[test]
    fn default_mode_is_incremental_dedupe() {
        let options = build_options(&fetch_args(None, None), false, &Config::default())
            .expect("options build");
        assert_eq!(options.mode, SyncMode::IncrementalDedupe);
    }

    #[test]
    fn date_bounds_switch_to_full_range() {
        let options = build_options(
            &fetch_args(Some("2024-01-01"), Some("2024-03-31")),
            false,
            &Config::default(),
        )
        .expect("options build");
        assert_eq!(options.mode, SyncMode::FullRange);
        assert!(options.since.is_some());
        assert!(options.until.is_some());
    }

    #[test]
    fn no_dedupe_downgrades_to_plain_incremental() {
        let options = build_options(&fetch_args(None, None), true, &Config::default())
            .expect("options build");
        assert_eq!(options.mode, SyncMode::Incremental);
    }

    #[test]
    fn cli_cap_overrides_config_cap() {
        let mut config = Config::default();
        config.sync.cap = Some(500);

        let mut args = fetch_args(None, None);
        args.cap = Some(50);

        let options = build_options(&args, false, &config).expect("options build");
        assert_eq!(options.cap, Some(50));

        let args = fetch_args(None, None);
        let options = build_options(&args, false, &config).expect("options build");
        assert_eq!(options.cap, Some(500));
    }
}
