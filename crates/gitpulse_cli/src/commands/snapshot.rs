use console::Term;
use gitpulse::github::GitHubClient;
use gitpulse::snapshot::write_snapshots;
use gitpulse::tracked;

use crate::config::Config;
use crate::{progress, SnapshotArgs};

use super::shared;

pub(crate) async fn handle_snapshot(
    opts: SnapshotArgs,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let is_tty = Term::stdout().is_term();

    let token = shared::require_token(config)?;
    let options = shared::build_options(&opts.fetch, false, config)?;
    let repos = tracked::load(&opts.fetch.repos)?;

    if repos.is_empty() {
        tracing::warn!(path = %opts.fetch.repos.display(), "No repositories tracked, nothing to do");
        if is_tty {
            println!("No repositories tracked in {}", opts.fetch.repos.display());
        }
        return Ok(());
    }

    let api = GitHubClient::new(&token, config.github.api_url.as_deref())?;

    let reporter = progress::make_callback(is_tty);
    let reports = write_snapshots(&api, &repos, &options, &opts.out, Some(&reporter)).await?;

    let succeeded = reports.iter().filter(|r| r.error.is_none()).count();
    let failed = reports.len() - succeeded;
    if is_tty {
        println!();
        println!(
            "Wrote {} snapshots ({} failed) to {}",
            succeeded,
            failed,
            opts.out.display()
        );
    } else {
        tracing::info!(succeeded, failed, out = %opts.out.display(), "Snapshots complete");
    }

    Ok(())
}
