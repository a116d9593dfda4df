use console::Term;
use gitpulse::github::GitHubClient;
use gitpulse::sync::sync_all;
use gitpulse::{connect_and_migrate, tracked};

use crate::config::Config;
use crate::{progress, SyncArgs};

use super::shared;

pub(crate) async fn handle_sync(
    opts: SyncArgs,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let is_tty = Term::stdout().is_term();

    // Credentials and the tracked-repos file are fatal before any
    // repository is processed; everything after is best-effort.
    let token = shared::require_token(config)?;
    let options = shared::build_options(&opts.fetch, opts.no_dedupe, config)?;
    let repos = tracked::load(&opts.fetch.repos)?;

    if repos.is_empty() {
        tracing::warn!(path = %opts.fetch.repos.display(), "No repositories tracked, nothing to do");
        if is_tty {
            println!("No repositories tracked in {}", opts.fetch.repos.display());
        }
        return Ok(());
    }

    let api = GitHubClient::new(&token, config.github.api_url.as_deref())?;
    let db = connect_and_migrate(database_url).await?;

    let reporter = progress::make_callback(is_tty);
    let reports = sync_all(&api, &db, &repos, &options, Some(&reporter)).await;

    shared::print_sync_summary(&reports, is_tty);

    Ok(())
}
