//! Configuration file support for gitpulse.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `GITPULSE_`, e.g., `GITPULSE_GITHUB_TOKEN`)
//! 3. Config file (~/.config/gitpulse/config.toml or ./gitpulse.toml)
//! 4. Built-in defaults
//!
//! The database URL defaults to `sqlite://~/.local/state/gitpulse/gitpulse.db`
//! on Linux (using the XDG state directory) if not explicitly configured.
//! The GitHub token additionally falls back to the plain `GITHUB_TOKEN`
//! environment variable.
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite://~/.local/state/gitpulse/gitpulse.db"  # optional, this is the default
//!
//! [github]
//! token = "ghp_..."        # or use GITPULSE_GITHUB_TOKEN / GITHUB_TOKEN env vars
//! api_url = "https://api.github.com"  # optional, for GitHub Enterprise
//!
//! [sync]
//! cap = 1000
//! max_review_prs = 10
//! ```

use std::path::PathBuf;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// GitHub configuration.
    pub github: GitHubConfig,
    /// Default sync options.
    pub sync: SyncConfig,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL. Supports sqlite:// and postgres:// schemes.
    /// Defaults to `sqlite://~/.local/state/gitpulse/gitpulse.db` if not specified.
    pub url: Option<String>,
}

/// GitHub configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token.
    /// Can also be set via GITPULSE_GITHUB_TOKEN or GITHUB_TOKEN.
    pub token: Option<String>,
    /// API base URL override (GitHub Enterprise or a test server).
    pub api_url: Option<String>,
}

/// Default sync options.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum items to fetch per endpoint.
    pub cap: Option<usize>,
    /// Maximum pull requests to expand reviews for.
    pub max_review_prs: Option<usize>,
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/gitpulse/config.toml)
    /// 3. Local config file (./gitpulse.toml)
    /// 4. Environment variables with GITPULSE_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(proj_dirs) = ProjectDirs::from("", "", "gitpulse") {
            let xdg_config = proj_dirs.config_dir().join("config.toml");
            if xdg_config.exists() {
                tracing::debug!("Loading config from {:?}", xdg_config);
                builder = builder.add_source(
                    File::from(xdg_config)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
        }

        let local_config = PathBuf::from("gitpulse.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./gitpulse.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // e.g., GITPULSE_DATABASE_URL -> database.url
        builder = builder.add_source(
            Environment::with_prefix("GITPULSE")
                .separator("_")
                .try_parsing(true),
        );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Get the database URL, falling back to the default state directory path.
    ///
    /// The `mode=rwc` parameter enables read-write access and creates the
    /// file if it doesn't exist.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join("gitpulse.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    /// Get the GitHub token, falling back to the plain `GITHUB_TOKEN`
    /// environment variable.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()))
    }

    /// Get the default state directory path.
    ///
    /// On Linux, this is `$XDG_STATE_HOME/gitpulse` or `~/.local/state/gitpulse`.
    /// On macOS/Windows, falls back to the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "gitpulse").map(|dirs| {
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.database.url.is_none());
        assert!(config.github.token.is_none());
        assert!(config.github.api_url.is_none());
        assert!(config.sync.cap.is_none());
        assert!(config.sync.max_review_prs.is_none());
    }

    #[test]
    fn test_config_builder_with_toml_string() {
        let toml_content = r#"
            [database]
            url = "sqlite:///tmp/test.db"

            [github]
            token = "ghp_test123"
            api_url = "https://github.example.com/api/v3"

            [sync]
            cap = 500
            max_review_prs = 10
        "#;

        let settings = ConfigBuilder::builder()
            .add_source(config::File::from_str(toml_content, FileFormat::Toml))
            .build()
            .unwrap();

        let config: Config = settings.try_deserialize().unwrap();

        assert_eq!(
            config.database.url,
            Some("sqlite:///tmp/test.db".to_string())
        );
        assert_eq!(config.github.token, Some("ghp_test123".to_string()));
        assert_eq!(
            config.github.api_url,
            Some("https://github.example.com/api/v3".to_string())
        );
        assert_eq!(config.sync.cap, Some(500));
        assert_eq!(config.sync.max_review_prs, Some(10));
    }

    #[test]
    fn test_config_partial_override() {
        let toml_content = r#"
            [sync]
            cap = 250
        "#;

        let settings = ConfigBuilder::builder()
            .add_source(config::File::from_str(toml_content, FileFormat::Toml))
            .build()
            .unwrap();

        let config: Config = settings.try_deserialize().unwrap();

        assert_eq!(config.sync.cap, Some(250));
        assert!(config.sync.max_review_prs.is_none());
    }

    #[test]
    fn test_database_url_defaults_to_state_dir() {
        let config = Config::default();
        let db_url = config.database_url();

        assert!(db_url.is_some());
        let url = db_url.unwrap();
        assert!(url.starts_with("sqlite://"));
        assert!(url.contains("gitpulse.db"));
        assert!(url.ends_with("?mode=rwc"));
    }

    #[test]
    fn test_database_url_respects_configured_value() {
        let toml_content = r#"
            [database]
            url = "postgres://localhost/gitpulse"
        "#;

        let settings = ConfigBuilder::builder()
            .add_source(config::File::from_str(toml_content, FileFormat::Toml))
            .build()
            .unwrap();

        let config: Config = settings.try_deserialize().unwrap();
        let db_url = config.database_url();

        assert_eq!(db_url, Some("postgres://localhost/gitpulse".to_string()));
    }

    #[test]
    fn test_default_state_dir() {
        let state_dir = Config::default_state_dir();
        assert!(state_dir.is_some());
        assert!(state_dir.unwrap().to_string_lossy().contains("gitpulse"));
    }

    #[test]
    fn test_config_unknown_fields_ignored() {
        let toml_content = r#"
            [sync]
            cap = 100
            unknown_field = "should be ignored"
        "#;

        let settings = ConfigBuilder::builder()
            .add_source(config::File::from_str(toml_content, FileFormat::Toml))
            .build()
            .unwrap();

        let config: Config = settings.try_deserialize().unwrap();
        assert_eq!(config.sync.cap, Some(100));
    }

    #[test]
    fn test_config_invalid_toml() {
        let invalid_toml = r#"
            [sync
            cap = 100
        "#;

        let result = ConfigBuilder::builder()
            .add_source(config::File::from_str(invalid_toml, FileFormat::Toml))
            .build();

        assert!(result.is_err());
    }
}
