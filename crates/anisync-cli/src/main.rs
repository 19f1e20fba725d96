//! anisync CLI
//!
//! Feeds a playback completion event from the media host into the sync
//! orchestrator and reports what happened for each user.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use anisync_api::mal::MalClient;
use anisync_core::config::SyncConfig;
use anisync_core::error::ConfigError;
use anisync_core::models::PlaybackCompletionEvent;
use anisync_core::orchestrator::{SyncOrchestrator, SyncOutcome, UserReport};

#[derive(Parser)]
#[command(name = "anisync")]
#[command(about = "Sync finished anime playback to MyAnimeList", long_about = None)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one playback completion event
    Sync {
        /// JSON file holding the event
        #[arg(short, long)]
        event: PathBuf,
    },

    /// Print the default config file location
    ConfigPath,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("could not load config: {0}")]
    Config(#[from] ConfigError),

    #[error("could not read event {path}: {source}")]
    EventIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid event {path}: {source}")]
    EventParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Sync { event } => run_sync(cli.config.as_deref(), &event).await,
        Commands::ConfigPath => {
            println!("{}", SyncConfig::config_path().display());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "anisync=debug" } else { "anisync=info" })
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run_sync(config_path: Option<&Path>, event_path: &Path) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let event = read_event(event_path)?;

    let orchestrator = SyncOrchestrator::from_config(&config, |token| {
        MalClient::new(token.to_string())
            .with_client_id(config.mal.client_id.clone())
            .with_search_limit(config.mal.search_limit)
    });
    tracing::debug!(
        users = orchestrator.account_count(),
        name = %event.name,
        "Processing playback event"
    );

    for report in orchestrator.handle_event(&event).await {
        println!("{}", format_report(&report));
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SyncConfig, CliError> {
    Ok(match path {
        Some(path) => SyncConfig::load_from(path)?,
        None => SyncConfig::load()?,
    })
}

fn read_event(path: &Path) -> Result<PlaybackCompletionEvent, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::EventIo {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CliError::EventParse {
        path: path.to_path_buf(),
        source,
    })
}

fn format_report(report: &UserReport) -> String {
    match &report.outcome {
        SyncOutcome::Skipped(reason) => format!("{}: skipped ({reason})", report.user_id),
        SyncOutcome::Synced {
            entry_id,
            title,
            list_entry,
            ..
        } => format!(
            "{}: {title} [{entry_id}] -> {} ep {}",
            report.user_id, list_entry.status, list_entry.episodes_watched
        ),
        SyncOutcome::Failed(e) => format!("{}: failed ({e})", report.user_id),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use anisync_api::traits::{ListEntry, ListStatus};
    use anisync_core::error::SyncError;
    use anisync_core::models::{MediaKind, SkipReason};

    use super::*;

    #[test]
    fn test_parse_sync_command() {
        let cli = Cli::try_parse_from([
            "anisync", "sync", "--event", "event.json", "--config", "alt.toml", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
        assert!(matches!(cli.command, Commands::Sync { event } if event == Path::new("event.json")));
    }

    #[test]
    fn test_sync_requires_event() {
        assert!(Cli::try_parse_from(["anisync", "sync"]).is_err());
    }

    #[test]
    fn test_read_event() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"kind": "movie", "name": "Your Name", "played_to_completion": true,
                "user_ids": ["u1"], "path": "/media/movies/your-name.mkv"}}"#
        )
        .unwrap();

        let event = read_event(file.path()).unwrap();
        assert_eq!(event.kind, MediaKind::Movie);
        assert_eq!(event.user_ids, vec!["u1"]);
    }

    #[test]
    fn test_read_event_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(read_event(&missing), Err(CliError::EventIo { .. })));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(read_event(&bad), Err(CliError::EventParse { .. })));
    }

    #[test]
    fn test_load_config_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[mal]\nsearch_limit = 5\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.mal.search_limit, 5);
        assert!(matches!(
            load_config(Some(&dir.path().join("nope.toml"))),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn test_format_report() {
        let skipped = UserReport {
            user_id: "u1".into(),
            outcome: SyncOutcome::Skipped(SkipReason::AlreadyWatched),
        };
        assert_eq!(format_report(&skipped), "u1: skipped (episode already watched)");

        let synced = UserReport {
            user_id: "u2".into(),
            outcome: SyncOutcome::Synced {
                entry_id: 16498,
                title: "Shingeki no Kyojin".into(),
                commands: vec![],
                list_entry: ListEntry {
                    status: ListStatus::Watching,
                    episodes_watched: 3,
                    is_rewatching: false,
                    times_rewatched: 0,
                    start_date: None,
                    finish_date: None,
                    score: None,
                },
            },
        };
        assert_eq!(
            format_report(&synced),
            "u2: Shingeki no Kyojin [16498] -> watching ep 3"
        );

        let failed = UserReport {
            user_id: "u3".into(),
            outcome: SyncOutcome::Failed(SyncError::NotFound("season 4".into())),
        };
        assert_eq!(format_report(&failed), "u3: failed (not found: season 4)");
    }
}
