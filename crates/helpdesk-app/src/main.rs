//! Helpdesk application binary - composition root.
//!
//! 1. Parse CLI flags and load configuration from TOML
//! 2. Open the primary record store (SQLite, seeded on first run, or REST)
//! 3. Wrap every collection in a repository with static fallback
//! 4. Start the axum REST API server

mod cli;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use helpdesk_api::auth::{AuthGate, TokenStore};
use helpdesk_api::routes;
use helpdesk_api::state::AppState;
use helpdesk_chat::ChatOrchestrator;
use helpdesk_core::config::{HelpdeskConfig, StoreBackend};
use helpdesk_core::seed;
use helpdesk_core::types::{EscalatedIssue, KnowledgeEntry, UserRecord};
use helpdesk_storage::{
    Database, FallbackRepository, RecordSource, RemoteSource, SqliteRepository, StaticSource,
};

use cli::CliArgs;

/// Expand ~ to home directory in a path string.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if data_dir.starts_with("~/") || data_dir.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(&data_dir[2..])
    } else {
        PathBuf::from(data_dir)
    }
}

/// The three collections, backed by the same primary.
struct Sources {
    knowledge: Arc<dyn RecordSource<KnowledgeEntry>>,
    issues: Arc<dyn RecordSource<EscalatedIssue>>,
    users: Arc<dyn RecordSource<UserRecord>>,
}

fn open_sources(
    config: &HelpdeskConfig,
    data_dir: &Path,
) -> Result<Sources, Box<dyn std::error::Error>> {
    match config.store.backend {
        StoreBackend::Sqlite => {
            let db_path = data_dir.join("helpdesk.db");
            let db = Database::new(&db_path)?;
            tracing::info!(path = %db_path.display(), "SQLite database opened");
            if db.seed_if_empty(&seed::knowledge_base(), &seed::demo_users())? {
                tracing::info!("Seeded empty database with the built-in knowledge base");
            }
            let repo = Arc::new(SqliteRepository::new(Arc::new(db)));
            Ok(Sources {
                knowledge: repo.clone(),
                issues: repo.clone(),
                users: repo,
            })
        }
        StoreBackend::Remote => {
            let remote = Arc::new(RemoteSource::new(
                &config.store.remote_url,
                Duration::from_millis(config.store.timeout_ms),
            )?);
            tracing::info!(url = %remote.base_url(), "Using remote record store");
            Ok(Sources {
                knowledge: remote.clone(),
                issues: remote.clone(),
                users: remote,
            })
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config_exists = config_file.exists();
    let mut config = HelpdeskConfig::load_or_default(&config_file);
    args.apply(&mut config);

    // Tracing: RUST_LOG wins, then the resolved log level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Helpdesk v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        path = %config_file.display(),
        from_file = config_exists,
        "Configuration resolved"
    );

    if args.write_config {
        config.save(&config_file)?;
        return Ok(());
    }

    // Storage.
    let data_dir = resolve_data_dir(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }

    let sources = open_sources(&config, &data_dir)?;
    let knowledge = Arc::new(FallbackRepository::new(
        sources.knowledge,
        StaticSource::new(seed::knowledge_base()),
    ));
    let issues = Arc::new(FallbackRepository::new(
        sources.issues,
        StaticSource::empty(),
    ));
    let users = Arc::new(FallbackRepository::new(
        sources.users,
        StaticSource::new(seed::demo_users()),
    ));

    let chat = Arc::new(ChatOrchestrator::new(
        Arc::clone(&knowledge),
        Arc::clone(&issues),
        config.chat.clone(),
        config.escalation.clone(),
    ));

    let token_ttl = chrono::TimeDelta::hours(i64::from(config.general.token_ttl_hours));
    let tokens = TokenStore::load(&data_dir.join("sessions.json"), token_ttl);
    let auth = AuthGate::new(users, seed::demo_users(), tokens);
    tracing::info!(sessions = auth.session_count(), "Auth gate ready");

    let state = AppState::new(config.clone(), chat, knowledge, issues, auth);

    // === API server ===

    if let Err(e) = routes::start_server(&config, state).await {
        tracing::error!(port = config.general.port, error = %e, "API server stopped");
        tracing::error!(
            "Is another instance running? Try: HELPDESK_PORT={} helpdesk",
            config.general.port.saturating_add(1)
        );
        return Err(e.into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_data_dir_untouched() {
        assert_eq!(
            resolve_data_dir("/srv/helpdesk"),
            PathBuf::from("/srv/helpdesk")
        );
    }

    #[test]
    fn test_tilde_expands_to_home() {
        let resolved = resolve_data_dir("~/.helpdesk/data");
        assert!(resolved.ends_with(".helpdesk/data"));
        assert!(!resolved.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_sqlite_sources_are_seeded() {
        let dir = tempfile::tempdir().unwrap();
        let config = HelpdeskConfig::default();
        let sources = open_sources(&config, dir.path()).unwrap();
        let rt = tokio::runtime::Runtime::new().unwrap();
        let entries = rt.block_on(sources.knowledge.fetch_all()).unwrap();
        assert_eq!(entries.len(), seed::knowledge_base().len());
        let users = rt.block_on(sources.users.fetch_all()).unwrap();
        assert_eq!(users.len(), seed::demo_users().len());
        assert!(dir.path().join("helpdesk.db").exists());
    }
}
