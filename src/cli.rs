//! CLI tooling.
//!
//! Command-line interface over a filesystem vault: one-shot dashboard
//! operations plus the long-running watch mode.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::{CreateOutcome, DashboardEngine};
use crate::error::DashError;
use crate::logging::init_logging;
use crate::marking::NoopTreeView;
use crate::settings::SettingsStore;
use crate::vault::FsVault;
use crate::watch::WatchBridge;

/// Folderdash CLI - synchronized folder dashboards
#[derive(Parser)]
#[command(name = "folderdash")]
#[command(about = "Synchronized folder dashboards for hierarchical document vaults")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault root directory
    #[arg(long, default_value = ".")]
    pub vault: PathBuf,

    /// Settings file path (default: <vault>/.folderdash/settings.toml)
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch the vault and keep dashboards synchronized until interrupted
    Watch,
    /// Create the dashboard for a folder, or report the existing one
    Create {
        /// Folder path relative to the vault root
        folder: String,
    },
    /// Print the rendered dashboard body for a folder
    Render {
        /// Folder path relative to the vault root
        folder: String,
    },
    /// Regenerate every dashboard in the vault once
    Sync,
}

/// Shared context for command execution.
pub struct CliContext {
    vault: Arc<FsVault>,
    engine: Arc<DashboardEngine>,
}

impl CliContext {
    /// Load settings, initialize logging, and open the vault.
    pub fn new(cli: &Cli) -> Result<Self, DashError> {
        let store = match &cli.settings {
            Some(path) => SettingsStore::new(path),
            None => SettingsStore::for_vault(&cli.vault),
        };
        let mut settings = store.load()?;
        if let Some(level) = &cli.log_level {
            settings.logging.level = level.clone();
        }
        if let Some(format) = &cli.log_format {
            settings.logging.format = format.clone();
        }
        init_logging(&settings.logging)?;

        let vault = Arc::new(FsVault::new(&cli.vault));
        let engine = Arc::new(DashboardEngine::new(
            Arc::clone(&vault) as Arc<dyn crate::vault::Vault>,
            Arc::new(NoopTreeView),
            settings,
        ));
        Ok(Self { vault, engine })
    }

    /// Execute a command and return its printable output.
    pub async fn execute(&self, command: &Commands) -> Result<String, DashError> {
        match command {
            Commands::Create { folder } => {
                match self.engine.create_dashboard_for(folder).await? {
                    CreateOutcome::Created(path) => Ok(format!("Created dashboard {}", path)),
                    CreateOutcome::Existing(path) => {
                        Ok(format!("Dashboard already exists at {}", path))
                    }
                }
            }
            Commands::Render { folder } => self.engine.render_dashboard(folder).await,
            Commands::Sync => {
                self.engine.update_all_dashboards();
                let refreshed = self.drain_pending().await;
                Ok(format!("Refreshed {} dashboard(s)", refreshed))
            }
            Commands::Watch => {
                let bridge = Arc::new(WatchBridge::new(
                    Arc::clone(&self.engine),
                    Arc::clone(&self.vault),
                ));
                let runner = Arc::clone(&bridge);
                let task = tokio::task::spawn_blocking(move || runner.run());
                tokio::signal::ctrl_c().await?;
                bridge.stop();
                task.await
                    .map_err(|e| DashError::WatchError(e.to_string()))??;
                Ok("Watch stopped".to_string())
            }
        }
    }

    /// Wait for the scheduler to drain after a bulk refresh.
    async fn drain_pending(&self) -> usize {
        let mut refreshed = self.engine.pending_regenerations();
        loop {
            let pending = self.engine.pending_regenerations();
            refreshed = refreshed.max(pending);
            if pending == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        refreshed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[tokio::test]
    async fn create_then_render_round_trip() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("Projects")).unwrap();
        std::fs::write(dir.path().join("Projects/notes.md"), "").unwrap();

        let cli = Cli::parse_from(["folderdash", "--vault", dir.path().to_str().unwrap(), "sync"]);
        let context = CliContext::new(&cli).unwrap();

        let output = context
            .execute(&Commands::Create {
                folder: "Projects".to_string(),
            })
            .await
            .unwrap();
        assert!(output.starts_with("Created dashboard"));

        let output = context
            .execute(&Commands::Create {
                folder: "Projects".to_string(),
            })
            .await
            .unwrap();
        assert!(output.starts_with("Dashboard already exists"));

        let body = context
            .execute(&Commands::Render {
                folder: "Projects".to_string(),
            })
            .await
            .unwrap();
        assert!(body.contains("Projects/notes.md"));
    }

    #[tokio::test]
    async fn sync_refreshes_existing_dashboards() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("Projects")).unwrap();
        std::fs::write(dir.path().join("Projects/Projects.md"), "stale").unwrap();
        std::fs::write(dir.path().join("Projects/notes.md"), "").unwrap();

        let cli = Cli::parse_from(["folderdash", "--vault", dir.path().to_str().unwrap(), "sync"]);
        let context = CliContext::new(&cli).unwrap();
        let output = context.execute(&Commands::Sync).await.unwrap();
        assert_eq!(output, "Refreshed 1 dashboard(s)");

        let body = std::fs::read_to_string(dir.path().join("Projects/Projects.md")).unwrap();
        assert!(body.contains("Projects/notes.md"));
    }
}
