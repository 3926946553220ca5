//! Persisted user settings and their layered loading.
//!
//! Settings compose from serialized defaults, an optional TOML file, and a
//! `FOLDERDASH`-prefixed environment overlay (highest precedence). Saving
//! writes pretty TOML back to the store path.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::DashError;
use crate::logging::LoggingConfig;
use crate::marking::VisibilityOptions;
use crate::render::{RenderConfig, ViewType};

/// User-configurable options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Dashboard layout variant.
    #[serde(default)]
    pub view_type: ViewType,

    /// Display frontmatter properties in file listings.
    #[serde(default)]
    pub include_frontmatter: bool,

    /// Display creation date for each file.
    #[serde(default)]
    pub show_file_creation_date: bool,

    /// Display last modified date for each file.
    #[serde(default)]
    pub show_file_modification_date: bool,

    /// Template for the message under the dashboard heading; `{folder}`
    /// expands to the folder name.
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,

    /// Hide dashboard documents in the explorer.
    #[serde(default = "default_true")]
    pub hide_dashboard_notes: bool,

    /// Hide the contents of dashboard-bearing folders in the explorer.
    #[serde(default)]
    pub hide_folder_contents: bool,

    /// Quiet period after the last change before a dashboard regenerates.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Tolerance for the host UI's asynchronous row construction before a
    /// mark is applied. Empirical, not a precise contract.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_true() -> bool {
    true
}

fn default_welcome_message() -> String {
    "*This is a dynamic dashboard for the \"{folder}\" folder.*".to_string()
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_settle_ms() -> u64 {
    100
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            view_type: ViewType::default(),
            include_frontmatter: false,
            show_file_creation_date: false,
            show_file_modification_date: false,
            welcome_message: default_welcome_message(),
            hide_dashboard_notes: true,
            hide_folder_contents: false,
            debounce_ms: default_debounce_ms(),
            settle_ms: default_settle_ms(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Settings {
    /// Immutable render-time snapshot of the display options.
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            view: self.view_type,
            include_frontmatter: self.include_frontmatter,
            show_created: self.show_file_creation_date,
            show_modified: self.show_file_modification_date,
            welcome_message: self.welcome_message.clone(),
        }
    }

    pub fn visibility(&self) -> VisibilityOptions {
        VisibilityOptions {
            hide_dashboard_notes: self.hide_dashboard_notes,
            hide_folder_contents: self.hide_folder_contents,
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Load/save store for persisted settings.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Conventional store location inside a vault root.
    pub fn for_vault(root: &Path) -> Self {
        Self::new(root.join(".folderdash").join("settings.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings with precedence: defaults (lowest) -> settings file ->
    /// environment (highest). A missing file is not an error.
    pub fn load(&self) -> Result<Settings, DashError> {
        let builder = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::from(self.path.as_path()).required(false))
            .add_source(
                Environment::with_prefix("FOLDERDASH")
                    .separator("__")
                    .try_parsing(true),
            );
        let settings = builder.build()?.try_deserialize()?;
        debug!(path = %self.path.display(), "Settings loaded");
        Ok(settings)
    }

    /// Persist settings as pretty TOML, creating parent directories.
    pub fn save(&self, settings: &Settings) -> Result<(), DashError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let rendered = toml::to_string_pretty(settings)?;
        std::fs::write(&self.path, rendered)?;
        Ok(())
    }
}
