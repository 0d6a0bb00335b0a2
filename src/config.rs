//! Configuration file handling.
//!
//! The configuration file is stored at `$POULTRY_HOME/config.json`. It holds the production
//! categories that always appear on the production chart and the size of rendered charts. Both the
//! file and the SQLite database are created on first use.

use crate::db::Db;
use crate::error::{ErrorType, IntoResult, Res};
use crate::{utils, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_NAME: &str = "poultry";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const POULTRY_SQLITE: &str = "poultry.sqlite";
const CHARTS: &str = "charts";
const DEFAULT_CATEGORIES: [&str; 3] = ["A", "B", "C"];
const DEFAULT_CHART_WIDTH: u64 = 1000;
const DEFAULT_CHART_HEIGHT: u64 = 600;

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$POULTRY_HOME`. It owns the open database handle that every command shares.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    charts: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    db: Db,
    sqlite_path: PathBuf,
}

impl Config {
    /// This will
    /// - create `poultry_home` and its `charts` directory if they do not exist
    /// - write a default config file if there is none, otherwise load and validate it
    /// - open the SQLite database, creating the schema if it is absent
    pub async fn load(poultry_home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_inner(poultry_home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn load_inner(poultry_home: PathBuf) -> Res<Self> {
        let maybe_relative = poultry_home;
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the poultry home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let charts = root.join(CHARTS);
        utils::make_dir(&charts).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = if config_path.is_file() {
            ConfigFile::load(&config_path).await?
        } else {
            debug!("Writing default config to {}", config_path.display());
            let config_file = ConfigFile::default();
            config_file.save(&config_path).await?;
            config_file
        };

        let sqlite_path = root.join(POULTRY_SQLITE);
        let db = Db::open(&sqlite_path)
            .await
            .context("Unable to load SQLite DB")?;

        Ok(Self {
            root,
            charts,
            config_path,
            config_file,
            db,
            sqlite_path,
        })
    }

    /// Closes the database handle. Call once, at shutdown.
    pub async fn close(&self) {
        self.db.close().await;
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub(crate) fn db(&self) -> &Db {
        &self.db
    }

    /// The directory that refreshed charts are written to.
    pub fn charts(&self) -> &Path {
        &self.charts
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    /// The production categories that are charted even when no row uses them yet.
    pub fn categories(&self) -> &[String] {
        &self.config_file.categories
    }

    pub fn chart_width(&self) -> u64 {
        self.config_file.chart_width
    }

    pub fn chart_height(&self) -> u64 {
        self.config_file.chart_height
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "poultry",
///   "config_version": 1,
///   "categories": ["A", "B", "C"],
///   "chart_width": 1000,
///   "chart_height": 600
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "poultry"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Seed categories for the production chart
    #[serde(default = "default_categories")]
    categories: Vec<String>,

    #[serde(default = "default_chart_width")]
    chart_width: u64,

    #[serde(default = "default_chart_height")]
    chart_height: u64,
}

fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect()
}

fn default_chart_width() -> u64 {
    DEFAULT_CHART_WIDTH
}

fn default_chart_height() -> u64 {
    DEFAULT_CHART_HEIGHT
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            categories: default_categories(),
            chart_width: DEFAULT_CHART_WIDTH,
            chart_height: DEFAULT_CHART_HEIGHT,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it belongs to another app.
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}
