//! Subcommand implementations and the store options they share.

pub mod admin;
pub mod pages;

use clap::Args;
use std::path::PathBuf;
use wiki_core::{init_logging_from_settings, ApplicationSettings, DataStoreType};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Debug, Args)]
pub struct StoreArgs {
    /// TOML settings file
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Data store type (sqlite, postgres); overrides the settings file
    #[arg(long, global = true)]
    pub data_store: Option<DataStoreType>,

    /// Connection string or database path; overrides the settings file
    #[arg(long, global = true)]
    pub connection: Option<String>,

    /// Absolute directory for log files
    #[arg(long, global = true)]
    pub log_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

impl StoreArgs {
    /// Merges the settings file with command-line overrides and starts
    /// logging when a log directory is known.
    pub fn resolve(&self) -> Result<ApplicationSettings, Box<dyn std::error::Error>> {
        let mut settings = match (&self.settings, &self.connection) {
            (Some(path), _) => ApplicationSettings::load(path)?,
            (None, Some(connection)) => ApplicationSettings::new(
                self.data_store.unwrap_or_default(),
                connection.clone(),
            ),
            (None, None) => return Err("either --settings or --connection is required".into()),
        };

        if let Some(data_store) = self.data_store {
            settings.data_store_type = data_store;
        }
        if let Some(connection) = &self.connection {
            settings.connection_string = connection.clone();
        }
        if self.log_dir.is_some() {
            settings.logging.dir = self.log_dir.clone();
        }
        if self.log_level.is_some() {
            settings.logging.level = self.log_level.clone();
        }

        init_logging_from_settings(&settings.logging)?;
        Ok(settings)
    }
}
