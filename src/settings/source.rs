//! Settings sources
//!
//! The task manager reads its task list from a [`SettingsSource`]. Loading
//! is read-only; persisting settings is someone else's job.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::models::{Settings, SettingsKey};
use crate::utils::error::TaskResult;

/// Errors while reading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read and deserialize a JSON document
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value = serde_json::from_str(&content)?;

    tracing::debug!("Loaded configuration from {:?}", path);

    Ok(value)
}

/// Supplies settings documents to the task manager
#[async_trait]
pub trait SettingsSource: Send + Sync {
    /// Get settings for the requested keys; other keys are left unset
    async fn get_settings(&self, keys: &[SettingsKey]) -> TaskResult<Settings>;
}

/// Settings held in memory
#[derive(Debug, Default)]
pub struct StaticSettingsSource {
    settings: RwLock<Settings>,
}

impl StaticSettingsSource {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }

    /// Load the settings document from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::new(load_json(path)?))
    }

    /// Replace the settings document
    pub fn replace(&self, settings: Settings) {
        *self.settings.write() = settings;
    }
}

#[async_trait]
impl SettingsSource for StaticSettingsSource {
    async fn get_settings(&self, keys: &[SettingsKey]) -> TaskResult<Settings> {
        Ok(self.settings.read().select(keys))
    }
}
