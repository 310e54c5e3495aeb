//! Task settings
//!
//! Declarative configuration bundles for record tasks and the sources they
//! are read from.

pub mod models;
pub mod source;

pub use models::{
    CoverSaveStrategy, DanmakuSettings, DeleteStrategy, HeaderSettings, OutputSettings,
    PostprocessingSettings, RecorderSettings, Settings, SettingsKey, StreamFormat, TaskSettings,
};
pub use source::{load_json, ConfigError, SettingsSource, StaticSettingsSource};
