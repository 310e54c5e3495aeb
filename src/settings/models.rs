//! Settings bundles
//!
//! One value type per configuration concern of a record task. Every field
//! has a default so partial documents deserialize.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::task::RoomId;

// =============================================================================
// Connection
// =============================================================================

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Identity used when connecting to the live service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderSettings {
    pub user_agent: String,
    pub cookie: String,
}

impl Default for HeaderSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cookie: String::new(),
        }
    }
}

// =============================================================================
// Output
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Root directory for recorded files
    pub out_dir: PathBuf,

    /// Relative path template for a recorded file, without extension
    pub path_template: String,

    /// Split the recording once a file reaches this size (bytes, 0 = off)
    pub filesize_limit: u64,

    /// Split the recording once a file reaches this duration (seconds, 0 = off)
    pub duration_limit: u64,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            path_template: "{roomid} - {uname}/blive_{roomid}_{year}-{month}-{day}-{hour}{minute}{second}"
                .to_string(),
            filesize_limit: 0,
            duration_limit: 0,
        }
    }
}

// =============================================================================
// Danmaku
// =============================================================================

/// Chat capture policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DanmakuSettings {
    pub danmu_uname: bool,
    pub record_gift_send: bool,
    pub record_free_gifts: bool,
    pub record_guard_buy: bool,
    pub record_super_chat: bool,
    pub save_raw_danmaku: bool,
}

impl Default for DanmakuSettings {
    fn default() -> Self {
        Self {
            danmu_uname: false,
            record_gift_send: true,
            record_free_gifts: true,
            record_guard_buy: true,
            record_super_chat: true,
            save_raw_danmaku: false,
        }
    }
}

// =============================================================================
// Recorder
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamFormat {
    #[default]
    Flv,
    Fmp4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverSaveStrategy {
    #[default]
    Default,
    Dedup,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderSettings {
    pub stream_format: StreamFormat,

    /// Requested quality (10000 = original)
    pub quality_number: u32,

    /// Seconds to wait for an fmp4 stream before falling back to flv
    pub fmp4_stream_timeout: u64,

    /// Stream read timeout in seconds
    pub read_timeout: u64,

    /// Seconds of disconnection tolerated before a recording is closed
    pub disconnection_timeout: u64,

    /// Write buffer size in bytes
    pub buffer_size: u32,

    pub save_cover: bool,
    pub cover_save_strategy: CoverSaveStrategy,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            stream_format: StreamFormat::Flv,
            quality_number: 10000,
            fmp4_stream_timeout: 10,
            read_timeout: 3,
            disconnection_timeout: 600,
            buffer_size: 8192,
            save_cover: false,
            cover_save_strategy: CoverSaveStrategy::Default,
        }
    }
}

// =============================================================================
// Postprocessing
// =============================================================================

/// When to delete the source file after remuxing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteStrategy {
    #[default]
    Auto,
    Safe,
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostprocessingSettings {
    pub remux_to_mp4: bool,
    pub inject_extra_metadata: bool,
    pub delete_source: DeleteStrategy,
}

impl Default for PostprocessingSettings {
    fn default() -> Self {
        Self {
            remux_to_mp4: false,
            inject_extra_metadata: true,
            delete_source: DeleteStrategy::Auto,
        }
    }
}

// =============================================================================
// Task
// =============================================================================

fn default_enabled() -> bool {
    true
}

/// Everything needed to create a record task for one room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSettings {
    pub room_id: RoomId,

    #[serde(default = "default_enabled")]
    pub enable_monitor: bool,

    #[serde(default = "default_enabled")]
    pub enable_recorder: bool,

    #[serde(default)]
    pub header: HeaderSettings,

    #[serde(default)]
    pub output: OutputSettings,

    #[serde(default)]
    pub danmaku: DanmakuSettings,

    #[serde(default)]
    pub recorder: RecorderSettings,

    #[serde(default)]
    pub postprocessing: PostprocessingSettings,
}

impl TaskSettings {
    /// Settings for `room_id` with every bundle at its default
    pub fn new(room_id: RoomId) -> Self {
        Self {
            room_id,
            enable_monitor: true,
            enable_recorder: true,
            header: HeaderSettings::default(),
            output: OutputSettings::default(),
            danmaku: DanmakuSettings::default(),
            recorder: RecorderSettings::default(),
            postprocessing: PostprocessingSettings::default(),
        }
    }
}

/// Keys that can be requested from a settings source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsKey {
    Tasks,
    Header,
    Output,
    Danmaku,
    Recorder,
    Postprocessing,
}

/// A settings document; only the requested keys are populated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tasks: Option<Vec<TaskSettings>>,
    pub header: Option<HeaderSettings>,
    pub output: Option<OutputSettings>,
    pub danmaku: Option<DanmakuSettings>,
    pub recorder: Option<RecorderSettings>,
    pub postprocessing: Option<PostprocessingSettings>,
}

impl Settings {
    /// Copy of these settings keeping only `keys`
    pub fn select(&self, keys: &[SettingsKey]) -> Settings {
        let wants = |key| keys.contains(&key);
        Settings {
            tasks: self.tasks.clone().filter(|_| wants(SettingsKey::Tasks)),
            header: self.header.clone().filter(|_| wants(SettingsKey::Header)),
            output: self.output.clone().filter(|_| wants(SettingsKey::Output)),
            danmaku: self.danmaku.clone().filter(|_| wants(SettingsKey::Danmaku)),
            recorder: self.recorder.clone().filter(|_| wants(SettingsKey::Recorder)),
            postprocessing: self
                .postprocessing
                .clone()
                .filter(|_| wants(SettingsKey::Postprocessing)),
        }
    }
}
