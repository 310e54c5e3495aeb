//! Task state snapshots
//!
//! Read-only views of a record task handed out by the task manager.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::RoomId;
use crate::settings::{
    CoverSaveStrategy, DanmakuSettings, DeleteStrategy, HeaderSettings, OutputSettings,
    PostprocessingSettings, RecorderSettings, StreamFormat,
};

/// What a record task is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunningStatus {
    /// Neither monitoring nor recording
    #[default]
    Stopped,
    /// Waiting for the room to go live
    Waiting,
    /// Stream data is being written
    Recording,
    /// Converting a finished file to mp4
    Remuxing,
    /// Writing extra metadata into a finished file
    Injecting,
}

/// Live status of a record task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub monitor_enabled: bool,
    pub recorder_enabled: bool,
    pub running_status: RunningStatus,

    pub stream_url: String,
    pub stream_host: String,

    /// Seconds recorded in the current session
    pub rec_elapsed: f64,
    /// Bytes recorded in the current session
    pub rec_total: u64,
    /// Recording rate in bytes per second
    pub rec_rate: f64,

    pub danmu_total: u64,
    /// Danmaku per minute
    pub danmu_rate: f64,

    pub real_stream_format: Option<StreamFormat>,
    pub real_quality_number: Option<u32>,
    pub recording_path: Option<PathBuf>,
}

/// Streamer of a room
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub uid: u64,
    pub name: String,
    pub gender: String,
    pub face: String,
    pub level: u32,
    pub sign: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveStatus {
    #[default]
    Preparing,
    Live,
    Round,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub uid: u64,
    pub room_id: RoomId,
    pub short_room_id: RoomId,
    pub area_id: u32,
    pub area_name: String,
    pub parent_area_id: u32,
    pub parent_area_name: String,
    pub live_status: LiveStatus,
    pub live_start_time: Option<DateTime<Utc>>,
    pub online: u64,
    pub title: String,
    pub cover: String,
    pub tags: String,
    pub description: String,
}

/// Status snapshot of a ready task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskData {
    pub user_info: UserInfo,
    pub room_info: RoomInfo,
    pub task_status: TaskStatus,
}

/// Every setting currently applied to a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskParam {
    // output
    pub out_dir: PathBuf,
    pub path_template: String,
    pub filesize_limit: u64,
    pub duration_limit: u64,

    // header
    pub user_agent: String,
    pub cookie: String,

    // danmaku
    pub danmu_uname: bool,
    pub record_gift_send: bool,
    pub record_free_gifts: bool,
    pub record_guard_buy: bool,
    pub record_super_chat: bool,
    pub save_raw_danmaku: bool,

    // recorder
    pub stream_format: StreamFormat,
    pub quality_number: u32,
    pub fmp4_stream_timeout: u64,
    pub read_timeout: u64,
    pub disconnection_timeout: u64,
    pub buffer_size: u32,
    pub save_cover: bool,
    pub cover_save_strategy: CoverSaveStrategy,

    // postprocessing
    pub remux_to_mp4: bool,
    pub inject_extra_metadata: bool,
    pub delete_source: DeleteStrategy,
}

impl TaskParam {
    pub fn new(
        header: HeaderSettings,
        output: OutputSettings,
        danmaku: DanmakuSettings,
        recorder: RecorderSettings,
        postprocessing: PostprocessingSettings,
    ) -> Self {
        Self {
            out_dir: output.out_dir,
            path_template: output.path_template,
            filesize_limit: output.filesize_limit,
            duration_limit: output.duration_limit,
            user_agent: header.user_agent,
            cookie: header.cookie,
            danmu_uname: danmaku.danmu_uname,
            record_gift_send: danmaku.record_gift_send,
            record_free_gifts: danmaku.record_free_gifts,
            record_guard_buy: danmaku.record_guard_buy,
            record_super_chat: danmaku.record_super_chat,
            save_raw_danmaku: danmaku.save_raw_danmaku,
            stream_format: recorder.stream_format,
            quality_number: recorder.quality_number,
            fmp4_stream_timeout: recorder.fmp4_stream_timeout,
            read_timeout: recorder.read_timeout,
            disconnection_timeout: recorder.disconnection_timeout,
            buffer_size: recorder.buffer_size,
            save_cover: recorder.save_cover,
            cover_save_strategy: recorder.cover_save_strategy,
            remux_to_mp4: postprocessing.remux_to_mp4,
            inject_extra_metadata: postprocessing.inject_extra_metadata,
            delete_source: postprocessing.delete_source,
        }
    }
}

/// Metadata of the stream being recorded
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaData {
    pub has_audio: bool,
    pub has_video: bool,
    pub has_metadata: bool,
    pub has_keyframes: bool,
    pub can_seek_to_end: bool,
    pub duration: f64,
    pub filesize: u64,
    pub width: u32,
    pub height: u32,
    pub framerate: f64,
    pub videodatarate: f64,
    pub audiodatarate: f64,
}

/// Probe output for the live stream, keyed by the prober's field names
pub type StreamProfile = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFileStatus {
    Recording,
    Remuxing,
    Injecting,
    Completed,
    Missing,
    Broken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DanmakuFileStatus {
    Recording,
    Completed,
    Missing,
    Broken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFileDetail {
    pub path: PathBuf,
    pub size: u64,
    pub status: VideoFileStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DanmakuFileDetail {
    pub path: PathBuf,
    pub size: u64,
    pub status: DanmakuFileStatus,
}
