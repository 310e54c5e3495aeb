//! Record task contract
//!
//! A record task owns everything needed to monitor and record one room:
//! its session with the live service, the live status monitor, the stream
//! recorder and its chat capture. The task manager only drives tasks
//! through this trait.

use async_trait::async_trait;
use std::sync::Arc;

use super::state::{
    DanmakuFileDetail, MetaData, RoomInfo, StreamProfile, TaskStatus, UserInfo, VideoFileDetail,
};
use super::RoomId;
use crate::settings::{
    DanmakuSettings, HeaderSettings, OutputSettings, PostprocessingSettings, RecorderSettings,
};
use crate::utils::error::TaskResult;

/// A settings bundle to apply to a task
#[derive(Debug, Clone, PartialEq)]
pub enum TaskConfig {
    Header(HeaderSettings),
    Output(OutputSettings),
    Danmaku(DanmakuSettings),
    Recorder(RecorderSettings),
    Postprocessing(PostprocessingSettings),
}

impl From<HeaderSettings> for TaskConfig {
    fn from(settings: HeaderSettings) -> Self {
        TaskConfig::Header(settings)
    }
}

impl From<OutputSettings> for TaskConfig {
    fn from(settings: OutputSettings) -> Self {
        TaskConfig::Output(settings)
    }
}

impl From<DanmakuSettings> for TaskConfig {
    fn from(settings: DanmakuSettings) -> Self {
        TaskConfig::Danmaku(settings)
    }
}

impl From<RecorderSettings> for TaskConfig {
    fn from(settings: RecorderSettings) -> Self {
        TaskConfig::Recorder(settings)
    }
}

impl From<PostprocessingSettings> for TaskConfig {
    fn from(settings: PostprocessingSettings) -> Self {
        TaskConfig::Postprocessing(settings)
    }
}

/// Per-room recording job
#[async_trait]
pub trait RecordTask: Send + Sync {
    fn room_id(&self) -> RoomId;

    /// Set once `setup` has completed
    fn ready(&self) -> bool;

    async fn setup(&self) -> TaskResult<()>;
    async fn destroy(&self) -> TaskResult<()>;

    async fn enable_monitor(&self) -> TaskResult<()>;
    async fn disable_monitor(&self) -> TaskResult<()>;

    async fn enable_recorder(&self) -> TaskResult<()>;
    /// Stop recording; with `force` the current recording is cut immediately
    async fn disable_recorder(&self, force: bool) -> TaskResult<()>;

    /// Refresh user and room info from the live service
    async fn update_info(&self) -> TaskResult<()>;

    /// Rebuild the session so a new header identity takes effect
    async fn update_session(&self) -> TaskResult<()>;

    fn can_cut_stream(&self) -> bool;
    fn cut_stream(&self) -> bool;

    /// Replace one settings bundle; in-flight work sees it immediately
    fn update(&self, config: TaskConfig);

    fn header(&self) -> HeaderSettings;
    fn output(&self) -> OutputSettings;
    fn danmaku(&self) -> DanmakuSettings;
    fn recorder(&self) -> RecorderSettings;
    fn postprocessing(&self) -> PostprocessingSettings;

    fn user_info(&self) -> UserInfo;
    fn room_info(&self) -> RoomInfo;
    fn status(&self) -> TaskStatus;
    fn metadata(&self) -> Option<MetaData>;
    fn stream_profile(&self) -> StreamProfile;
    fn video_file_details(&self) -> Vec<VideoFileDetail>;
    fn danmaku_file_details(&self) -> Vec<DanmakuFileDetail>;
}

/// Builds record tasks for the task manager
pub trait TaskFactory: Send + Sync {
    fn create_task(&self, room_id: RoomId) -> Arc<dyn RecordTask>;
}
