//! Record task management
//!
//! This module owns the record task of every monitored room:
//! - RecordTask trait implemented by per-room recording jobs
//! - TaskRegistry mapping rooms to their tasks
//! - RecordTaskManager to create, control, configure and query tasks

pub mod apply;
pub mod handle;
pub mod manager;
pub mod query;
pub mod registry;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

/// Identifier of a broadcast room
pub type RoomId = u64;

pub use handle::{RecordTask, TaskConfig, TaskFactory};
pub use manager::{LoadFailure, ManagerConfig, RecordTaskManager, TaskEvent};
pub use registry::TaskRegistry;
pub use state::{
    DanmakuFileDetail, DanmakuFileStatus, LiveStatus, MetaData, RoomInfo, RunningStatus,
    StreamProfile, TaskData, TaskParam, TaskStatus, UserInfo, VideoFileDetail, VideoFileStatus,
};
