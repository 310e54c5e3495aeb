//! Task queries
//!
//! Read-only projections of ready tasks. Per-room queries fail with
//! `NotFound` or `NotReady`; bulk queries skip tasks that are not ready.

use super::handle::RecordTask;
use super::manager::RecordTaskManager;
use super::state::{
    DanmakuFileDetail, MetaData, StreamProfile, TaskData, TaskParam, VideoFileDetail,
};
use super::RoomId;
use crate::utils::error::TaskResult;

fn make_task_data(task: &dyn RecordTask) -> TaskData {
    TaskData {
        user_info: task.user_info(),
        room_info: task.room_info(),
        task_status: task.status(),
    }
}

/// Rebuilt from the task's live settings on every call
fn make_task_param(task: &dyn RecordTask) -> TaskParam {
    TaskParam::new(
        task.header(),
        task.output(),
        task.danmaku(),
        task.recorder(),
        task.postprocessing(),
    )
}

impl RecordTaskManager {
    pub fn get_task_data(&self, room_id: RoomId) -> TaskResult<TaskData> {
        let task = self.registry.get_ready(room_id)?;
        Ok(make_task_data(task.as_ref()))
    }

    pub fn get_all_task_data(&self) -> impl Iterator<Item = TaskData> {
        self.registry
            .iter_ready()
            .map(|task| make_task_data(task.as_ref()))
    }

    pub fn get_task_param(&self, room_id: RoomId) -> TaskResult<TaskParam> {
        let task = self.registry.get_ready(room_id)?;
        Ok(make_task_param(task.as_ref()))
    }

    pub fn get_task_metadata(&self, room_id: RoomId) -> TaskResult<Option<MetaData>> {
        Ok(self.registry.get_ready(room_id)?.metadata())
    }

    pub fn get_task_stream_profile(&self, room_id: RoomId) -> TaskResult<StreamProfile> {
        Ok(self.registry.get_ready(room_id)?.stream_profile())
    }

    pub fn get_task_video_file_details(
        &self,
        room_id: RoomId,
    ) -> TaskResult<impl Iterator<Item = VideoFileDetail>> {
        Ok(self
            .registry
            .get_ready(room_id)?
            .video_file_details()
            .into_iter())
    }

    pub fn get_task_danmaku_file_details(
        &self,
        room_id: RoomId,
    ) -> TaskResult<impl Iterator<Item = DanmakuFileDetail>> {
        Ok(self
            .registry
            .get_ready(room_id)?
            .danmaku_file_details()
            .into_iter())
    }

    pub fn can_cut_stream(&self, room_id: RoomId) -> TaskResult<bool> {
        Ok(self.registry.get_ready(room_id)?.can_cut_stream())
    }

    pub fn cut_stream(&self, room_id: RoomId) -> TaskResult<bool> {
        Ok(self.registry.get_ready(room_id)?.cut_stream())
    }
}
