//! Settings applier
//!
//! Pushes settings bundles onto a registered task. These operations do not
//! require the task to be ready; task creation applies the header before
//! setup runs.

use super::manager::RecordTaskManager;
use super::RoomId;
use crate::settings::{
    DanmakuSettings, HeaderSettings, OutputSettings, PostprocessingSettings, RecorderSettings,
};
use crate::utils::error::TaskResult;

impl RecordTaskManager {
    /// Apply connection identity settings to a task
    ///
    /// Nothing happens when the user agent and cookie are unchanged, so a
    /// live connection is not interrupted for a no-op update. Otherwise
    /// the task's session is rebuilt if `update_session` is set.
    pub async fn apply_task_header_settings(
        &self,
        room_id: RoomId,
        settings: HeaderSettings,
        update_session: bool,
    ) -> TaskResult<()> {
        let task = self.registry.get(room_id)?;

        let current = task.header();
        if current.user_agent == settings.user_agent && current.cookie == settings.cookie {
            tracing::debug!("Header settings of task {} unchanged", room_id);
            return Ok(());
        }

        task.update(settings.into());

        if update_session {
            task.update_session().await?;
        }
        Ok(())
    }

    pub fn apply_task_output_settings(
        &self,
        room_id: RoomId,
        settings: OutputSettings,
    ) -> TaskResult<()> {
        self.registry.get(room_id)?.update(settings.into());
        Ok(())
    }

    pub fn apply_task_danmaku_settings(
        &self,
        room_id: RoomId,
        settings: DanmakuSettings,
    ) -> TaskResult<()> {
        self.registry.get(room_id)?.update(settings.into());
        Ok(())
    }

    pub fn apply_task_recorder_settings(
        &self,
        room_id: RoomId,
        settings: RecorderSettings,
    ) -> TaskResult<()> {
        self.registry.get(room_id)?.update(settings.into());
        Ok(())
    }

    pub fn apply_task_postprocessing_settings(
        &self,
        room_id: RoomId,
        settings: PostprocessingSettings,
    ) -> TaskResult<()> {
        self.registry.get(room_id)?.update(settings.into());
        Ok(())
    }
}
