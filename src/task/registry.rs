//! Task registry
//!
//! Maps room ids to their record tasks. A task is registered before its
//! setup completes, so anything that operates on a task should go through
//! [`TaskRegistry::get_ready`] rather than membership alone.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::handle::RecordTask;
use super::RoomId;
use crate::utils::error::{TaskError, TaskResult};

#[derive(Default)]
pub struct TaskRegistry {
    tasks: RwLock<HashMap<RoomId, Arc<dyn RecordTask>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, room_id: RoomId) -> bool {
        self.tasks.read().contains_key(&room_id)
    }

    /// Get a task whether or not it is ready
    pub fn get(&self, room_id: RoomId) -> TaskResult<Arc<dyn RecordTask>> {
        self.tasks
            .read()
            .get(&room_id)
            .cloned()
            .ok_or(TaskError::NotFound(room_id))
    }

    /// Get a task that has completed its setup
    pub fn get_ready(&self, room_id: RoomId) -> TaskResult<Arc<dyn RecordTask>> {
        let task = self.get(room_id)?;
        if !task.ready() {
            return Err(TaskError::NotReady(room_id));
        }
        Ok(task)
    }

    /// Register a task; an existing registration is never replaced
    pub fn insert(&self, room_id: RoomId, task: Arc<dyn RecordTask>) -> TaskResult<()> {
        let mut tasks = self.tasks.write();
        if tasks.contains_key(&room_id) {
            return Err(TaskError::AlreadyExists(room_id));
        }
        tasks.insert(room_id, task);
        Ok(())
    }

    pub fn remove(&self, room_id: RoomId) -> Option<Arc<dyn RecordTask>> {
        self.tasks.write().remove(&room_id)
    }

    /// Remove the entry for `room_id` only if it still holds `task`
    pub fn remove_task(&self, room_id: RoomId, task: &Arc<dyn RecordTask>) -> bool {
        let mut tasks = self.tasks.write();
        match tasks.get(&room_id) {
            Some(current) if Arc::ptr_eq(current, task) => {
                tasks.remove(&room_id);
                true
            }
            _ => false,
        }
    }

    pub fn clear(&self) {
        self.tasks.write().clear();
    }

    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }

    /// Ready tasks at the time of the call, in no particular order
    pub fn iter_ready(&self) -> impl Iterator<Item = Arc<dyn RecordTask>> {
        let tasks: Vec<_> = self
            .tasks
            .read()
            .values()
            .filter(|task| task.ready())
            .cloned()
            .collect();
        tasks.into_iter()
    }

    pub fn ready_room_ids(&self) -> Vec<RoomId> {
        self.iter_ready().map(|task| task.room_id()).collect()
    }
}
