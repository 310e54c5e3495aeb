//! Record task manager
//!
//! Creates, starts, stops and destroys the record tasks of every monitored
//! room and fans bulk operations out over all ready tasks.

use futures::future::join_all;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

use super::handle::{RecordTask, TaskFactory};
use super::registry::TaskRegistry;
use super::RoomId;
use crate::settings::{SettingsKey, SettingsSource, TaskSettings};
use crate::utils::error::{TaskError, TaskResult};
use crate::utils::retry::{RetryConfig, RetryPolicy};

/// Task manager configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Retry policy for task creation
    pub retry: RetryConfig,
}

/// Events emitted by the task manager
#[derive(Debug, Clone)]
pub enum TaskEvent {
    /// Task created, set up and registered
    Added(RoomId),
    /// Task torn down and unregistered
    Removed(RoomId),
    /// All tasks destroyed and the registry cleared
    TasksDestroyed { destroyed: usize, failed: usize },
}

/// A task of a batch load that could not be created
#[derive(Debug, Clone)]
pub struct LoadFailure {
    pub room_id: RoomId,
    pub error: Arc<TaskError>,
}

/// Owns the record task of every managed room
pub struct RecordTaskManager {
    pub(super) registry: TaskRegistry,
    factory: Arc<dyn TaskFactory>,
    settings: Arc<dyn SettingsSource>,
    retry: RetryPolicy,
    event_tx: broadcast::Sender<TaskEvent>,
    failure_tx: mpsc::UnboundedSender<LoadFailure>,
    failure_rx: Mutex<Option<mpsc::UnboundedReceiver<LoadFailure>>>,
}

impl RecordTaskManager {
    pub fn new(factory: Arc<dyn TaskFactory>, settings: Arc<dyn SettingsSource>) -> Self {
        Self::with_config(factory, settings, &ManagerConfig::default())
    }

    pub fn with_config(
        factory: Arc<dyn TaskFactory>,
        settings: Arc<dyn SettingsSource>,
        config: &ManagerConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        let (failure_tx, failure_rx) = mpsc::unbounded_channel();
        Self {
            registry: TaskRegistry::new(),
            factory,
            settings,
            retry: RetryPolicy::new(&config.retry),
            event_tx,
            failure_tx,
            failure_rx: Mutex::new(Some(failure_rx)),
        }
    }

    /// Subscribe to task lifecycle events
    ///
    /// Slow subscribers may lag and miss events; batch-load failures are
    /// delivered through [`Self::take_load_failures`] instead.
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.event_tx.subscribe()
    }

    /// Take the receiver of batch-load failures
    ///
    /// Failures queue up until read and are never dropped. Returns `None`
    /// once the receiver has been taken.
    pub fn take_load_failures(&self) -> Option<mpsc::UnboundedReceiver<LoadFailure>> {
        self.failure_rx.lock().take()
    }

    fn emit(&self, event: TaskEvent) {
        // no subscribers is fine
        let _ = self.event_tx.send(event);
    }

    pub fn has_task(&self, room_id: RoomId) -> bool {
        self.registry.contains(room_id)
    }

    /// Create tasks for every room in the settings source
    pub async fn load_all_tasks(&self) -> TaskResult<()> {
        tracing::info!("Loading all tasks...");

        let settings = self.settings.get_settings(&[SettingsKey::Tasks]).await?;
        let tasks = settings
            .tasks
            .ok_or_else(|| TaskError::Settings("no task list in settings".to_string()))?;
        self.load_tasks(&tasks).await;

        tracing::info!("Load all tasks complete");
        Ok(())
    }

    /// Create a task per entry; a failed entry is reported and skipped
    pub async fn load_tasks(&self, settings_list: &[TaskSettings]) {
        for settings in settings_list {
            if let Err(error) = self.add_task(settings).await {
                // the receiver may have been taken and dropped
                let _ = self.failure_tx.send(LoadFailure {
                    room_id: settings.room_id,
                    error: Arc::new(error),
                });
            }
        }
    }

    /// Destroy every ready task and forget all tasks
    ///
    /// Destroy failures are logged and otherwise ignored.
    pub async fn destroy_all_tasks(&self) {
        tracing::info!("Destroying all tasks...");
        if self.registry.is_empty() {
            return;
        }

        let tasks: Vec<_> = self.registry.iter_ready().collect();
        let results = join_all(tasks.iter().map(|task| task.destroy())).await;

        let mut failed = 0;
        for (task, result) in tasks.iter().zip(results) {
            if let Err(error) = result {
                failed += 1;
                tracing::warn!("Failed to destroy task {}: {}", task.room_id(), error);
            }
        }
        self.registry.clear();
        self.emit(TaskEvent::TasksDestroyed {
            destroyed: tasks.len() - failed,
            failed,
        });

        if failed == 0 {
            tracing::info!("Successfully destroyed all tasks");
        } else {
            tracing::warn!("Destroyed all tasks, {} of {} failed", failed, tasks.len());
        }
    }

    /// Create, register and set up the task for a room
    ///
    /// Transient failures are retried with exponential backoff. A task that
    /// fails to come up is never left registered.
    pub async fn add_task(&self, settings: &TaskSettings) -> TaskResult<()> {
        self.retry
            .run(move || self.try_add_task(settings), TaskError::is_retryable)
            .await?;
        self.emit(TaskEvent::Added(settings.room_id));
        Ok(())
    }

    async fn try_add_task(&self, settings: &TaskSettings) -> TaskResult<()> {
        let room_id = settings.room_id;
        tracing::info!("Adding task {}...", room_id);

        if self.registry.contains(room_id) {
            return Err(TaskError::AlreadyExists(room_id));
        }
        let task = self.factory.create_task(room_id);
        self.registry.insert(room_id, task.clone())?;

        if let Err(error) = self.init_task(task.as_ref(), settings).await {
            tracing::error!("Failed to add task {} due to: {}", room_id, error);
            self.registry.remove_task(room_id, &task);
            if task.ready() {
                discard_task(task.as_ref()).await;
            }
            return Err(error);
        }

        tracing::info!("Successfully added task {}", room_id);
        Ok(())
    }

    async fn init_task(&self, task: &dyn RecordTask, settings: &TaskSettings) -> TaskResult<()> {
        let room_id = settings.room_id;

        // the session is fresh, no need to rebuild it
        self.apply_task_header_settings(room_id, settings.header.clone(), false)
            .await?;
        task.setup().await?;

        self.apply_task_output_settings(room_id, settings.output.clone())?;
        self.apply_task_danmaku_settings(room_id, settings.danmaku.clone())?;
        self.apply_task_recorder_settings(room_id, settings.recorder.clone())?;
        self.apply_task_postprocessing_settings(room_id, settings.postprocessing.clone())?;

        if settings.enable_monitor {
            task.enable_monitor().await?;
        }
        if settings.enable_recorder {
            task.enable_recorder().await?;
        }
        Ok(())
    }

    /// Stop and destroy a task, then unregister it
    pub async fn remove_task(&self, room_id: RoomId) -> TaskResult<()> {
        let task = self.registry.get_ready(room_id)?;

        // producers stop before the task is released
        task.disable_recorder(true).await?;
        task.disable_monitor().await?;
        task.destroy().await?;
        self.registry.remove_task(room_id, &task);

        tracing::info!("Removed task {}", room_id);
        self.emit(TaskEvent::Removed(room_id));
        Ok(())
    }

    pub async fn remove_all_tasks(&self) {
        let rooms = self.registry.ready_room_ids();
        if rooms.is_empty() {
            return;
        }

        let results = join_all(rooms.iter().map(|&room_id| self.remove_task(room_id))).await;
        for (room_id, result) in rooms.into_iter().zip(results) {
            match result {
                Ok(()) => {}
                Err(error @ (TaskError::NotFound(_) | TaskError::NotReady(_))) => {
                    tracing::debug!("Skipped removing task {}: {}", room_id, error);
                }
                Err(error) => {
                    tracing::warn!("Failed to remove task {}: {}", room_id, error);
                }
            }
        }
    }

    pub async fn start_task(&self, room_id: RoomId) -> TaskResult<()> {
        let task = self.registry.get_ready(room_id)?;
        task.update_info().await?;
        task.enable_monitor().await?;
        task.enable_recorder().await
    }

    pub async fn stop_task(&self, room_id: RoomId, force: bool) -> TaskResult<()> {
        let task = self.registry.get_ready(room_id)?;
        task.disable_recorder(force).await?;
        task.disable_monitor().await
    }

    pub async fn start_all_tasks(&self) {
        self.update_all_task_infos().await;
        self.enable_all_task_monitors().await;
        self.enable_all_task_recorders().await;
    }

    pub async fn stop_all_tasks(&self, force: bool) {
        self.disable_all_task_recorders(force).await;
        self.disable_all_task_monitors().await;
    }

    pub async fn enable_task_monitor(&self, room_id: RoomId) -> TaskResult<()> {
        self.registry.get_ready(room_id)?.enable_monitor().await
    }

    pub async fn disable_task_monitor(&self, room_id: RoomId) -> TaskResult<()> {
        self.registry.get_ready(room_id)?.disable_monitor().await
    }

    pub async fn enable_all_task_monitors(&self) {
        self.for_each_ready("enable monitor", |task| async move {
            task.enable_monitor().await
        })
        .await;
    }

    pub async fn disable_all_task_monitors(&self) {
        self.for_each_ready("disable monitor", |task| async move {
            task.disable_monitor().await
        })
        .await;
    }

    pub async fn enable_task_recorder(&self, room_id: RoomId) -> TaskResult<()> {
        self.registry.get_ready(room_id)?.enable_recorder().await
    }

    pub async fn disable_task_recorder(&self, room_id: RoomId, force: bool) -> TaskResult<()> {
        self.registry
            .get_ready(room_id)?
            .disable_recorder(force)
            .await
    }

    pub async fn enable_all_task_recorders(&self) {
        self.for_each_ready("enable recorder", |task| async move {
            task.enable_recorder().await
        })
        .await;
    }

    pub async fn disable_all_task_recorders(&self, force: bool) {
        self.for_each_ready("disable recorder", move |task| async move {
            task.disable_recorder(force).await
        })
        .await;
    }

    pub async fn update_task_info(&self, room_id: RoomId) -> TaskResult<()> {
        self.registry.get_ready(room_id)?.update_info().await
    }

    pub async fn update_all_task_infos(&self) {
        self.for_each_ready("update info", |task| async move { task.update_info().await })
            .await;
    }

    /// Run `op` concurrently on every ready task and wait for all of them
    ///
    /// Individual failures are logged, not returned.
    async fn for_each_ready<F, Fut>(&self, action: &str, op: F)
    where
        F: Fn(Arc<dyn RecordTask>) -> Fut,
        Fut: Future<Output = TaskResult<()>>,
    {
        let tasks: Vec<_> = self.registry.iter_ready().collect();
        if tasks.is_empty() {
            return;
        }

        let rooms: Vec<RoomId> = tasks.iter().map(|task| task.room_id()).collect();
        let results = join_all(tasks.into_iter().map(op)).await;
        for (room_id, result) in rooms.into_iter().zip(results) {
            if let Err(error) = result {
                tracing::warn!("Failed to {} for task {}: {}", action, room_id, error);
            }
        }
    }
}

/// Tear down a task that was set up but failed to come up
///
/// Every step runs even if an earlier one fails.
async fn discard_task(task: &dyn RecordTask) {
    let room_id = task.room_id();
    if let Err(error) = task.disable_recorder(true).await {
        tracing::warn!("Failed to disable recorder of discarded task {}: {}", room_id, error);
    }
    if let Err(error) = task.disable_monitor().await {
        tracing::warn!("Failed to disable monitor of discarded task {}: {}", room_id, error);
    }
    if let Err(error) = task.destroy().await {
        tracing::warn!("Failed to destroy discarded task {}: {}", room_id, error);
    }
}
