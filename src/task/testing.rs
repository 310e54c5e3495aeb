//! Task testing utilities.
//!
//! `MockTask` records every call into a shared, ordered log and can be told
//! to fail individual steps. `MockFactory` hands out mock tasks and scripts
//! their failures per room.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use super::handle::{RecordTask, TaskConfig, TaskFactory};
use super::manager::RecordTaskManager;
use super::state::{
    DanmakuFileDetail, DanmakuFileStatus, MetaData, RoomInfo, RunningStatus, StreamProfile,
    TaskStatus, UserInfo, VideoFileDetail, VideoFileStatus,
};
use super::RoomId;
use crate::settings::{
    DanmakuSettings, HeaderSettings, OutputSettings, PostprocessingSettings, RecorderSettings,
    StaticSettingsSource, TaskSettings,
};
use crate::utils::error::{TaskError, TaskResult};

/// A call made on a mock task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Setup,
    Destroy,
    EnableMonitor,
    DisableMonitor,
    EnableRecorder,
    DisableRecorder { force: bool },
    UpdateInfo,
    UpdateSession,
    Update,
    CutStream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Call {
    pub room_id: RoomId,
    pub step: Step,
}

/// Kind of error a scripted failure produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Connection,
    ApiRequest,
    Fatal,
}

impl FailureKind {
    pub fn error(self, room_id: RoomId) -> TaskError {
        match self {
            FailureKind::Timeout => TaskError::Timeout(format!("room {}", room_id)),
            FailureKind::Connection => TaskError::Connection(format!("room {}", room_id)),
            FailureKind::ApiRequest => TaskError::ApiRequest {
                code: -352,
                message: format!("room {}", room_id),
            },
            FailureKind::Fatal => TaskError::Job(format!("room {}", room_id)),
        }
    }
}

/// Ordered log shared by every mock task of a test
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn record(&self, room_id: RoomId, step: Step) {
        self.0.lock().push(Call { room_id, step });
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().clone()
    }

    /// Steps called on one room, in order
    pub fn steps(&self, room_id: RoomId) -> Vec<Step> {
        self.0
            .lock()
            .iter()
            .filter(|call| call.room_id == room_id)
            .map(|call| call.step)
            .collect()
    }

    pub fn count(&self, step: Step) -> usize {
        self.0.lock().iter().filter(|call| call.step == step).count()
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

struct MockConfig {
    header: HeaderSettings,
    output: OutputSettings,
    danmaku: DanmakuSettings,
    recorder: RecorderSettings,
    postprocessing: PostprocessingSettings,
}

pub struct MockTask {
    room_id: RoomId,
    log: CallLog,
    ready: AtomicBool,
    monitor_enabled: AtomicBool,
    recorder_enabled: AtomicBool,
    destroyed: AtomicBool,
    config: Mutex<MockConfig>,
    failures: Mutex<HashMap<Step, FailureKind>>,
    setup_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockTask {
    pub fn new(room_id: RoomId, log: CallLog) -> Self {
        Self {
            room_id,
            log,
            ready: AtomicBool::new(false),
            monitor_enabled: AtomicBool::new(false),
            recorder_enabled: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
            config: Mutex::new(MockConfig {
                header: HeaderSettings::default(),
                output: OutputSettings::default(),
                danmaku: DanmakuSettings::default(),
                recorder: RecorderSettings::default(),
                postprocessing: PostprocessingSettings::default(),
            }),
            failures: Mutex::new(HashMap::new()),
            setup_gate: Mutex::new(None),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Make every future call of `step` fail
    pub fn fail(&self, step: Step, kind: FailureKind) {
        self.failures.lock().insert(step, kind);
    }

    pub fn monitor_enabled(&self) -> bool {
        self.monitor_enabled.load(Ordering::SeqCst)
    }

    pub fn recorder_enabled(&self) -> bool {
        self.recorder_enabled.load(Ordering::SeqCst)
    }

    pub fn destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    fn call(&self, step: Step) -> TaskResult<()> {
        self.log.record(self.room_id, step);
        match self.failures.lock().get(&step) {
            Some(kind) => Err(kind.error(self.room_id)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecordTask for MockTask {
    fn room_id(&self) -> RoomId {
        self.room_id
    }

    fn ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn setup(&self) -> TaskResult<()> {
        let gate = self.setup_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.call(Step::Setup)?;
        self.set_ready(true);
        Ok(())
    }

    async fn destroy(&self) -> TaskResult<()> {
        self.call(Step::Destroy)?;
        self.destroyed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn enable_monitor(&self) -> TaskResult<()> {
        self.call(Step::EnableMonitor)?;
        self.monitor_enabled.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disable_monitor(&self) -> TaskResult<()> {
        self.call(Step::DisableMonitor)?;
        self.monitor_enabled.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn enable_recorder(&self) -> TaskResult<()> {
        self.call(Step::EnableRecorder)?;
        self.recorder_enabled.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disable_recorder(&self, force: bool) -> TaskResult<()> {
        self.call(Step::DisableRecorder { force })?;
        self.recorder_enabled.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn update_info(&self) -> TaskResult<()> {
        self.call(Step::UpdateInfo)
    }

    async fn update_session(&self) -> TaskResult<()> {
        self.call(Step::UpdateSession)
    }

    fn can_cut_stream(&self) -> bool {
        self.recorder_enabled()
    }

    fn cut_stream(&self) -> bool {
        self.call(Step::CutStream).is_ok() && self.recorder_enabled()
    }

    fn update(&self, config: TaskConfig) {
        self.log.record(self.room_id, Step::Update);
        let mut current = self.config.lock();
        match config {
            TaskConfig::Header(settings) => current.header = settings,
            TaskConfig::Output(settings) => current.output = settings,
            TaskConfig::Danmaku(settings) => current.danmaku = settings,
            TaskConfig::Recorder(settings) => current.recorder = settings,
            TaskConfig::Postprocessing(settings) => current.postprocessing = settings,
        }
    }

    fn header(&self) -> HeaderSettings {
        self.config.lock().header.clone()
    }

    fn output(&self) -> OutputSettings {
        self.config.lock().output.clone()
    }

    fn danmaku(&self) -> DanmakuSettings {
        self.config.lock().danmaku.clone()
    }

    fn recorder(&self) -> RecorderSettings {
        self.config.lock().recorder.clone()
    }

    fn postprocessing(&self) -> PostprocessingSettings {
        self.config.lock().postprocessing.clone()
    }

    fn user_info(&self) -> UserInfo {
        UserInfo {
            uid: self.room_id * 10,
            name: format!("streamer-{}", self.room_id),
            ..Default::default()
        }
    }

    fn room_info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            title: format!("room {}", self.room_id),
            ..Default::default()
        }
    }

    fn status(&self) -> TaskStatus {
        let running_status = if self.recorder_enabled() {
            RunningStatus::Recording
        } else if self.monitor_enabled() {
            RunningStatus::Waiting
        } else {
            RunningStatus::Stopped
        };
        TaskStatus {
            monitor_enabled: self.monitor_enabled(),
            recorder_enabled: self.recorder_enabled(),
            running_status,
            ..Default::default()
        }
    }

    fn metadata(&self) -> Option<MetaData> {
        self.recorder_enabled().then(|| MetaData {
            has_audio: true,
            has_video: true,
            width: 1920,
            height: 1080,
            ..Default::default()
        })
    }

    fn stream_profile(&self) -> StreamProfile {
        let mut profile = StreamProfile::new();
        profile.insert("format_name".into(), "flv".into());
        profile
    }

    fn video_file_details(&self) -> Vec<VideoFileDetail> {
        let out_dir = self.config.lock().output.out_dir.clone();
        vec![
            VideoFileDetail {
                path: out_dir.join(format!("{}-1.flv", self.room_id)),
                size: 1024,
                status: VideoFileStatus::Completed,
            },
            VideoFileDetail {
                path: out_dir.join(format!("{}-2.flv", self.room_id)),
                size: 512,
                status: VideoFileStatus::Recording,
            },
        ]
    }

    fn danmaku_file_details(&self) -> Vec<DanmakuFileDetail> {
        let out_dir = self.config.lock().output.out_dir.clone();
        vec![DanmakuFileDetail {
            path: out_dir.join(format!("{}-1.xml", self.room_id)),
            size: 64,
            status: DanmakuFileStatus::Completed,
        }]
    }
}

struct SetupFailure {
    kind: FailureKind,
    /// `None` fails every attempt
    remaining: Option<u32>,
}

/// Produces mock tasks and keeps them around for inspection
#[derive(Default)]
pub struct MockFactory {
    log: CallLog,
    created: Mutex<Vec<Arc<MockTask>>>,
    setup_failures: Mutex<HashMap<RoomId, SetupFailure>>,
    step_failures: Mutex<HashMap<RoomId, Vec<(Step, FailureKind)>>>,
    setup_gates: Mutex<HashMap<RoomId, Arc<Notify>>>,
}

impl MockFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }

    /// Fail the setup of the next `times` tasks for `room_id` (every task if `None`)
    pub fn fail_setup(&self, room_id: RoomId, kind: FailureKind, times: Option<u32>) {
        self.setup_failures.lock().insert(
            room_id,
            SetupFailure {
                kind,
                remaining: times,
            },
        );
    }

    /// Fail `step` on every task created for `room_id`
    pub fn fail_step(&self, room_id: RoomId, step: Step, kind: FailureKind) {
        self.step_failures
            .lock()
            .entry(room_id)
            .or_default()
            .push((step, kind));
    }

    /// Hold the setup of the next task for `room_id` until the returned gate is notified
    pub fn gate_setup(&self, room_id: RoomId) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.setup_gates.lock().insert(room_id, gate.clone());
        gate
    }

    /// Number of tasks created for `room_id`
    pub fn created(&self, room_id: RoomId) -> usize {
        self.created
            .lock()
            .iter()
            .filter(|task| task.room_id == room_id)
            .count()
    }

    /// Every task created for `room_id`, oldest first
    pub fn tasks(&self, room_id: RoomId) -> Vec<Arc<MockTask>> {
        self.created
            .lock()
            .iter()
            .filter(|task| task.room_id == room_id)
            .cloned()
            .collect()
    }

    /// Most recent task created for `room_id`
    pub fn task(&self, room_id: RoomId) -> Option<Arc<MockTask>> {
        self.created
            .lock()
            .iter()
            .rev()
            .find(|task| task.room_id == room_id)
            .cloned()
    }
}

impl TaskFactory for MockFactory {
    fn create_task(&self, room_id: RoomId) -> Arc<dyn RecordTask> {
        let task = Arc::new(MockTask::new(room_id, self.log.clone()));

        if let Some(failure) = self.setup_failures.lock().get_mut(&room_id) {
            match failure.remaining {
                Some(0) => {}
                Some(ref mut n) => {
                    *n -= 1;
                    task.fail(Step::Setup, failure.kind);
                }
                None => task.fail(Step::Setup, failure.kind),
            }
        }
        if let Some(failures) = self.step_failures.lock().get(&room_id) {
            for &(step, kind) in failures {
                task.fail(step, kind);
            }
        }
        if let Some(gate) = self.setup_gates.lock().remove(&room_id) {
            *task.setup_gate.lock() = Some(gate);
        }

        self.created.lock().push(task.clone());
        task
    }
}

/// Task settings with default bundles
pub fn task_settings(room_id: RoomId, enable_monitor: bool, enable_recorder: bool) -> TaskSettings {
    TaskSettings {
        enable_monitor,
        enable_recorder,
        ..TaskSettings::new(room_id)
    }
}

/// Manager backed by `factory` and an empty settings source
pub fn manager(factory: &Arc<MockFactory>) -> RecordTaskManager {
    RecordTaskManager::new(factory.clone(), Arc::new(StaticSettingsSource::default()))
}

/// Manager with ready tasks for `rooms`, monitor on and recorder off
pub async fn manager_with_tasks(factory: &Arc<MockFactory>, rooms: &[RoomId]) -> RecordTaskManager {
    let manager = manager(factory);
    for &room_id in rooms {
        manager
            .add_task(&task_settings(room_id, true, false))
            .await
            .unwrap();
    }
    factory.log().clear();
    manager
}
