//! roomrec - keeps live rooms recorded.
//!
//! This library owns the lifecycle of per-room live-stream record tasks:
//! creating them with retries, applying settings, starting and stopping
//! their monitors and recorders, and tearing them down.

pub mod settings;
pub mod task;
pub mod utils;

pub use settings::{Settings, SettingsSource, StaticSettingsSource, TaskSettings};
pub use task::{LoadFailure, RecordTask, RecordTaskManager, RoomId, TaskEvent, TaskFactory};
pub use utils::error::{TaskError, TaskResult};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global log subscriber for the library
///
/// Honors `RUST_LOG`; defaults to debug output for this crate. Calling it
/// again after a subscriber is installed does nothing.
pub fn init_tracing() {
    let installed = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roomrec=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("Starting roomrec v{}", env!("CARGO_PKG_VERSION"));
    }
}
