// # livewatch-core
//
// Core library for watching a live-broadcast status endpoint and notifying
// subscribers once per genuine state transition.
//
// ## Architecture Overview
//
// - **StatusSource**: Trait for fetching the current broadcast status
// - **PushGateway**: Trait for best-effort push delivery to a topic or device
// - **SessionStore**: Trait for durable per-session notification bookkeeping
// - **TransitionDetector**: Single atomic compare-and-update over the last observed state
// - **StatusPoller**: Fetches, normalizes, feeds the detector, returns the status
// - **SessionRecorder**: Restart-safe "start" bookkeeping over a SessionStore
// - **Scheduler**: Periodic poll driving the durable notification path
// - **Catalogs**: Read-only schedule and replay listings, device token registry
//
// ## Notification Paths
//
// 1. **Immediate**: in-memory, lowest latency, not restart-safe (TransitionDetector)
// 2. **Durable**: store-backed, restart-safe, at-least-once (Scheduler + SessionRecorder)
//
// Both paths may fire for the same real-world transition. They are kept
// independent on purpose.

pub mod catalog;
pub mod config;
pub mod error;
pub mod model;
pub mod poller;
pub mod recorder;
pub mod scheduler;
pub mod state;
pub mod traits;
pub mod transition;

// Re-export core types for convenience
pub use catalog::{
    DeviceTokenStore, EmptyScheduleCatalog, FileScheduleCatalog, ReplayCatalog, ReplayEntry,
    ScheduleCatalog, ScheduleEntry,
};
pub use config::{LivewatchConfig, NotificationTemplates, SchedulerConfig, SourceConfig};
pub use error::{Error, Result};
pub use model::{LiveState, LiveStatus, Session};
pub use poller::StatusPoller;
pub use recorder::SessionRecorder;
pub use scheduler::{Scheduler, SchedulerEvent, TickOutcome};
pub use state::{FileSessionStore, FileTokenStore, MemorySessionStore, MemoryTokenStore};
pub use traits::{PushGateway, PushMessage, PushTarget, SessionStore, StatusSource};
pub use transition::{Transition, TransitionCell, TransitionDetector};
