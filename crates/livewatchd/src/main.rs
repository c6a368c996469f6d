// # livewatchd - Broadcast Notification Daemon
//
// This daemon is a THIN integration layer:
// - No status, transition or session logic lives here (see livewatch-core)
// - Configuration is via environment variables ONLY
//
// The livewatchd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing the runtime and logging
// 3. Building the status source, push gateway and stores
// 4. Running the scheduler and the HTTP surface until SIGTERM/SIGINT
//
// ## Configuration
//
// ### Status Source
// - `LIVEWATCH_CHANNEL_ID`: Channel to watch (required)
// - `LIVEWATCH_API_BASE`: Status API base URL
// - `LIVEWATCH_POLL_INTERVAL_SECS`: Scheduler interval in seconds (10-3600, default 60)
//
// ### Push Gateway
// - `LIVEWATCH_PUSH_MODE`: live, dry-run
// - `LIVEWATCH_FCM_CREDENTIALS`: Service-account JSON key (required when live)
//
// ### Stores
// - `LIVEWATCH_SESSION_STORE_TYPE`: file, memory
// - `LIVEWATCH_SESSION_STORE_PATH`: Path to the session file (for file store)
// - `LIVEWATCH_TOKEN_STORE_PATH`: Device token file (in memory when unset)
// - `LIVEWATCH_SCHEDULES_PATH`: Broadcast schedule JSON (empty when unset)
//
// ### Daemon
// - `LIVEWATCH_BIND_ADDRESS`: HTTP listen address (default 0.0.0.0:8080)
// - `LIVEWATCH_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export LIVEWATCH_CHANNEL_ID=a1b2c3d4e5
// export LIVEWATCH_FCM_CREDENTIALS=/etc/livewatch/service-account.json
// export LIVEWATCH_SESSION_STORE_PATH=/var/lib/livewatch/sessions.json
//
// livewatchd
// ```

use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use livewatch_core::config::SessionStoreConfig;
use livewatch_core::{
    DeviceTokenStore, EmptyScheduleCatalog, FileScheduleCatalog, FileSessionStore, FileTokenStore,
    MemorySessionStore, MemoryTokenStore, PushGateway, ScheduleCatalog, Scheduler,
    SchedulerEvent, SessionRecorder, SessionStore, StatusPoller, TransitionCell,
    TransitionDetector,
};
use livewatch_push_fcm::FcmPushGateway;
use livewatch_source_chzzk::ChzzkStatusSource;
use livewatchd::api::{self, AppState};
use livewatchd::config::Config;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// How long the scheduler gets to stop after the HTTP surface has drained
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum LivewatchExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<LivewatchExitCode> for ExitCode {
    fn from(code: LivewatchExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return LivewatchExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return LivewatchExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level())
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return LivewatchExitCode::ConfigError.into();
    }

    info!("Starting livewatchd daemon");
    info!("Watching channel {}", config.channel_id);

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return LivewatchExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let daemon = match Daemon::build(&config).await {
            Ok(daemon) => daemon,
            Err(e) => {
                error!("Startup error: {}", e);
                return LivewatchExitCode::ConfigError;
            }
        };

        if let Err(e) = daemon.run().await {
            error!("Daemon error: {}", e);
            LivewatchExitCode::RuntimeError
        } else {
            LivewatchExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Fully wired components, ready to run
struct Daemon {
    listener: tokio::net::TcpListener,
    state: AppState,
    scheduler: Scheduler,
    events: mpsc::Receiver<SchedulerEvent>,
}

impl Daemon {
    /// Build every component; any failure here is a startup error
    async fn build(config: &Config) -> Result<Self> {
        let core = config.to_livewatch_config();
        core.validate()?;

        let source = Arc::new(ChzzkStatusSource::from_config(&core.source)?);

        let gateway: Arc<dyn PushGateway> =
            Arc::new(FcmPushGateway::from_config(&core.push).await?);
        if config.is_dry_run() {
            warn!("Push mode is dry-run: notifications will be logged, not sent");
        }

        let session_store: Arc<dyn SessionStore> = match &core.session_store {
            SessionStoreConfig::File { path } => {
                info!("Using file session store at {}", path);
                Arc::new(FileSessionStore::new(path).await?)
            }
            SessionStoreConfig::Memory => {
                warn!("Using in-memory session store: sessions are forgotten on restart");
                Arc::new(MemorySessionStore::new())
            }
        };

        let tokens: Arc<dyn DeviceTokenStore> = match &config.token_store_path {
            Some(path) => Arc::new(FileTokenStore::new(path).await?),
            None => Arc::new(MemoryTokenStore::new()),
        };

        let schedules: Arc<dyn ScheduleCatalog> = match &config.schedules_path {
            Some(path) => Arc::new(FileScheduleCatalog::new(path)),
            None => Arc::new(EmptyScheduleCatalog),
        };

        let detector = TransitionDetector::new(
            Arc::new(TransitionCell::new()),
            gateway.clone(),
            core.notifications.clone(),
        );
        let poller = Arc::new(StatusPoller::new(source.clone(), detector));

        let (scheduler, events) = Scheduler::new(
            poller.clone(),
            SessionRecorder::new(session_store),
            gateway,
            core.notifications.clone(),
            &core.scheduler,
        )?;

        let addr = config.bind_addr()?;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))?;

        Ok(Self {
            listener,
            state: AppState {
                poller,
                replays: source,
                schedules,
                tokens,
            },
            scheduler,
            events,
        })
    }

    /// Serve until a shutdown signal, then stop the scheduler
    async fn run(self) -> Result<()> {
        let Daemon {
            listener,
            state,
            scheduler,
            mut events,
        } = self;

        let shutdown = shutdown_signal()?;

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                debug!("Scheduler event: {:?}", event);
            }
        });

        let (stop_tx, stop_rx) = oneshot::channel();
        let scheduler_task =
            tokio::spawn(async move { scheduler.run_with_shutdown(stop_rx).await });

        info!("HTTP surface listening on http://{}", listener.local_addr()?);

        axum::serve(listener, api::build_router(state))
            .with_graceful_shutdown(async move {
                let signal = shutdown.await;
                info!("Received shutdown signal: {}", signal);
            })
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

        info!("Shutting down daemon");
        let _ = stop_tx.send(());

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, scheduler_task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(e)) => anyhow::bail!("Scheduler task failed: {}", e),
            Err(_) => anyhow::bail!("Shutdown timeout after {:?}", SHUTDOWN_TIMEOUT),
        }

        Ok(())
    }
}

/// Resolves with the name of the first shutdown signal (SIGTERM, SIGINT)
///
/// Handlers are installed before this returns, so a setup failure is
/// reported at startup rather than swallowed later.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = &'static str>> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    })
}

/// Resolves on CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = &'static str>> {
    Ok(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to wait for CTRL-C: {}", e);
        }
        "SIGINT"
    })
}
