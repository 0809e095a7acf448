//! The sampling loop and its start/stop front-end.
//!
//! One background task repeats wait-then-capture-then-write cycles until
//! cancelled. A cycle that fails is logged and the loop moves on; nothing
//! from here ever propagates into the host process.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::SamplerConfig;
use crate::dump::write_dump;
use crate::inspect::{default_inspector, ThreadInspector};
use crate::render::render_snapshot;

static SAMPLER_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(1)
        .thread_name("thread-dump-sampler")
        .build()
        .unwrap()
});

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("sampler already running")]
    AlreadyRunning,
    #[error("failed to stop sampler: {0}")]
    Stop(String),
}

/// Why a single capture cycle failed. Terminal to that cycle only.
#[derive(Error, Debug)]
pub enum DumpError {
    #[error("thread enumeration failed: {0}")]
    Inspect(#[source] anyhow::Error),
    #[error("dump write failed: {0}")]
    Write(#[from] std::io::Error),
}

/// Why the loop returned. Cancellation is a deliberate outcome here, not a
/// swallowed error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No interval configured; the loop never started a cycle.
    Disabled,
    /// Shutdown was signaled.
    Cancelled,
    /// The configured iteration bound was exhausted.
    Completed,
}

/// Run capture cycles at the configured cadence until `shutdown` fires.
///
/// Each wait is measured from the end of the previous cycle, so the schedule
/// drifts by the capture cost per tick; that is fine at diagnostic rates.
/// Shutdown interrupts an in-progress wait immediately and is re-checked
/// before every cycle, so a signal that lands during capture or write lets
/// the in-flight dump finish but starts no new cycle.
pub async fn sample_loop(
    config: SamplerConfig,
    inspector: Arc<dyn ThreadInspector + Send + Sync>,
    mut shutdown: watch::Receiver<bool>,
) -> StopReason {
    let interval = match config.interval() {
        Some(interval) => interval,
        None => return StopReason::Disabled,
    };

    let mut remaining = config.iterations();
    loop {
        if let Some(left) = remaining.as_mut() {
            if *left == 0 {
                return StopReason::Completed;
            }
            *left -= 1;
        }

        tokio::select! {
            // a closed channel means the worker went away: stop as well
            _ = shutdown.changed() => return StopReason::Cancelled,
            _ = tokio::time::sleep(interval) => {}
        }

        log::info!("Doing thread dump");
        match capture_once(&config, inspector.as_ref()) {
            Ok(path) => log::debug!("thread dump written to {}", path.display()),
            Err(err) => log::error!("thread dump failed: {:?}", err),
        }
    }
}

/// One capture: enumerate, render, write. Returns the written path.
pub fn capture_once(
    config: &SamplerConfig,
    inspector: &dyn ThreadInspector,
) -> Result<PathBuf, DumpError> {
    let records = inspector.snapshot_all().map_err(DumpError::Inspect)?;
    let dump = render_snapshot(&records);
    let path = write_dump(config.dump_dir(), &dump)?;
    Ok(path)
}

/// Process-wide sampler front-end.
///
/// Owns the dedicated background runtime the loop runs on, so the sampler
/// never competes with application executors and never keeps the process
/// alive on its own.
pub struct ThreadDumpWorker {
    running: AtomicBool,
    shutdown: Mutex<Option<watch::Sender<bool>>>,
    handle: Mutex<Option<JoinHandle<StopReason>>>,
}

impl Default for ThreadDumpWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadDumpWorker {
    pub fn instance() -> &'static Self {
        static INSTANCE: Lazy<ThreadDumpWorker> = Lazy::new(ThreadDumpWorker::new);
        &INSTANCE
    }

    pub fn new() -> Self {
        ThreadDumpWorker {
            running: AtomicBool::new(false),
            shutdown: Mutex::new(None),
            handle: Mutex::new(None),
        }
    }

    /// Start sampling with the platform inspector. A disabled config is a
    /// successful no-op.
    pub fn start(&self, config: SamplerConfig) -> Result<(), WorkerError> {
        self.start_with_inspector(config, default_inspector())
    }

    pub fn start_with_inspector(
        &self,
        config: SamplerConfig,
        inspector: Arc<dyn ThreadInspector + Send + Sync>,
    ) -> Result<(), WorkerError> {
        if !config.enabled() {
            log::debug!("thread dump sampler disabled");
            return Ok(());
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(WorkerError::AlreadyRunning);
        }

        let (tx, rx) = watch::channel(false);
        let handle = SAMPLER_RUNTIME.spawn(sample_loop(config, inspector, rx));
        *self.shutdown.lock().unwrap() = Some(tx);
        *self.handle.lock().unwrap() = Some(handle);
        Ok(())
    }

    /// Signal cancellation and wait for the loop to exit. Returns the loop's
    /// stop reason, or `None` if nothing was running. Must not be called
    /// from async context.
    pub fn stop(&self) -> Result<Option<StopReason>, WorkerError> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }

        if let Some(tx) = self.shutdown.lock().unwrap().take() {
            let _ = tx.send(true);
        }
        if let Some(handle) = self.handle.lock().unwrap().take() {
            let reason = SAMPLER_RUNTIME
                .block_on(handle)
                .map_err(|err| WorkerError::Stop(err.to_string()))?;
            return Ok(Some(reason));
        }
        Ok(None)
    }
}
