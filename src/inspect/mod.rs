//! Thread-state enumeration.
//!
//! The sampler core only depends on the [`ThreadInspector`] capability, so
//! it can run against deterministic fixtures in tests and against whatever
//! the platform offers in production: procfs on Linux, an in-process
//! backtrace elsewhere.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;

#[cfg(target_os = "linux")]
mod procfs;

#[cfg(target_os = "linux")]
pub use self::procfs::ProcfsInspector;

/// Execution state of a thread at capture time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    New,
    Runnable,
    Blocked,
    Waiting,
    TimedWaiting,
    Terminated,
}

impl fmt::Display for ThreadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ThreadState::New => "NEW",
            ThreadState::Runnable => "RUNNABLE",
            ThreadState::Blocked => "BLOCKED",
            ThreadState::Waiting => "WAITING",
            ThreadState::TimedWaiting => "TIMED_WAITING",
            ThreadState::Terminated => "TERMINATED",
        };
        f.write_str(label)
    }
}

/// One displayable stack frame: a symbol plus its call site when known.
#[derive(Debug, Clone)]
pub struct StackFrame {
    pub symbol: String,
    pub location: Option<String>,
}

impl StackFrame {
    pub fn new(symbol: impl Into<String>) -> Self {
        StackFrame {
            symbol: symbol.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} ({})", self.symbol, location),
            None => f.write_str(&self.symbol),
        }
    }
}

/// Name, state and stack of one live thread at a single capture instant.
#[derive(Debug, Clone)]
pub struct ThreadRecord {
    pub name: String,
    pub state: ThreadState,
    pub frames: Vec<StackFrame>,
}

/// Capability to enumerate every live thread of the current process.
pub trait ThreadInspector {
    fn snapshot_all(&self) -> Result<Vec<ThreadRecord>>;
}

/// The platform inspector used when the caller does not supply one.
pub fn default_inspector() -> Arc<dyn ThreadInspector + Send + Sync> {
    #[cfg(target_os = "linux")]
    {
        Arc::new(ProcfsInspector::new())
    }
    #[cfg(not(target_os = "linux"))]
    {
        Arc::new(BacktraceInspector)
    }
}

/// Fallback inspector reporting only the calling thread, with a full
/// userspace backtrace. The only option on targets without a procfs.
pub struct BacktraceInspector;

impl ThreadInspector for BacktraceInspector {
    fn snapshot_all(&self) -> Result<Vec<ThreadRecord>> {
        let name = std::thread::current()
            .name()
            .unwrap_or("<unnamed>")
            .to_string();
        Ok(vec![ThreadRecord {
            name,
            state: ThreadState::Runnable,
            frames: backtrace_frames(),
        }])
    }
}

/// Capture and symbolize the calling thread's own stack.
pub(crate) fn backtrace_frames() -> Vec<StackFrame> {
    let trace = backtrace::Backtrace::new();
    let mut frames = Vec::new();
    for frame in trace.frames() {
        if frame.symbols().is_empty() {
            frames.push(StackFrame::new(format!("{:p}", frame.ip())));
            continue;
        }
        for symbol in frame.symbols() {
            let name = symbol
                .name()
                .map(|name| name.to_string())
                .unwrap_or_else(|| format!("{:p}", frame.ip()));
            let mut stack_frame = StackFrame::new(name);
            if let (Some(file), Some(line)) = (symbol.filename(), symbol.lineno()) {
                stack_frame = stack_frame.with_location(format!("{}:{}", file.display(), line));
            }
            frames.push(stack_frame);
        }
    }
    frames
}
