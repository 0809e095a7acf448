//! Background thread-dump sampler for long-running worker processes.
//!
//! At a configured interval, a daemon task snapshots every live thread's
//! name, run state and stack trace, and writes the rendering to a uniquely
//! named `thread_dump.txt*` file so that hangs can be diagnosed after the
//! fact without attaching a debugger.

pub mod config;
pub mod dump;
pub mod inspect;
pub mod render;
pub mod sampler;

pub use config::SamplerConfig;
pub use dump::{write_dump, DUMP_BASENAME};
pub use inspect::{default_inspector, StackFrame, ThreadInspector, ThreadRecord, ThreadState};
pub use render::{render_snapshot, MAX_STACK_DEPTH};
pub use sampler::{sample_loop, DumpError, StopReason, ThreadDumpWorker, WorkerError};
