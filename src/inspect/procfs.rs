//! procfs-backed inspector: thread names and run states come from
//! `/proc/self/task/*/stat`, stacks from the kernel where readable and from
//! an in-process backtrace for the sampling thread itself.

use anyhow::Result;
use procfs::process::Process;

use super::{backtrace_frames, StackFrame, ThreadInspector, ThreadRecord, ThreadState};

pub struct ProcfsInspector;

impl ProcfsInspector {
    pub fn new() -> Self {
        ProcfsInspector
    }
}

impl Default for ProcfsInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadInspector for ProcfsInspector {
    fn snapshot_all(&self) -> Result<Vec<ThreadRecord>> {
        let process = Process::myself()?;
        let self_tid = rustix::thread::gettid().as_raw_nonzero().get();

        let mut records = Vec::new();
        for task in process.tasks()? {
            // tasks can exit between the readdir and the stat read
            let task = match task {
                Ok(task) => task,
                Err(err) => {
                    log::debug!("skipping vanished task: {}", err);
                    continue;
                }
            };
            let stat = match task.stat() {
                Ok(stat) => stat,
                Err(err) => {
                    log::debug!("skipping task {}: {}", task.tid, err);
                    continue;
                }
            };

            let frames = if task.tid == self_tid {
                backtrace_frames()
            } else {
                kernel_stack(task.pid, task.tid)
            };

            records.push(ThreadRecord {
                name: stat.comm,
                state: state_from_char(stat.state),
                frames,
            });
        }
        Ok(records)
    }
}

/// Map a procfs `stat` state character onto the capture-time state enum.
/// NEW and TIMED_WAITING have no procfs counterpart and only appear from
/// inspectors with richer knowledge.
fn state_from_char(state: char) -> ThreadState {
    match state {
        'R' => ThreadState::Runnable,
        'S' | 'I' => ThreadState::Waiting,
        'D' => ThreadState::Blocked,
        'T' | 't' => ThreadState::Blocked,
        'Z' | 'X' | 'x' => ThreadState::Terminated,
        _ => ThreadState::Runnable,
    }
}

/// Kernel-side stack of another thread. `/proc/<pid>/task/<tid>/stack` needs
/// privileges we usually don't have, so fall back to the single `wchan`
/// symbol, and to no frames at all when even that is unreadable.
fn kernel_stack(pid: i32, tid: i32) -> Vec<StackFrame> {
    let stack_path = format!("/proc/{}/task/{}/stack", pid, tid);
    if let Ok(contents) = std::fs::read_to_string(&stack_path) {
        return contents
            .lines()
            .map(|line| match line.split_once("] ") {
                Some((_, symbol)) => StackFrame::new(symbol.trim()),
                None => StackFrame::new(line.trim()),
            })
            .collect();
    }

    let wchan_path = format!("/proc/{}/task/{}/wchan", pid, tid);
    match std::fs::read_to_string(&wchan_path) {
        Ok(wchan) if !wchan.is_empty() && wchan != "0" => vec![StackFrame::new(wchan)],
        _ => Vec::new(),
    }
}
