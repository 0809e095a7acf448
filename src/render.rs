//! Text rendering of a captured snapshot.

use crate::inspect::ThreadRecord;

/// Frames beyond this depth are silently dropped from the rendering.
pub const MAX_STACK_DEPTH: usize = 100;

/// Render one thread block per record:
///
/// ```text
/// "worker-3"
///    thread state: WAITING
///         at symbol (location)
///
/// ```
///
/// Blocks are separated by a blank line; the file has no header or footer.
/// Thread order is whatever the inspector yielded.
pub fn render_snapshot(records: &[ThreadRecord]) -> String {
    let mut dump = String::new();
    for record in records {
        dump.push('"');
        dump.push_str(&record.name);
        dump.push_str("\" ");
        dump.push_str("\n   thread state: ");
        dump.push_str(&record.state.to_string());
        for frame in record.frames.iter().take(MAX_STACK_DEPTH) {
            dump.push_str("\n        at ");
            dump.push_str(&frame.to_string());
        }
        dump.push_str("\n\n");
    }
    dump
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::inspect::{StackFrame, ThreadState};

    fn record(name: &str, state: ThreadState, frames: usize) -> ThreadRecord {
        ThreadRecord {
            name: name.to_string(),
            state,
            frames: (0..frames)
                .map(|depth| StackFrame::new(format!("frame_{}", depth)))
                .collect(),
        }
    }

    #[test]
    fn test_empty_snapshot_renders_empty() {
        assert_eq!(render_snapshot(&[]), "");
    }

    #[test]
    fn test_block_per_thread() {
        let records = vec![
            record("T1", ThreadState::Runnable, 2),
            record("T2", ThreadState::Waiting, 1),
        ];
        let dump = render_snapshot(&records);

        assert!(dump.contains("\"T1\" \n   thread state: RUNNABLE"));
        assert!(dump.contains("\"T2\" \n   thread state: WAITING"));
        assert_eq!(dump.matches("thread state:").count(), 2);
        assert_eq!(dump.matches("        at ").count(), 3);
        // every block ends with a separating blank line
        assert!(dump.ends_with("\n\n"));
        assert_eq!(dump.matches("\n\n").count(), 2);
    }

    #[test]
    fn test_frame_location_rendered() {
        let mut one = record("main", ThreadState::Blocked, 0);
        one.frames.push(
            StackFrame::new("stackwatch::dump::write_dump").with_location("src/dump.rs:31"),
        );
        let dump = render_snapshot(&[one]);
        assert!(dump.contains("        at stackwatch::dump::write_dump (src/dump.rs:31)"));
    }

    #[test]
    fn test_deep_stack_truncated() {
        let deep = record("deep", ThreadState::Runnable, 150);
        let dump = render_snapshot(&[deep]);
        assert_eq!(dump.matches("        at ").count(), MAX_STACK_DEPTH);
        assert!(dump.contains("frame_99"));
        assert!(!dump.contains("frame_100"));
    }
}
