//! End-to-end run of the worker against the real platform inspector.

use std::path::{Path, PathBuf};
use std::time::Duration;

use stackwatch::{SamplerConfig, StopReason, ThreadDumpWorker, DUMP_BASENAME};

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("stackwatch-it-{}-{}", tag, std::process::id()));
    if dir.exists() {
        std::fs::remove_dir_all(&dir).unwrap();
    }
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn count_dumps(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter(|entry| {
            entry
                .as_ref()
                .unwrap()
                .file_name()
                .to_string_lossy()
                .starts_with(DUMP_BASENAME)
        })
        .count()
}

#[test]
fn test_samples_live_process() {
    let _ = env_logger::builder().is_test(true).try_init();

    let dir = scratch_dir("live");
    let worker = ThreadDumpWorker::new();
    worker
        .start(SamplerConfig::new(1).with_dump_dir(&dir))
        .unwrap();

    // keep a distinctive thread parked across the capture window
    let parked = std::thread::Builder::new()
        .name("it-parked".to_string())
        .spawn(|| std::thread::sleep(Duration::from_secs(3)))
        .unwrap();

    std::thread::sleep(Duration::from_millis(2200));
    let reason = worker.stop().unwrap();
    assert_eq!(reason, Some(StopReason::Cancelled));

    // two ticks fit in the window; allow scheduling slop around the edges
    let dumps = count_dumps(&dir);
    assert!((1..=3).contains(&dumps), "expected 1..=3 dumps, got {}", dumps);

    let first = std::fs::read_to_string(dir.join(DUMP_BASENAME)).unwrap();
    assert!(first.starts_with('"'));
    assert!(first.contains("thread state: "));
    assert!(first.ends_with("\n\n"));
    #[cfg(target_os = "linux")]
    assert!(first.contains("it-parked"), "dump misses parked thread:\n{}", first);

    parked.join().unwrap();
}

#[test]
fn test_disabled_worker_creates_nothing() {
    let dir = scratch_dir("disabled");
    let worker = ThreadDumpWorker::new();
    worker
        .start(SamplerConfig::disabled().with_dump_dir(&dir))
        .unwrap();

    std::thread::sleep(Duration::from_millis(200));
    assert_eq!(worker.stop().unwrap(), None);
    assert_eq!(count_dumps(&dir), 0);
}
