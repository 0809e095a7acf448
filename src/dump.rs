//! Collision-free dump-file naming and the write path.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Fixed base name; collisions get an integer suffix (`thread_dump.txt0`,
/// `thread_dump.txt1`, ...).
pub const DUMP_BASENAME: &str = "thread_dump.txt";

/// Create the next free dump file in `dir`.
///
/// Probes `thread_dump.txt`, then `thread_dump.txt0`, `thread_dump.txt1`, ...
/// in order and takes the first unused name. The open is `create_new`, so
/// the probe never clobbers a file that appeared between two checks, even
/// with a second writer in the same directory.
pub fn create_dump_file(dir: &Path) -> std::io::Result<(PathBuf, File)> {
    let mut filename = DUMP_BASENAME.to_string();
    let mut suffix = 0u64;
    loop {
        let path = dir.join(&filename);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                filename = format!("{}{}", DUMP_BASENAME, suffix);
                suffix += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Write `contents` to a freshly named dump file in `dir` as a single write,
/// returning the chosen path.
pub fn write_dump(dir: &Path, contents: &str) -> std::io::Result<PathBuf> {
    let (path, mut file) = create_dump_file(dir)?;
    file.write_all(contents.as_bytes())?;
    Ok(path)
}
