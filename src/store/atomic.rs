//! File replacement for node records.
//!
//! Atomic mode follows write, fsync, rename: the bytes go to a temporary file in the
//! target directory which is then persisted over the target, so the target is either the
//! old record or the new one. Direct mode writes the target in place for filesystems
//! where rename-over is not allowed.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

pub fn write_file(path: &Path, bytes: &[u8], atomic: bool) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    if !atomic {
        return fs::write(path, bytes);
    }

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
