//! Temp-then-rename writes
//!
//! Every file a later stage reads is written next to its destination and then
//! renamed over it, so readers never observe a half-written file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::types::Result;

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `content` to `path` atomically, creating parent directories
pub fn write_atomic(path: &Path, content: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let temp = temp_path(path);
    if let Err(e) = fs::write(&temp, content.as_ref()) {
        let _ = fs::remove_file(&temp);
        return Err(e.into());
    }

    if let Err(e) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(e.into());
    }

    Ok(())
}

/// Serialize `value` as pretty JSON (trailing newline) and write it atomically
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut body = serde_json::to_string_pretty(value)?;
    body.push('\n');
    write_atomic(path, body)
}
