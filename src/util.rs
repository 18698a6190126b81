//! Filesystem helpers shared by the vault, session store and config.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::error::{QuarryError, Result};

/// Largest note Quarry will read into memory (8 MB).
pub const MAX_NOTE_SIZE: u64 = 8 * 1024 * 1024;

/// Read a file, refusing anything larger than `max_size` bytes.
pub fn read_to_string_with_limit(path: &Path, max_size: u64) -> Result<String> {
    let size = fs::metadata(path)
        .map_err(|e| QuarryError::storage(path, e))?
        .len();
    if size > max_size {
        return Err(QuarryError::storage(
            path,
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("file is too large ({} bytes, max {} bytes)", size, max_size),
            ),
        ));
    }

    fs::read_to_string(path).map_err(|e| QuarryError::storage(path, e))
}

/// Write `contents` to `path` via a sibling temp file and a rename.
///
/// Parent directories are created as needed.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| QuarryError::storage(parent, e))?;
        }
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

    {
        let mut file =
            fs::File::create(&temp_path).map_err(|e| QuarryError::storage(&temp_path, e))?;
        file.write_all(contents)
            .map_err(|e| QuarryError::storage(&temp_path, e))?;
        file.sync_all()
            .map_err(|e| QuarryError::storage(&temp_path, e))?;
    }

    fs::rename(&temp_path, path).map_err(|e| QuarryError::storage(path, e))
}

/// Shorten `text` to at most `max_chars` characters, ending in `...` when cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
