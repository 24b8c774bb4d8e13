// src/file.rs

use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

/// Create `dir` (and parents) unless it already exists as a directory.
pub fn ensure_directory(dir: &Path) -> io::Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("path exists but is not a directory: {}", dir.display()),
        ));
    }
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Ensure the parent dir of a file path exists.
pub fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_directory(parent),
        _ => Ok(()),
    }
}

/// Sibling temp path used while replacing `dest`: `dir/.name.tmp`.
pub fn temp_sibling(dest: &Path) -> PathBuf {
    let file_name = dest
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("store");
    dest.parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!(".{file_name}.tmp"))
}

/// Replace `dest` with `contents` in one step: write and sync a sibling temp
/// file, then rename it over the target. Readers see the old file or the new
/// one, never a truncated mix.
pub fn write_atomic(dest: &Path, contents: &[u8]) -> io::Result<()> {
    ensure_parent(dest)?;
    let tmp = temp_sibling(dest);
    let written = (|| {
        let mut out = BufWriter::new(File::create(&tmp)?);
        out.write_all(contents)?;
        out.flush()?;
        out.get_ref().sync_all()
    })();
    if let Err(e) = written.and_then(|_| fs::rename(&tmp, dest)) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

/// Copy `path` next to itself with `suffix` appended to the file name.
/// Returns the backup path.
pub fn backup_copy(path: &Path, suffix: &str) -> io::Result<PathBuf> {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    let backup = path.with_file_name(name);
    fs::copy(path, &backup)?;
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_replaces_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested").join("mandats.json");
        write_atomic(&dest, b"[1]").unwrap();
        write_atomic(&dest, b"[1,2]").unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "[1,2]");
        assert!(!temp_sibling(&dest).exists());
    }

    #[test]
    fn write_atomic_into_a_file_parent_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        assert!(write_atomic(&blocker.join("mandats.json"), b"[]").is_err());
    }

    #[test]
    fn backup_copy_appends_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mandats.json");
        fs::write(&path, "{oops").unwrap();
        let backup = backup_copy(&path, ".corrupt-1").unwrap();
        assert_eq!(backup.file_name().unwrap(), "mandats.json.corrupt-1");
        assert_eq!(fs::read_to_string(backup).unwrap(), "{oops");
    }
}
