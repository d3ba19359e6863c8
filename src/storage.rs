//! On-disk persistence for the secret store.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use getrandom::fill;

/// Persists the serialized store to a single file.
///
/// Writes are crash-safe: data lands in a randomly named sibling temp file,
/// is synced, and then atomically replaces the target. After a crash either
/// the old or the new store file is present, never a partial write.
#[derive(Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns `true` if the store file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads the whole store file into memory.
    pub fn load(&self) -> Result<Vec<u8>> {
        Ok(fs::read(&self.path)?)
    }

    /// Writes the store file, creating parent directories as needed.
    pub fn save(&self, data: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.tmp_sibling()?;

        // create_new so a concurrent writer cannot share the temp file
        let mut tmp_file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)
            .context("failed to create temporary store file")?;

        tmp_file.write_all(data)?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        if let Err(e) = self.atomic_replace(&tmp_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        // fsync the directory so the rename itself is durable
        if let Some(parent) = self.path.parent() {
            let dir = File::open(parent)?;
            dir.sync_all()?;
        }

        Ok(())
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Unique temp path next to the target, named from random bytes so
    /// concurrent saves never collide.
    fn tmp_sibling(&self) -> Result<PathBuf> {
        let mut buf = [0u8; 8];
        fill(&mut buf)?;

        let file_name = self.path.file_name().unwrap().to_string_lossy();
        let tmp_name = format!("{}.tmp.{}", file_name, hex::encode(buf));

        Ok(self.path.with_file_name(tmp_name))
    }

    /// Atomically replaces the target with the temp file.
    ///
    /// `ReplaceFileW` with `REPLACEFILE_WRITE_THROUGH` keeps the replacement
    /// atomic and persisted on Windows.
    #[cfg(target_os = "windows")]
    fn atomic_replace(&self, tmp_path: &Path) -> Result<()> {
        use std::ffi::OsStr;
        use std::os::windows::ffi::OsStrExt;
        use windows_sys::Win32::Storage::FileSystem::{REPLACEFILE_WRITE_THROUGH, ReplaceFileW};

        fn to_wide(s: &OsStr) -> Vec<u16> {
            s.encode_wide().chain(std::iter::once(0)).collect()
        }

        let target_w = to_wide(self.path.as_os_str());
        let tmp_w = to_wide(tmp_path.as_os_str());

        // SAFETY:
        // - Strings are valid UTF-16 and null-terminated
        // - Pointers remain valid during the call
        // - Windows does not retain the pointers after return
        let result = unsafe {
            ReplaceFileW(
                target_w.as_ptr(),
                tmp_w.as_ptr(),
                std::ptr::null(),
                REPLACEFILE_WRITE_THROUGH,
                std::ptr::null(),
                std::ptr::null(),
            )
        };

        if result == 0 {
            let err = std::io::Error::last_os_error();
            return Err(err).context("atomic replace failed");
        }

        Ok(())
    }

    /// Atomically replaces the target with the temp file.
    ///
    /// On Unix, `rename()` is atomic when both paths share a filesystem; the
    /// temp file is created in the target's directory for that reason.
    #[cfg(not(target_os = "windows"))]
    fn atomic_replace(&self, tmp_path: &Path) -> Result<()> {
        fs::rename(tmp_path, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn load_returns_written_data() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("secrets.json"));

        storage.save(b"{\"secrets\":{}}").unwrap();
        assert_eq!(storage.load().unwrap(), b"{\"secrets\":{}}");
    }

    #[test]
    fn load_fails_if_file_does_not_exist() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("missing.json"));

        assert!(storage.load().is_err());
    }

    #[test]
    fn exists_reflects_file_state() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("secrets.json"));

        assert!(!storage.exists());
        storage.save(b"data").unwrap();
        assert!(storage.exists());
    }

    #[test]
    fn save_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        let storage = Storage::new(path.clone());

        storage.save(b"first").unwrap();
        storage.save(b"second").unwrap();

        assert_eq!(fs::read(path).unwrap(), b"second");
    }

    #[test]
    fn no_temp_artifacts_remain_after_save() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("secrets.json"));

        storage.save(b"data").unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0], "secrets.json");
    }

    #[test]
    fn tmp_sibling_stays_in_target_directory_and_is_unique() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        let storage = Storage::new(path.clone());

        let a = storage.tmp_sibling().unwrap();
        let b = storage.tmp_sibling().unwrap();

        assert_eq!(a.parent(), path.parent());
        assert_ne!(a, path);
        assert_ne!(a, b);
    }

    #[test]
    fn parent_directories_are_created() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("secrets.json");

        let storage = Storage::new(nested.clone());
        storage.save(b"data").unwrap();

        assert!(nested.exists());
    }
}
