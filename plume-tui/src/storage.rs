use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// Keys used for the persisted session. Each key is written independently.
pub mod keys {
    pub const USER: &str = "user";
    pub const ACCESS_TOKEN: &str = "accessToken";
    pub const REFRESH_TOKEN: &str = "refreshToken";
    pub const USERNAME: &str = "username";

    pub const ALL: [&str; 4] = [USER, ACCESS_TOKEN, REFRESH_TOKEN, USERNAME];
}

/// Durable key/value storage for session state
pub trait StorageAdapter: Send + Sync {
    /// Read a value, `None` if the key is absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// File-backed storage: one file per key inside a private directory.
///
/// Each write goes to its own temporary file that is renamed into place, so
/// a single key is never half-written, even with concurrent writers.
/// Writes across keys are independent.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Storage rooted at `~/.plume/storage`
    pub fn new() -> Result<Self> {
        let home_dir = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(Self::with_dir(home_dir.join(".plume").join("storage")))
    }

    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl StorageAdapter for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read storage key '{}'", key))?;

        if content.is_empty() {
            log::warn!("Storage key '{}' is empty, treating as absent", key);
            return Ok(None);
        }

        Ok(Some(content))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).context("Failed to create storage directory")?;

        let path = self.key_path(key);

        // Unique temp name per write; concurrent writers to one key must not share it
        let mut file = NamedTempFile::new_in(&self.dir)
            .context("Failed to create temporary storage file")?;
        file.write_all(value.as_bytes())
            .context("Failed to write storage value")?;
        file.as_file()
            .sync_all()
            .context("Failed to sync storage file to disk")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(file.path(), fs::Permissions::from_mode(0o600))
                .context("Failed to set storage file permissions")?;
        }

        file.persist(&path)
            .map_err(|e| e.error)
            .context("Failed to rename temporary storage file")?;

        log::debug!("Stored key '{}' in {}", key, self.dir.display());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove storage key '{}'", key))?;
            log::debug!("Removed key '{}'", key);
        }
        Ok(())
    }
}

/// In-memory storage, used for tests and `--ephemeral` runs
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        match self.values.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl StorageAdapter for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::with_dir(temp_dir.path().join("storage"));

        storage.set(keys::ACCESS_TOKEN, "token-abc").unwrap();
        assert_eq!(
            storage.get(keys::ACCESS_TOKEN).unwrap(),
            Some("token-abc".to_string())
        );
    }

    #[test]
    fn test_get_missing_key() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::with_dir(temp_dir.path());

        assert_eq!(storage.get(keys::USER).unwrap(), None);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::with_dir(temp_dir.path());

        storage.set(keys::USERNAME, "alice").unwrap();
        storage.remove(keys::USERNAME).unwrap();
        storage.remove(keys::USERNAME).unwrap();
        assert_eq!(storage.get(keys::USERNAME).unwrap(), None);
    }

    #[test]
    fn test_empty_file_is_absent() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::with_dir(temp_dir.path());

        fs::write(temp_dir.path().join(keys::REFRESH_TOKEN), "").unwrap();
        assert_eq!(storage.get(keys::REFRESH_TOKEN).unwrap(), None);
    }

    #[test]
    fn test_overwrite_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::with_dir(temp_dir.path());

        storage.set(keys::ACCESS_TOKEN, "first").unwrap();
        storage.set(keys::ACCESS_TOKEN, "second").unwrap();

        assert_eq!(
            storage.get(keys::ACCESS_TOKEN).unwrap(),
            Some("second".to_string())
        );
        let entries = fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_concurrent_writes_to_one_key() {
        let temp_dir = TempDir::new().unwrap();
        let storage = std::sync::Arc::new(FileStorage::with_dir(temp_dir.path()));

        let handles: Vec<_> = (0..4)
            .map(|thread| {
                let storage = storage.clone();
                std::thread::spawn(move || {
                    for round in 0..50 {
                        storage
                            .set(keys::ACCESS_TOKEN, &format!("token-{}-{}", thread, round))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stored = storage.get(keys::ACCESS_TOKEN).unwrap().unwrap();
        assert!(stored.starts_with("token-") && stored.ends_with("-49"));
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    #[cfg(unix)]
    fn test_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::with_dir(temp_dir.path());
        storage.set(keys::REFRESH_TOKEN, "secret").unwrap();

        let metadata = fs::metadata(temp_dir.path().join(keys::REFRESH_TOKEN)).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        storage.set(keys::USER, "{}").unwrap();
        assert_eq!(storage.get(keys::USER).unwrap(), Some("{}".to_string()));
        storage.remove(keys::USER).unwrap();
        assert_eq!(storage.get(keys::USER).unwrap(), None);
    }
}
