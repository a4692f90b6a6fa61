use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::{KeyValueStorage, StorageError};

const STORAGE_FILE_VERSION: u32 = 1;
const STORAGE_FILE_NAME: &str = "session.toml";

/// Configuration for file-backed storage.
#[derive(Debug, Clone)]
pub struct FileStorageConfig {
    pub base_dir: PathBuf,
}

impl FileStorageConfig {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn default_dir() -> PathBuf {
        default_lms_dir()
    }
}

/// File-backed storage keeping every key in a single TOML file.
///
/// Writes go through a temp file and a rename, so a crash never leaves a
/// half-written session file behind. A file that cannot be parsed reads as
/// an error but is replaced wholesale by the next write.
///
/// # Example
/// ```no_run
/// use lms_client::storage::{FileStorage, FileStorageConfig, KeyValueStorage};
///
/// let storage = FileStorage::new(FileStorageConfig::new("/tmp/lms".into()));
/// storage.set("access_token", "abc")?;
/// assert_eq!(storage.get("access_token")?.as_deref(), Some("abc"));
/// # Ok::<(), lms_client::storage::StorageError>(())
/// ```
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(config: FileStorageConfig) -> Self {
        Self {
            path: config.base_dir.join(STORAGE_FILE_NAME),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(StorageError::Io(err)),
        };
        let file: StorageFile = toml::from_str(&raw)?;
        if file.version != STORAGE_FILE_VERSION {
            return Err(StorageError::Serialization(format!(
                "unsupported session file version {} at {}",
                file.version,
                self.path.display()
            )));
        }
        Ok(file.entries)
    }

    fn update<F>(&self, mutate: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StorageError::Unavailable("file storage lock poisoned".to_string()))?;
        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(StorageError::Serialization(reason)) => {
                tracing::warn!(
                    path = %self.path.display(),
                    reason = %reason,
                    "unreadable session file; starting from empty"
                );
                BTreeMap::new()
            }
            Err(error) => return Err(error),
        };
        if !mutate(&mut entries) {
            return Ok(());
        }
        let file = StorageFile {
            version: STORAGE_FILE_VERSION,
            saved_at: Utc::now(),
            entries,
        };
        let serialized = toml::to_string(&file)?;
        atomic_write(&self.path, serialized.as_bytes())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|entries| entries.remove(key).is_some())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StorageFile {
    version: u32,
    saved_at: DateTime<Utc>,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

fn default_lms_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".lms"))
        .unwrap_or_else(|| PathBuf::from(".lms"))
}

/// Write `data` next to `path` and rename it into place.
///
/// `NamedTempFile` is created with owner-only permissions on unix, so the
/// session file never becomes readable by other users.
fn atomic_write(path: &Path, data: &[u8]) -> Result<(), StorageError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| StorageError::Io(err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn temp_storage() -> (TempDir, FileStorage) {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(FileStorageConfig::new(dir.path().to_path_buf()));
        (dir, storage)
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let (_dir, storage) = temp_storage();
        assert_eq!(storage.get("access_token").unwrap(), None);
    }

    #[test]
    fn values_survive_a_new_instance() {
        let (dir, storage) = temp_storage();
        storage.set("access_token", "access").unwrap();
        storage.set("csrf_token", "csrf").unwrap();

        let reopened = FileStorage::new(FileStorageConfig::new(dir.path().to_path_buf()));
        assert_eq!(reopened.get("access_token").unwrap().as_deref(), Some("access"));
        assert_eq!(reopened.get("csrf_token").unwrap().as_deref(), Some("csrf"));
    }

    #[test]
    fn remove_missing_key_is_ok() {
        let (_dir, storage) = temp_storage();
        storage.remove("user").unwrap();
        storage.set("user", "{}").unwrap();
        storage.remove("user").unwrap();
        storage.remove("user").unwrap();
        assert_eq!(storage.get("user").unwrap(), None);
    }

    #[test]
    fn corrupt_file_is_overwritten_by_next_write() {
        let (_dir, storage) = temp_storage();
        fs::write(storage.path(), "garbage = [").unwrap();
        assert!(matches!(
            storage.get("access_token"),
            Err(StorageError::Serialization(_))
        ));

        storage.set("access_token", "fresh").unwrap();
        assert_eq!(storage.get("access_token").unwrap().as_deref(), Some("fresh"));

        fs::write(storage.path(), "garbage = [").unwrap();
        storage.remove("access_token").unwrap();
        assert_eq!(storage.get("access_token").unwrap(), None);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let (_dir, storage) = temp_storage();
        fs::write(
            storage.path(),
            "version = 9\nsaved_at = \"2024-01-01T00:00:00Z\"\n",
        )
        .unwrap();
        assert!(matches!(
            storage.get("access_token"),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn unknown_version_is_replaced_on_write() {
        let (_dir, storage) = temp_storage();
        fs::write(
            storage.path(),
            "version = 9\nsaved_at = \"2024-01-01T00:00:00Z\"\n",
        )
        .unwrap();

        storage.set("csrf_token", "csrf").unwrap();
        assert_eq!(storage.get("csrf_token").unwrap().as_deref(), Some("csrf"));
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_private() {
        let (_dir, storage) = temp_storage();
        storage.set("access_token", "access").unwrap();
        let mode = fs::metadata(storage.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
