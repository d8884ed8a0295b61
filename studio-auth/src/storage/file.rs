//! File backed storage area

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::{Error, StorageArea};

/// Storage area kept in a single JSON file
///
/// The file holds an object mapping keys to their stored text. Missing file is an empty area.
/// Every write rewrites the whole file through a temporary file renamed into place, so readers
/// never see a partially written object. A file that cannot be parsed is reported on reads and
/// replaced on the next write.
#[derive(Debug)]
pub struct FileArea {
    path: PathBuf,
    /// Serializes read-modify-write cycles within the process
    lock: Mutex<()>,
}

impl FileArea {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, Error> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    /// Loads entries to be modified, starting over if the file is unreadable
    ///
    /// The flag tells whether the file content was discarded and has to be rewritten.
    fn load_for_write(&self) -> Result<(BTreeMap<String, String>, bool), Error> {
        match self.load() {
            Ok(entries) => Ok((entries, false)),
            Err(Error::Serialization(err)) => {
                warn!(path = %self.path.display(), %err, "Storage file is corrupted, replacing it");
                Ok((BTreeMap::new(), true))
            }
            Err(err) => Err(err),
        }
    }

    fn store(&self, entries: &BTreeMap<String, String>) -> Result<(), Error> {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                parent
            }
            None => Path::new("."),
        };

        let content = serde_json::to_string_pretty(entries)?;
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(content.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|err| err.error)?;
        debug!(path = %self.path.display(), keys = entries.len(), "Storage file written");
        Ok(())
    }
}

impl StorageArea for FileArea {
    fn get_raw(&self, key: &str) -> Result<Option<String>, Error> {
        let _guard = self.lock.lock();
        Ok(self.load()?.remove(key))
    }

    fn set_raw(&self, key: &str, value: String) -> Result<(), Error> {
        let _guard = self.lock.lock();
        let (mut entries, _) = self.load_for_write()?;
        entries.insert(key.to_owned(), value);
        self.store(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let _guard = self.lock.lock();
        let (mut entries, replaced) = self.load_for_write()?;
        if entries.remove(key).is_some() || replaced {
            self.store(&entries)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        let _guard = self.lock.lock();
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Scope, Storage};

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let area = FileArea::new(dir.path().join("nothing.json"));

        assert_eq!(area.get_raw("key").unwrap(), None);
        area.remove("key").unwrap();
        area.clear().unwrap();
        assert!(!area.path().exists());
    }

    #[test]
    fn values_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let area = FileArea::new(&path);
        area.set_raw("a", "1".to_owned()).unwrap();
        area.set_raw("b", "\"two\"".to_owned()).unwrap();
        area.remove("a").unwrap();
        drop(area);

        let storage = Storage::new(FileArea::new(&path), FileArea::new(dir.path().join("s")));
        assert_eq!(storage.get::<u32>("a", Scope::Durable), None);
        assert_eq!(
            storage.get::<String>("b", Scope::Durable).as_deref(),
            Some("two")
        );

        storage.clear(Scope::Durable);
        assert!(!path.exists());
    }

    #[test]
    fn corrupted_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "garbage").unwrap();

        let area = FileArea::new(&path);
        assert!(matches!(area.get_raw("key"), Err(Error::Serialization(_))));

        // Through the accessor the failure is just a missing value
        let storage = Storage::new(area, FileArea::new(dir.path().join("s")));
        assert_eq!(storage.get::<u32>("key", Scope::Durable), None);
    }

    #[test]
    fn corrupted_file_is_replaced_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{\"auth_tok").unwrap();

        let area = FileArea::new(&path);
        area.set_raw("auth_token", "\"abc\"".to_owned()).unwrap();
        assert_eq!(area.get_raw("auth_token").unwrap().as_deref(), Some("\"abc\""));

        let content = fs::read_to_string(&path).unwrap();
        let entries: BTreeMap<String, String> = serde_json::from_str(&content).unwrap();
        assert_eq!(entries.len(), 1);

        fs::write(&path, "garbage").unwrap();
        area.remove("auth_token").unwrap();
        assert_eq!(area.get_raw("auth_token").unwrap(), None);
    }

    #[test]
    fn writes_leave_no_temporary_files() {
        let dir = tempfile::tempdir().unwrap();
        let area = FileArea::new(dir.path().join("state.json"));
        area.set_raw("a", "1".to_owned()).unwrap();
        area.set_raw("b", "2".to_owned()).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, ["state.json"]);
    }
}
