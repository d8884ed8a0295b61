//! In-memory storage area

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{Error, StorageArea};

/// Storage area living as long as the application
///
/// Cloning creates another handle to the same area.
#[derive(Debug, Clone, Default)]
pub struct MemoryArea(Arc<Mutex<HashMap<String, String>>>);

impl MemoryArea {
    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }
}

impl StorageArea for MemoryArea {
    fn get_raw(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.0.lock().get(key).cloned())
    }

    fn set_raw(&self, key: &str, value: String) -> Result<(), Error> {
        self.0.lock().insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        self.0.lock().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        self.0.lock().clear();
        Ok(())
    }
}
