//! Best-effort key/value persistence
//!
//! [`Storage`] is an accessor over two storage areas, selected with [`Scope`] on every call. The
//! areas themselves are fallible ([`StorageArea`]), but the accessor never is: every failure is
//! logged and turned into a no-op or a missing value, so callers can treat persistence as an
//! optional side channel.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::error;

mod file;
mod memory;

pub use file::FileArea;
pub use memory::MemoryArea;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Storage I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot (de)serialize stored value: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage is unavailable")]
    Unavailable,
}

/// Storage area selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Survives application restarts
    Durable,
    /// Lives only as long as the running application
    Session,
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Durable => write!(f, "durable"),
            Self::Session => write!(f, "session"),
        }
    }
}

/// Raw text storage backend
pub trait StorageArea: Send + Sync {
    /// Returns the text stored under `key`
    fn get_raw(&self, key: &str) -> Result<Option<String>, Error>;

    /// Stores `value` under `key`, replacing previous value
    fn set_raw(&self, key: &str, value: String) -> Result<(), Error>;

    /// Removes `key`, does nothing if there is no such key
    fn remove(&self, key: &str) -> Result<(), Error>;

    /// Removes every key from the area
    fn clear(&self) -> Result<(), Error>;
}

/// Storage accessor over the durable and the session areas
#[derive(Clone)]
pub struct Storage {
    durable: Arc<dyn StorageArea>,
    session: Arc<dyn StorageArea>,
}

impl Storage {
    pub fn new(durable: impl StorageArea + 'static, session: impl StorageArea + 'static) -> Self {
        Self {
            durable: Arc::new(durable),
            session: Arc::new(session),
        }
    }

    /// Storage keeping both scopes in memory
    pub fn in_memory() -> Self {
        Self::new(MemoryArea::default(), MemoryArea::default())
    }

    fn area(&self, scope: Scope) -> &dyn StorageArea {
        match scope {
            Scope::Durable => self.durable.as_ref(),
            Scope::Session => self.session.as_ref(),
        }
    }

    /// Serializes and stores `value`
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, scope: Scope) {
        let result = serde_json::to_string(value)
            .map_err(Error::from)
            .and_then(|value| self.area(scope).set_raw(key, value));

        if let Err(err) = result {
            error!(key, %scope, %err, "Storage set failed");
        }
    }

    /// Reads and parses the value stored under `key`
    ///
    /// Missing and unreadable values are both reported as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str, scope: Scope) -> Option<T> {
        let result = self.area(scope).get_raw(key).and_then(|value| {
            value
                .map(|value| serde_json::from_str(&value))
                .transpose()
                .map_err(Error::from)
        });

        result.unwrap_or_else(|err| {
            error!(key, %scope, %err, "Storage get failed");
            None
        })
    }

    pub fn remove(&self, key: &str, scope: Scope) {
        if let Err(err) = self.area(scope).remove(key) {
            error!(key, %scope, %err, "Storage remove failed");
        }
    }

    pub fn clear(&self, scope: Scope) {
        if let Err(err) = self.area(scope).clear() {
            error!(%scope, %err, "Storage clear failed");
        }
    }

    /// Checks if anything is stored under `key`, regardless if it is readable
    pub fn contains(&self, key: &str, scope: Scope) -> bool {
        match self.area(scope).get_raw(key) {
            Ok(value) => value.is_some(),
            Err(err) => {
                error!(key, %scope, %err, "Storage lookup failed");
                false
            }
        }
    }
}
