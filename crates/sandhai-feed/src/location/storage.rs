//! Durable storage for the buyer's location between sessions.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sandhai_core::{Coordinate, LocationSource, UserLocation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::error::StorageError;

/// Key the location record lives under.
pub const SESSION_KEY: &str = "nammaSandhaiLocation";

/// On-disk shape of a [`UserLocation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLocation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: String,
    pub area: String,
    pub source: LocationSource,
}

impl From<&UserLocation> for StoredLocation {
    fn from(location: &UserLocation) -> Self {
        let coordinate = location.coordinate();
        Self {
            latitude: coordinate.map(|c| c.latitude),
            longitude: coordinate.map(|c| c.longitude),
            city: location.city().to_owned(),
            area: location.area().to_owned(),
            source: location.source(),
        }
    }
}

impl StoredLocation {
    /// Rehydrate as a `Cached` location. Manual and default records never carry
    /// a coordinate, even if one was written by hand.
    #[must_use]
    pub fn into_cached(self) -> UserLocation {
        let coordinate = match self.source {
            LocationSource::Manual | LocationSource::Default => None,
            LocationSource::Cached | LocationSource::Detected => {
                Coordinate::from_parts(self.latitude, self.longitude)
            }
        };
        UserLocation::cached(coordinate, self.city, self.area)
    }
}

pub trait LocationPersistence: Send + Sync {
    fn load(&self) -> impl Future<Output = Result<Option<StoredLocation>, StorageError>> + Send;

    fn save(
        &self,
        record: &StoredLocation,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn clear(&self) -> impl Future<Output = Result<(), StorageError>> + Send;
}

impl<T: LocationPersistence + ?Sized> LocationPersistence for Arc<T> {
    async fn load(&self) -> Result<Option<StoredLocation>, StorageError> {
        (**self).load().await
    }

    async fn save(&self, record: &StoredLocation) -> Result<(), StorageError> {
        (**self).save(record).await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        (**self).clear().await
    }
}

/// A small JSON key/value file; the location lives under [`SESSION_KEY`].
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    async fn read_map(&self) -> Result<Map<String, Value>, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(Map::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// Write via a sibling temp file and rename so readers never see half a record.
    async fn write_map(&self, map: &Map<String, Value>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        let body = serde_json::to_vec_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))
    }
}

impl LocationPersistence for JsonFilePersistence {
    async fn load(&self) -> Result<Option<StoredLocation>, StorageError> {
        let mut map = self.read_map().await?;
        match map.remove(SESSION_KEY) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, record: &StoredLocation) -> Result<(), StorageError> {
        // An unreadable file is replaced rather than blocking every future save.
        let mut map = match self.read_map().await {
            Ok(map) => map,
            Err(StorageError::Corrupt(e)) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "replacing corrupt location file"
                );
                Map::new()
            }
            Err(e) => return Err(e),
        };
        map.insert(SESSION_KEY.to_owned(), serde_json::to_value(record)?);
        self.write_map(&map).await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut map = match self.read_map().await {
            Ok(map) => map,
            Err(StorageError::Corrupt(_)) => Map::new(),
            Err(e) => return Err(e),
        };
        map.remove(SESSION_KEY);
        if map.is_empty() {
            match tokio::fs::remove_file(&self.path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(self.io_error(e)),
            }
        } else {
            self.write_map(&map).await
        }
    }
}

/// Process-local storage holding the serialized record, for tests and one-shot runs.
#[derive(Default)]
pub struct MemoryPersistence {
    raw: Mutex<Option<String>>,
}

impl MemoryPersistence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an arbitrary stored value, valid or not.
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
        }
    }

    pub async fn raw(&self) -> Option<String> {
        self.raw.lock().await.clone()
    }
}

impl LocationPersistence for MemoryPersistence {
    async fn load(&self) -> Result<Option<StoredLocation>, StorageError> {
        match self.raw.lock().await.as_deref() {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, record: &StoredLocation) -> Result<(), StorageError> {
        let raw = serde_json::to_string(record)?;
        *self.raw.lock().await = Some(raw);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        *self.raw.lock().await = None;
        Ok(())
    }
}
