use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::{fs, sync::Mutex};
use tracing::{error, info};

use models::{Barrel, BarrelRecord};

use super::BarrelPersistence;
use crate::errors::ServiceError;
use crate::registry::BarrelRegistry;

/// JSON file holding the whole registry as an array of [`BarrelRecord`]s.
///
/// A missing file means "no barrels yet". Saves go through a temporary
/// sibling file that is renamed over the target, so a failed save never
/// truncates the previous data. Writers are serialized on `write_lock`,
/// shared by clones, since they all go through the same temporary file.
#[derive(Debug, Clone)]
pub struct JsonBarrelStore {
    file_path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JsonBarrelStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { file_path: path.into(), write_lock: Arc::new(Mutex::new(())) }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .file_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "barrels.json".into());
        name.push(".tmp");
        self.file_path.with_file_name(name)
    }

    /// Read and decode the file; `Ok(None)` when it does not exist.
    pub async fn read_records(&self) -> Result<Option<Vec<BarrelRecord>>, ServiceError> {
        let bytes = match fs::read(&self.file_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ServiceError::io(&self.file_path, e)),
        };

        // a literal `null` document is treated like an empty list
        let records: Option<Vec<BarrelRecord>> = serde_json::from_slice(&bytes)
            .map_err(|source| ServiceError::Parse { path: self.file_path.clone(), source })?;
        Ok(Some(records.unwrap_or_default()))
    }

    /// Encode and write `records`, replacing the file.
    pub async fn write_records(&self, records: &[BarrelRecord]) -> Result<(), ServiceError> {
        let _guard = self.write_lock.lock().await;
        self.write_locked(records).await
    }

    async fn write_locked(&self, records: &[BarrelRecord]) -> Result<(), ServiceError> {
        if let Some(parent) = self.file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| ServiceError::io(parent, e))?;
        }

        let data = serde_json::to_vec_pretty(records)?;
        let tmp = self.temp_path();
        fs::write(&tmp, data).await.map_err(|e| ServiceError::io(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, &self.file_path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(ServiceError::io(&self.file_path, e));
        }
        Ok(())
    }

    async fn load(&self, registry: &BarrelRegistry) -> Result<usize, ServiceError> {
        let Some(records) = self.read_records().await? else {
            info!(path = %self.file_path.display(), "no barrel data file found, starting fresh");
            return Ok(0);
        };

        let barrels = records
            .into_iter()
            .map(Barrel::from_record)
            .collect::<Result<Vec<_>, _>>()?;
        let count = registry.replace_all(barrels);
        info!(count, path = %self.file_path.display(), "loaded barrels from storage");
        Ok(count)
    }

    async fn save(&self, registry: &BarrelRegistry) -> Result<usize, ServiceError> {
        // snapshot and write under one lock so the file never moves back to an older snapshot
        let _guard = self.write_lock.lock().await;
        let records = registry.records();
        self.write_locked(&records).await?;
        info!(count = records.len(), path = %self.file_path.display(), "saved barrels to storage");
        Ok(records.len())
    }
}

#[async_trait]
impl BarrelPersistence for JsonBarrelStore {
    async fn load_into(&self, registry: &BarrelRegistry) -> Result<usize, ServiceError> {
        self.load(registry).await.inspect_err(|e| {
            error!(error = %e, path = %self.file_path.display(), "failed to load barrel data");
        })
    }

    async fn save_from(&self, registry: &BarrelRegistry) -> Result<usize, ServiceError> {
        self.save(registry).await.inspect_err(|e| {
            error!(error = %e, path = %self.file_path.display(), "failed to save barrel data");
        })
    }
}
