use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use super::domain::{ApplicationForm, ApplicationId, ApplicationRecord};

/// Document store holding application records.
///
/// Implementations assign the identifier and both timestamps on insert. There is
/// no update or delete path.
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    async fn insert(&self, form: ApplicationForm) -> Result<ApplicationRecord, RepositoryError>;
    async fn fetch(&self, id: &ApplicationId)
        -> Result<Option<ApplicationRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("stored record {id} is unreadable: {reason}")]
    Corrupt { id: ApplicationId, reason: String },
    #[error("repository did not answer within {0:?}")]
    Timeout(std::time::Duration),
}

fn stamp(id: ApplicationId, form: ApplicationForm) -> ApplicationRecord {
    let now = Utc::now();
    ApplicationRecord {
        id,
        created_at: now,
        updated_at: now,
        form,
    }
}

/// Process-local store used in development and tests.
#[derive(Default, Clone)]
pub struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl InMemoryApplicationRepository {
    pub fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ApplicationRepository for InMemoryApplicationRepository {
    async fn insert(&self, form: ApplicationForm) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))?;
        let mut id = ApplicationId::generate();
        while guard.contains_key(&id) {
            id = ApplicationId::generate();
        }
        let record = stamp(id, form);
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn fetch(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))?;
        Ok(guard.get(id).cloned())
    }
}

/// One JSON document per record under a directory.
///
/// Writes land in a temporary file first and are renamed into place, so a
/// reader never observes a partial record.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    root: PathBuf,
}

impl JsonFileRepository {
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|err| unavailable(&root, err))?;
        Ok(Self { root })
    }

    fn path_for(&self, id: &ApplicationId) -> Option<PathBuf> {
        let safe = !id.0.is_empty()
            && id
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');
        safe.then(|| self.root.join(format!("{}.json", id.0)))
    }
}

fn unavailable(path: &Path, err: std::io::Error) -> RepositoryError {
    RepositoryError::Unavailable(format!("{}: {err}", path.display()))
}

#[async_trait]
impl ApplicationRepository for JsonFileRepository {
    async fn insert(&self, form: ApplicationForm) -> Result<ApplicationRecord, RepositoryError> {
        let (record, path) = loop {
            let id = ApplicationId::generate();
            let Some(path) = self.path_for(&id) else {
                continue;
            };
            let taken = tokio::fs::try_exists(&path)
                .await
                .map_err(|err| unavailable(&path, err))?;
            if !taken {
                break (stamp(id, form), path);
            }
        };

        let body = serde_json::to_vec_pretty(&record).map_err(|err| RepositoryError::Corrupt {
            id: record.id.clone(),
            reason: err.to_string(),
        })?;
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, body)
            .await
            .map_err(|err| unavailable(&staging, err))?;
        if let Err(err) = tokio::fs::rename(&staging, &path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(unavailable(&path, err));
        }

        Ok(record)
    }

    async fn fetch(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let Some(path) = self.path_for(id) else {
            return Ok(None);
        };

        let body = match tokio::fs::read(&path).await {
            Ok(body) => body,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(unavailable(&path, err)),
        };

        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|err| RepositoryError::Corrupt {
                id: id.clone(),
                reason: err.to_string(),
            })
    }
}
