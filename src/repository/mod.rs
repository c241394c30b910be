//! Persistence layer: snapshot load/save for the three stores

pub mod catalog;
pub mod loans;
pub mod users;

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tempfile::NamedTempFile;

use crate::{
    config::StorageConfig,
    error::{AppError, AppResult},
    models::{Loan, User, Work},
};

/// Load/save of whole-store snapshots.
///
/// Loading a store whose backing data does not exist yields an empty store.
/// Malformed records are rejected with [`AppError::CorruptState`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    async fn load_catalog(&self) -> AppResult<Vec<Work>>;
    async fn save_catalog(&self, works: &[Work]) -> AppResult<()>;
    async fn load_loans(&self) -> AppResult<Vec<Loan>>;
    async fn save_loans(&self, loans: &[Loan]) -> AppResult<()>;
    async fn load_users(&self) -> AppResult<Vec<User>>;
    async fn save_users(&self, users: &[User]) -> AppResult<()>;
}

/// Flat-file snapshots: CSV catalog, JSON loan ledger, line-based user directory
#[derive(Clone, Debug)]
pub struct FileRepository {
    catalog_path: PathBuf,
    loans_path: PathBuf,
    users_path: PathBuf,
}

impl FileRepository {
    pub fn new(
        catalog_path: impl Into<PathBuf>,
        loans_path: impl Into<PathBuf>,
        users_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            catalog_path: catalog_path.into(),
            loans_path: loans_path.into(),
            users_path: users_path.into(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.catalog_path, &config.loans_path, &config.users_path)
    }
}

#[async_trait]
impl PersistenceAdapter for FileRepository {
    async fn load_catalog(&self) -> AppResult<Vec<Work>> {
        match read_optional(&self.catalog_path).await? {
            Some(content) => catalog::parse(&content, &self.catalog_path.display().to_string()),
            None => {
                tracing::warn!("Catalog file {} not found, starting empty", self.catalog_path.display());
                Ok(Vec::new())
            }
        }
    }

    async fn save_catalog(&self, works: &[Work]) -> AppResult<()> {
        write_atomic(&self.catalog_path, &catalog::format(works)?).await
    }

    async fn load_loans(&self) -> AppResult<Vec<Loan>> {
        match read_optional(&self.loans_path).await? {
            Some(content) => loans::parse(&content, &self.loans_path.display().to_string()),
            None => Ok(Vec::new()),
        }
    }

    async fn save_loans(&self, loans: &[Loan]) -> AppResult<()> {
        write_atomic(&self.loans_path, &loans::format(loans)?).await
    }

    async fn load_users(&self) -> AppResult<Vec<User>> {
        match read_optional(&self.users_path).await? {
            Some(content) => users::parse(&content, &self.users_path.display().to_string()),
            None => {
                tracing::warn!("Users file {} not found, starting empty", self.users_path.display());
                Ok(Vec::new())
            }
        }
    }

    async fn save_users(&self, users: &[User]) -> AppResult<()> {
        write_atomic(&self.users_path, &users::format(users)).await
    }
}

/// Read a whole file, mapping "does not exist" to `None`
async fn read_optional(path: &Path) -> AppResult<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::Persistence(format!(
            "Failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Write to a uniquely named temp file beside the target, then rename over it.
///
/// Each call gets its own temp file, so concurrent saves of the same snapshot
/// never share one.
async fn write_atomic(path: &Path, content: &str) -> AppResult<()> {
    let path = path.to_path_buf();
    let content = content.to_owned();
    tokio::task::spawn_blocking(move || write_atomic_blocking(&path, content.as_bytes()))
        .await
        .map_err(|e| AppError::Internal(format!("Snapshot writer task failed: {}", e)))?
}

fn write_atomic_blocking(path: &Path, content: &[u8]) -> AppResult<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| {
        AppError::Persistence(format!("Failed to create {}: {}", parent.display(), e))
    })?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| {
        AppError::Persistence(format!("Failed to create temp file in {}: {}", parent.display(), e))
    })?;
    tmp.write_all(content)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| {
            AppError::Persistence(format!("Failed to write {}: {}", tmp.path().display(), e))
        })?;
    tmp.persist(path).map_err(|e| {
        AppError::Persistence(format!("Failed to replace {}: {}", path.display(), e.error))
    })?;

    Ok(())
}
