//! Data folder naming, discovery and bootstrap.
//!
//! A tagged directory tree has exactly one data folder at its root, holding a
//! single SQLite database file. Any directory inside the tree resolves to it
//! by walking up towards the filesystem root.

use crate::db::Database;
use crate::error::{ErrorKind, Result};
use std::path::{Path, PathBuf};
use tracing::instrument;

pub const DEFAULT_DATA_FOLDER: &str = ".tag";
pub const DEFAULT_DATABASE: &str = "tag.db";

/// Names of the data folder and the database file inside it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Layout {
    pub data_folder: String,
    pub database: String,
}
impl Default for Layout {
    fn default() -> Self {
        Self {
            data_folder: DEFAULT_DATA_FOLDER.to_string(),
            database: DEFAULT_DATABASE.to_string(),
        }
    }
}
impl Layout {
    pub fn new(data_folder: impl Into<String>, database: impl Into<String>) -> Self {
        Self { data_folder: data_folder.into(), database: database.into() }
    }

    /// Path of the database file inside a data folder.
    pub fn database_in(&self, data_folder: impl AsRef<Path>) -> PathBuf {
        data_folder.as_ref().join(&self.database)
    }

    /// Find the nearest data folder, starting at `dir` and walking up.
    ///
    /// Relative paths are made absolute against the process working
    /// directory first. Returns
    /// [`DataFolderNotFound`](ErrorKind::DataFolderNotFound) once the
    /// filesystem root has been checked.
    #[instrument(level = "debug", skip(self), fields(folder = %self.data_folder))]
    pub async fn find(&self, dir: impl AsRef<Path> + std::fmt::Debug) -> Result<PathBuf> {
        let start = std::path::absolute(dir.as_ref()).map_err(ErrorKind::Io)?;
        let mut current = Some(start.as_path());
        while let Some(ancestor) = current {
            let candidate = ancestor.join(&self.data_folder);
            if tokio::fs::try_exists(&candidate).await.map_err(ErrorKind::Io)? {
                tracing::debug!(data_folder = %candidate.display(), "Found data folder");
                return Ok(candidate);
            }
            current = ancestor.parent();
        }
        exn::bail!(ErrorKind::DataFolderNotFound(dir.as_ref().to_path_buf()))
    }

    /// Create the data folder and an empty database inside `dir`.
    ///
    /// Returns the path of the new data folder, or
    /// [`AlreadyInitialized`](ErrorKind::AlreadyInitialized) if one is
    /// already there. The database handle used to lay down the schema is
    /// closed before returning.
    #[instrument(level = "debug", skip(self), fields(folder = %self.data_folder))]
    pub async fn initialize(&self, dir: impl AsRef<Path> + std::fmt::Debug) -> Result<PathBuf> {
        let dir = dir.as_ref();
        let folder = dir.join(&self.data_folder);
        if tokio::fs::try_exists(&folder).await.map_err(ErrorKind::Io)? {
            exn::bail!(ErrorKind::AlreadyInitialized(dir.to_path_buf()));
        }
        let mut builder = tokio::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(0o700);
        builder.create(&folder).await.map_err(ErrorKind::Io)?;
        let db = Database::connect(self.database_in(&folder)).await?;
        db.close().await;
        tracing::info!(data_folder = %folder.display(), "Created data folder");
        Ok(folder)
    }
}
