//! Process-wide database handles, one per data folder.

use crate::db::Database;
use crate::error::Result;
use crate::layout::Layout;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Handles {
    /// Directory asked about → the data folder that governs it.
    folders: HashMap<PathBuf, PathBuf>,
    /// Data folder → its open database.
    databases: HashMap<PathBuf, Arc<Database>>,
}

/// Hands out database handles keyed by the directory being worked in.
///
/// The first request for a directory finds its data folder (see
/// [`Layout::find`]) and opens the database; every later request for that
/// directory, or for any other directory governed by the same data folder,
/// gets the same handle back. Handles live as long as the registry does,
/// which for the command line is the whole process.
///
/// Nothing here coordinates with *other processes* using the same data
/// folder; SQLite's own locking and busy timeout are all there is.
#[derive(Debug)]
pub struct Registry {
    layout: Layout,
    handles: Mutex<Handles>,
}

impl Registry {
    pub fn new(layout: Layout) -> Self {
        Self { layout, handles: Mutex::new(Handles::default()) }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Get (opening on first use) the database governing `dir`.
    pub async fn database(&self, dir: &Path) -> Result<Arc<Database>> {
        // Held across the open so two callers can't race to open the same file.
        let mut handles = self.handles.lock().await;
        let folder = match handles.folders.get(dir) {
            Some(folder) => folder.clone(),
            None => {
                let folder = self.layout.find(dir).await?;
                handles.folders.insert(dir.to_path_buf(), folder.clone());
                folder
            },
        };
        if let Some(db) = handles.databases.get(&folder) {
            return Ok(Arc::clone(db));
        }
        tracing::debug!(data_folder = %folder.display(), "Opening database");
        let db = Arc::new(Database::connect(self.layout.database_in(&folder)).await?);
        handles.databases.insert(folder, Arc::clone(&db));
        Ok(db)
    }

    /// Close every open database and forget about it.
    pub async fn close(&self) {
        let mut handles = self.handles.lock().await;
        for (_, db) in handles.databases.drain() {
            db.close().await;
        }
        handles.folders.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_same_directory_gets_same_handle() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::new(Layout::default());
        registry.layout().initialize(dir.path()).await.unwrap();
        let first = registry.database(dir.path()).await.unwrap();
        let second = registry.database(dir.path()).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        registry.close().await;
    }

    #[tokio::test]
    async fn test_subdirectory_shares_handle_with_root() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        let registry = Registry::new(Layout::default());
        registry.layout().initialize(dir.path()).await.unwrap();
        let root = registry.database(dir.path()).await.unwrap();
        let nested = registry.database(&sub).await.unwrap();
        assert!(Arc::ptr_eq(&root, &nested));
        registry.close().await;
    }

    #[tokio::test]
    async fn test_separate_trees_get_separate_handles() {
        let one = TempDir::new().unwrap();
        let two = TempDir::new().unwrap();
        let registry = Registry::new(Layout::default());
        registry.layout().initialize(one.path()).await.unwrap();
        registry.layout().initialize(two.path()).await.unwrap();
        let first = registry.database(one.path()).await.unwrap();
        let second = registry.database(two.path()).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        registry.close().await;
    }

    #[tokio::test]
    async fn test_uninitialized_directory() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::new(Layout::new(".tag-registry-test-missing", "tag.db"));
        let err = registry.database(dir.path()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::DataFolderNotFound(_)));
    }
}
