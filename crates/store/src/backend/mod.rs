//! Record store trait and implementations.
//!
//! This module defines the `RecordStore` trait, the thin CRUD layer over the
//! three tables of a data folder. Everything above it (mappers, identity
//! maps, the unit of work) only ever talks to a [`StoreHandle`](crate::StoreHandle), so tests can
//! swap the SQLite implementation for an in-memory one.

#[cfg(feature = "mock")]
mod mock;
mod sqlite;

#[cfg(feature = "mock")]
pub use self::mock::{Call, MockStore};
pub use self::sqlite::SqliteStore;
use crate::error::Result;
use crate::models::{FileRow, LinkRow, TagRow};
use async_trait::async_trait;
use std::path::Path;

/// Unified interface for record stores.
///
/// Every operation names the directory it is working in (`root`); the
/// implementation resolves that to the data folder governing it. Several
/// independent data folders can be used side by side through the same
/// store.
///
/// Writes take effect immediately. There is no transaction at this level;
/// grouping writes is the unit of work's job.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use tag_store::{RecordStore, error::Result};
///
/// async fn tag_names_of(store: &dyn RecordStore, root: &Path, path: &str) -> Result<Vec<String>> {
///     let file_id = store.get_file_id_by_name(root, path).await?;
///     let mut names = Vec::new();
///     for link in store.read_links_by_file(root, file_id).await? {
///         names.push(store.read_tag(root, link.tag_id).await?.name);
///     }
///     Ok(names)
/// }
/// ```
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a file record and return its new id.
    ///
    /// Returns [`NotOnDisk`](crate::error::ErrorKind::NotOnDisk) if nothing
    /// exists at `name` on the filesystem.
    async fn add_file(&self, root: &Path, name: &str) -> Result<i64>;

    /// Delete a file record. Links pointing at it are left alone.
    async fn remove_file(&self, root: &Path, id: i64) -> Result<()>;

    /// Returns [`FileNotFound`](crate::error::ErrorKind::FileNotFound) if
    /// no record has this id.
    async fn read_file(&self, root: &Path, id: i64) -> Result<FileRow>;

    /// Overwrite the name of an existing file record.
    async fn save_file(&self, root: &Path, id: i64, name: &str) -> Result<()>;

    /// Returns [`FileNotFound`](crate::error::ErrorKind::FileNotFound) if
    /// no record has this name. With duplicates, the oldest record wins.
    async fn get_file_id_by_name(&self, root: &Path, name: &str) -> Result<i64>;

    /// Every file id, ascending (which is also insertion order).
    async fn get_all_file_ids(&self, root: &Path) -> Result<Vec<i64>>;

    /// Insert a tag record and return its new id.
    async fn add_tag(&self, root: &Path, name: &str) -> Result<i64>;

    /// Delete a tag record. Links pointing at it are left alone.
    async fn remove_tag(&self, root: &Path, id: i64) -> Result<()>;

    /// Returns [`TagNotFound`](crate::error::ErrorKind::TagNotFound) if no
    /// record has this id.
    async fn read_tag(&self, root: &Path, id: i64) -> Result<TagRow>;

    /// Overwrite the name of an existing tag record.
    async fn save_tag(&self, root: &Path, id: i64, name: &str) -> Result<()>;

    /// Returns [`TagNotFound`](crate::error::ErrorKind::TagNotFound) if no
    /// record has this name. With duplicates, the oldest record wins.
    async fn get_tag_id_by_name(&self, root: &Path, name: &str) -> Result<i64>;

    /// Link a file to a tag and return the id of the link record.
    async fn add_link(&self, root: &Path, file_id: i64, tag_id: i64) -> Result<i64>;

    /// Links of one file, in the order they were added.
    async fn read_links_by_file(&self, root: &Path, file_id: i64) -> Result<Vec<LinkRow>>;

    /// Links of one tag, in the order they were added.
    async fn read_links_by_tag(&self, root: &Path, tag_id: i64) -> Result<Vec<LinkRow>>;

    /// Delete every link between a file and a tag.
    async fn remove_link(&self, root: &Path, file_id: i64, tag_id: i64) -> Result<()>;
}
