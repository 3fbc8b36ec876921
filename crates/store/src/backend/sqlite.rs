//! SQLite record store.
//!
//! Statements live in `queries/*.sql` next to the crate and are bound
//! positionally, one statement per operation.

use crate::error::{ErrorKind, Key, Result};
use crate::models::{FileRow, LinkRow, TagRow};
use crate::registry::Registry;
use crate::{Database, RecordStore};
use async_trait::async_trait;
use exn::ResultExt;
use std::path::Path;
use std::sync::Arc;
use tracing::instrument;

/// Record store backed by the SQLite database in each directory's data folder.
///
/// Holds no connection of its own: every call asks the [`Registry`] for the
/// database governing `root`, which opens it on first use.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    registry: Arc<Registry>,
}
impl From<Arc<Registry>> for SqliteStore {
    fn from(registry: Arc<Registry>) -> Self {
        Self { registry }
    }
}
impl SqliteStore {
    pub fn new(registry: Registry) -> Self {
        Self { registry: Arc::new(registry) }
    }

    async fn db(&self, root: &Path) -> Result<Arc<Database>> {
        self.registry.database(root).await
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    #[instrument(level = "debug", skip(self))]
    async fn add_file(&self, root: &Path, name: &str) -> Result<i64> {
        if !tokio::fs::try_exists(name).await.map_err(ErrorKind::Io)? {
            exn::bail!(ErrorKind::NotOnDisk(name.into()));
        }
        let db = self.db(root).await?;
        let result = sqlx::query(include_str!("../../queries/add_file.sql"))
            .bind(name)
            .execute(db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.last_insert_rowid())
    }

    #[instrument(level = "debug", skip(self))]
    async fn remove_file(&self, root: &Path, id: i64) -> Result<()> {
        let db = self.db(root).await?;
        sqlx::query(include_str!("../../queries/remove_file.sql"))
            .bind(id)
            .execute(db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    #[instrument(level = "trace", skip(self))]
    async fn read_file(&self, root: &Path, id: i64) -> Result<FileRow> {
        let db = self.db(root).await?;
        let row: Option<FileRow> = sqlx::query_as(include_str!("../../queries/read_file.sql"))
            .bind(id)
            .fetch_optional(db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.ok_or_else(|| ErrorKind::FileNotFound(Key::Id(id)).into())
    }

    #[instrument(level = "debug", skip(self))]
    async fn save_file(&self, root: &Path, id: i64, name: &str) -> Result<()> {
        let db = self.db(root).await?;
        sqlx::query(include_str!("../../queries/save_file.sql"))
            .bind(name)
            .bind(id)
            .execute(db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    #[instrument(level = "trace", skip(self))]
    async fn get_file_id_by_name(&self, root: &Path, name: &str) -> Result<i64> {
        let db = self.db(root).await?;
        let id: Option<i64> = sqlx::query_scalar(include_str!("../../queries/get_file_id_by_name.sql"))
            .bind(name)
            .fetch_optional(db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        id.ok_or_else(|| ErrorKind::FileNotFound(Key::Name(name.to_string())).into())
    }

    #[instrument(level = "trace", skip(self))]
    async fn get_all_file_ids(&self, root: &Path) -> Result<Vec<i64>> {
        let db = self.db(root).await?;
        let ids: Vec<i64> = sqlx::query_scalar(include_str!("../../queries/list_file_ids.sql"))
            .fetch_all(db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(ids)
    }

    #[instrument(level = "debug", skip(self))]
    async fn add_tag(&self, root: &Path, name: &str) -> Result<i64> {
        let db = self.db(root).await?;
        let result = sqlx::query(include_str!("../../queries/add_tag.sql"))
            .bind(name)
            .execute(db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.last_insert_rowid())
    }

    #[instrument(level = "debug", skip(self))]
    async fn remove_tag(&self, root: &Path, id: i64) -> Result<()> {
        let db = self.db(root).await?;
        sqlx::query(include_str!("../../queries/remove_tag.sql"))
            .bind(id)
            .execute(db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    #[instrument(level = "trace", skip(self))]
    async fn read_tag(&self, root: &Path, id: i64) -> Result<TagRow> {
        let db = self.db(root).await?;
        let row: Option<TagRow> = sqlx::query_as(include_str!("../../queries/read_tag.sql"))
            .bind(id)
            .fetch_optional(db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.ok_or_else(|| ErrorKind::TagNotFound(Key::Id(id)).into())
    }

    #[instrument(level = "debug", skip(self))]
    async fn save_tag(&self, root: &Path, id: i64, name: &str) -> Result<()> {
        let db = self.db(root).await?;
        sqlx::query(include_str!("../../queries/save_tag.sql"))
            .bind(name)
            .bind(id)
            .execute(db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    #[instrument(level = "trace", skip(self))]
    async fn get_tag_id_by_name(&self, root: &Path, name: &str) -> Result<i64> {
        let db = self.db(root).await?;
        let id: Option<i64> = sqlx::query_scalar(include_str!("../../queries/get_tag_id_by_name.sql"))
            .bind(name)
            .fetch_optional(db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        id.ok_or_else(|| ErrorKind::TagNotFound(Key::Name(name.to_string())).into())
    }

    #[instrument(level = "debug", skip(self))]
    async fn add_link(&self, root: &Path, file_id: i64, tag_id: i64) -> Result<i64> {
        let db = self.db(root).await?;
        let result = sqlx::query(include_str!("../../queries/add_link.sql"))
            .bind(file_id)
            .bind(tag_id)
            .execute(db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.last_insert_rowid())
    }

    #[instrument(level = "trace", skip(self))]
    async fn read_links_by_file(&self, root: &Path, file_id: i64) -> Result<Vec<LinkRow>> {
        let db = self.db(root).await?;
        let rows: Vec<LinkRow> = sqlx::query_as(include_str!("../../queries/read_links_by_file.sql"))
            .bind(file_id)
            .fetch_all(db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(rows)
    }

    #[instrument(level = "trace", skip(self))]
    async fn read_links_by_tag(&self, root: &Path, tag_id: i64) -> Result<Vec<LinkRow>> {
        let db = self.db(root).await?;
        let rows: Vec<LinkRow> = sqlx::query_as(include_str!("../../queries/read_links_by_tag.sql"))
            .bind(tag_id)
            .fetch_all(db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(rows)
    }

    #[instrument(level = "debug", skip(self))]
    async fn remove_link(&self, root: &Path, file_id: i64, tag_id: i64) -> Result<()> {
        let db = self.db(root).await?;
        sqlx::query(include_str!("../../queries/remove_link.sql"))
            .bind(file_id)
            .bind(tag_id)
            .execute(db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}
