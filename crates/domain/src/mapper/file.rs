use crate::identity::TagIdentityMap;
use crate::mapper::TagMapper;
use crate::{EntityState, File, FileHandle};
use std::path::{Path, PathBuf};
use tag_store::StoreHandle;
use tag_store::error::Result;
use tracing::instrument;

/// Moves files, and their links to tags, between memory and the store.
#[derive(Clone)]
pub struct FileMapper {
    store: StoreHandle,
    root: PathBuf,
    tags: TagMapper,
}

impl FileMapper {
    pub fn new(store: StoreHandle, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let tags = TagMapper::new(store.clone(), root.clone());
        Self { store, root, tags }
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read a file and its links, resolving every tag through `tags`.
    ///
    /// Links to a tag record that no longer exists are skipped.
    #[instrument(level = "trace", skip(self, tags))]
    pub async fn load_by_id(&self, id: i64, tags: &mut TagIdentityMap) -> Result<File> {
        let row = self.store.read_file(&self.root, id).await?;
        let links = self.store.read_links_by_file(&self.root, id).await?;
        let mut handles = Vec::with_capacity(links.len());
        for link in links {
            match tags.get_by_id(link.tag_id).await {
                Ok(tag) => handles.push(tag),
                Err(err) if err.is_not_found() => {
                    tracing::warn!(file_id = id, tag_id = link.tag_id, "Skipping link to missing tag");
                },
                Err(err) => return Err(err),
            }
        }
        Ok(File::loaded(row.id, row.file_name, handles))
    }

    #[instrument(level = "trace", skip(self, tags))]
    pub async fn load_by_name(&self, name: &str, tags: &mut TagIdentityMap) -> Result<File> {
        let id = self.store.get_file_id_by_name(&self.root, name).await?;
        self.load_by_id(id, tags).await
    }

    /// Write the file according to its state and return its identity.
    ///
    /// - New: insert the record (assigning the identity), then save and link
    ///   every tag.
    /// - Dirty: update the record, save every tag, then add the links gained
    ///   and remove the links lost since the baseline.
    /// - Clean: nothing is written.
    ///
    /// On success the file is clean and its baseline is its current tags.
    pub async fn save(&self, file: &FileHandle) -> Result<i64> {
        let (id, name, state) = {
            let file = file.borrow();
            (file.id(), file.name().to_string(), file.state())
        };
        let id = match state {
            EntityState::Clean => return Ok(id),
            EntityState::Dirty => {
                self.save_existing(file, id, &name).await?;
                id
            },
            EntityState::New => self.save_new(file, &name).await?,
        };
        tracing::debug!(file_id = id, file = %name, %state, "Saved file");
        file.borrow_mut().mark_saved(id);
        Ok(id)
    }

    async fn save_existing(&self, file: &FileHandle, id: i64, name: &str) -> Result<()> {
        self.store.save_file(&self.root, id, name).await?;
        let (current, added, removed) = {
            let file = file.borrow();
            (file.tags().to_vec(), file.added_tags(), file.removed_tags())
        };
        for tag in &current {
            self.tags.save(tag).await?;
        }
        for tag in added {
            let tag_id = tag.borrow().id();
            self.store.add_link(&self.root, id, tag_id).await?;
        }
        for tag in removed {
            let tag_id = tag.borrow().id();
            self.store.remove_link(&self.root, id, tag_id).await?;
        }
        Ok(())
    }

    async fn save_new(&self, file: &FileHandle, name: &str) -> Result<i64> {
        let id = self.store.add_file(&self.root, name).await?;
        let current = {
            let mut file = file.borrow_mut();
            file.assign_id(id);
            file.tags().to_vec()
        };
        for tag in &current {
            let tag_id = self.tags.save(tag).await?;
            self.store.add_link(&self.root, id, tag_id).await?;
        }
        Ok(id)
    }

    /// Delete the file record. Its links stay behind.
    #[instrument(level = "debug", skip(self))]
    pub async fn remove(&self, id: i64) -> Result<()> {
        self.store.remove_file(&self.root, id).await
    }
}
