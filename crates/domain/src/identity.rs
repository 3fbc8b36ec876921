//! Identity maps: one in-memory instance per stored record.
//!
//! Within a unit of work every lookup of the same record, by id or by name,
//! hands back the same `Rc`. Mutations made through one handle are therefore
//! seen through every other, and the unit of work only has to walk the
//! cache to find everything that needs saving.

use crate::mapper::{FileMapper, TagMapper};
use crate::{FileHandle, TagHandle};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::rc::Rc;
use tag_store::error::Result;

pub struct TagIdentityMap {
    mapper: TagMapper,
    tags: BTreeMap<i64, TagHandle>,
}

impl TagIdentityMap {
    pub fn new(mapper: TagMapper) -> Self {
        Self { mapper, tags: BTreeMap::new() }
    }

    pub fn mapper(&self) -> &TagMapper {
        &self.mapper
    }

    /// Cached tags, in id order.
    pub fn cached(&self) -> impl Iterator<Item = &TagHandle> {
        self.tags.values()
    }

    /// The cached instance, loading it on first use. Failed loads are not cached.
    pub async fn get_by_id(&mut self, id: i64) -> Result<TagHandle> {
        if let Some(tag) = self.tags.get(&id) {
            return Ok(Rc::clone(tag));
        }
        let tag = self.mapper.load_by_id(id).await?.into_handle();
        self.tags.insert(id, Rc::clone(&tag));
        Ok(tag)
    }

    /// Look the tag up by its current in-memory name first, then in the store.
    ///
    /// If the store answers with an id that is already cached (say the cached
    /// tag was renamed since), the cached instance wins.
    pub async fn get_by_name(&mut self, name: &str) -> Result<TagHandle> {
        let cached = self.tags.iter().find(|(_, tag)| tag.borrow().name() == name).map(|(id, _)| *id);
        if let Some(id) = cached {
            return self.get_by_id(id).await;
        }
        let tag = self.mapper.load_by_name(name).await?;
        let handle = self.tags.entry(tag.id()).or_insert_with(|| tag.into_handle());
        Ok(Rc::clone(handle))
    }

    /// Start tracking a tag that was just inserted into the store.
    ///
    /// Returns `false`, leaving the cache alone, for a tag without an id or
    /// an id that already has an instance.
    pub fn adopt(&mut self, tag: &TagHandle) -> bool {
        adopt(&mut self.tags, tag.borrow().id(), tag)
    }
}

pub struct FileIdentityMap {
    mapper: FileMapper,
    files: BTreeMap<i64, FileHandle>,
}

impl FileIdentityMap {
    pub fn new(mapper: FileMapper) -> Self {
        Self { mapper, files: BTreeMap::new() }
    }

    pub fn mapper(&self) -> &FileMapper {
        &self.mapper
    }

    /// Cached files, in id order.
    pub fn cached(&self) -> impl Iterator<Item = &FileHandle> {
        self.files.values()
    }

    /// The cached instance, loading it on first use. Failed loads are not cached.
    ///
    /// The file's tags are resolved through `tags`, so they are the same
    /// instances any other lookup in the unit of work sees.
    pub async fn get_by_id(&mut self, id: i64, tags: &mut TagIdentityMap) -> Result<FileHandle> {
        if let Some(file) = self.files.get(&id) {
            return Ok(Rc::clone(file));
        }
        let file = self.mapper.load_by_id(id, tags).await?.into_handle();
        self.files.insert(id, Rc::clone(&file));
        Ok(file)
    }

    /// Same lookup order as [`TagIdentityMap::get_by_name`].
    pub async fn get_by_name(&mut self, name: &str, tags: &mut TagIdentityMap) -> Result<FileHandle> {
        let cached = self.files.iter().find(|(_, file)| file.borrow().name() == name).map(|(id, _)| *id);
        if let Some(id) = cached {
            return self.get_by_id(id, tags).await;
        }
        let file = self.mapper.load_by_name(name, tags).await?;
        let handle = self.files.entry(file.id()).or_insert_with(|| file.into_handle());
        Ok(Rc::clone(handle))
    }

    /// Every stored file in id order, reusing cached instances.
    pub async fn get_all(&mut self, tags: &mut TagIdentityMap) -> Result<Vec<FileHandle>> {
        let ids = self.mapper.store().get_all_file_ids(self.mapper.root()).await?;
        let mut files = Vec::with_capacity(ids.len());
        for id in ids {
            files.push(self.get_by_id(id, tags).await?);
        }
        Ok(files)
    }

    /// Same as [`TagIdentityMap::adopt`], for a freshly inserted file.
    pub fn adopt(&mut self, file: &FileHandle) -> bool {
        adopt(&mut self.files, file.borrow().id(), file)
    }
}

fn adopt<T>(cache: &mut BTreeMap<i64, Rc<T>>, id: i64, handle: &Rc<T>) -> bool {
    if id == 0 {
        return false;
    }
    match cache.entry(id) {
        Entry::Vacant(slot) => {
            slot.insert(Rc::clone(handle));
            true
        },
        Entry::Occupied(_) => false,
    }
}
