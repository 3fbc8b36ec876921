use crate::{EntityState, Tag, TagHandle};
use std::path::{Path, PathBuf};
use tag_store::StoreHandle;
use tag_store::error::Result;
use tracing::instrument;

/// Moves tags between memory and the `tags` table of one tree.
#[derive(Clone)]
pub struct TagMapper {
    store: StoreHandle,
    root: PathBuf,
}

impl TagMapper {
    pub fn new(store: StoreHandle, root: impl Into<PathBuf>) -> Self {
        Self { store, root: root.into() }
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn load_by_id(&self, id: i64) -> Result<Tag> {
        let row = self.store.read_tag(&self.root, id).await?;
        Ok(Tag::from(row))
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn load_by_name(&self, name: &str) -> Result<Tag> {
        let id = self.store.get_tag_id_by_name(&self.root, name).await?;
        self.load_by_id(id).await
    }

    /// Write the tag according to its state and return its identity.
    ///
    /// A new tag is inserted and receives its identity here; a dirty one is
    /// updated; a clean one is left alone. Either way it is clean afterwards.
    pub async fn save(&self, tag: &TagHandle) -> Result<i64> {
        let (id, name, state) = {
            let tag = tag.borrow();
            (tag.id(), tag.name().to_string(), tag.state())
        };
        let id = match state {
            EntityState::Clean => return Ok(id),
            EntityState::Dirty => {
                self.store.save_tag(&self.root, id, &name).await?;
                id
            },
            EntityState::New => self.store.add_tag(&self.root, &name).await?,
        };
        tracing::debug!(tag_id = id, tag = %name, %state, "Saved tag");
        tag.borrow_mut().mark_saved(id);
        Ok(id)
    }

    /// Delete the tag record. Links to it stay behind.
    #[instrument(level = "debug", skip(self))]
    pub async fn remove(&self, id: i64) -> Result<()> {
        self.store.remove_tag(&self.root, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tag_store::error::{ErrorKind, Key};
    use tag_store::{Call, MockStore, RecordStore};

    const ROOT: &str = "/tree";

    fn mapper() -> (Arc<MockStore>, TagMapper) {
        let store = Arc::new(MockStore::default());
        let mapper = TagMapper::new(Arc::clone(&store) as StoreHandle, ROOT);
        (store, mapper)
    }

    #[tokio::test]
    async fn test_new_tag_is_inserted_once() {
        let (store, mapper) = mapper();
        let tag = Tag::new("work").into_handle();
        assert_eq!(mapper.save(&tag).await.unwrap(), 1);
        assert_eq!(tag.borrow().id(), 1);
        assert_eq!(tag.borrow().state(), EntityState::Clean);
        assert_eq!(mapper.save(&tag).await.unwrap(), 1);
        assert_eq!(store.journal().await, vec![Call::AddTag("work".to_string())]);
    }

    #[tokio::test]
    async fn test_clean_tag_writes_nothing() {
        let (store, mapper) = mapper();
        store.add_tag(Path::new(ROOT), "work").await.unwrap();
        store.clear_journal().await;
        let tag = mapper.load_by_name("work").await.unwrap().into_handle();
        assert_eq!(mapper.save(&tag).await.unwrap(), 1);
        assert_eq!(store.writes().await, 0);
    }

    #[tokio::test]
    async fn test_dirty_tag_is_updated() {
        let (store, mapper) = mapper();
        store.add_tag(Path::new(ROOT), "work").await.unwrap();
        store.clear_journal().await;
        let tag = mapper.load_by_id(1).await.unwrap().into_handle();
        tag.borrow_mut().set_name("office");
        mapper.save(&tag).await.unwrap();
        assert_eq!(store.journal().await, vec![Call::SaveTag(1, "office".to_string())]);
        assert_eq!(mapper.load_by_id(1).await.unwrap().name(), "office");
    }

    #[tokio::test]
    async fn test_missing_tag() {
        let (_store, mapper) = mapper();
        let err = mapper.load_by_name("nope").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::TagNotFound(Key::Name(_))));
    }

    #[tokio::test]
    async fn test_remove() {
        let (store, mapper) = mapper();
        store.add_tag(Path::new(ROOT), "work").await.unwrap();
        mapper.remove(1).await.unwrap();
        assert!(mapper.load_by_id(1).await.is_err());
    }
}
